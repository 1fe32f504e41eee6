//! MCP Common - Shared utilities for MCP servers
//!
//! This crate provides common functionality used across the MCP servers:
//!
//! - **Initialization**: tracing setup and [`serve_stdio`] for standardized server startup
//! - **Results**: Helper functions for creating `CallToolResult` responses
//! - **Errors**: Constructors for MCP-compatible protocol errors
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_common::{serve_stdio, text_success, text_failure};
//!
//! // In main.rs
//! serve_stdio(MyServer::new(config)?, "my_mcp").await?;
//!
//! // In tool implementations
//! fn my_tool(&self) -> CallToolResult {
//!     match do_work() {
//!         Ok(msg) => text_success(msg),
//!         Err(e) => text_failure(format!("Error: {}", e)),
//!     }
//! }
//! ```

pub mod error;
pub mod init;
pub mod result;

// Re-export commonly used items at crate root
pub use error::{internal_error, invalid_params};
pub use init::{init_tracing, serve_stdio};
pub use result::{multi_success, text_failure, text_success};

// Re-export rmcp types that are commonly needed
pub use rmcp::{
    model::{CallToolResult, Content},
    ErrorData as McpError,
};
