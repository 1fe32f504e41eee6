//! Secure Filesystem MCP Library
//!
//! Exposes a restricted view of the local filesystem over MCP. Every path a
//! caller supplies is resolved through the [`sandbox::Sandbox`], which checks
//! it against the allowed roots both before and after symlink resolution.
//! File content is delivered as inline text, inline base64 or a `file://`
//! reference depending on size and detected type (see [`classify`]).
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use secure_fs_mcp::{Config, FilesystemMcpServer};
//!
//! let config = Config {
//!     allowed_directories: vec!["/data".into()],
//!     ..Default::default()
//! };
//! let server = FilesystemMcpServer::with_config(config)?;
//! mcp_common::serve_stdio(server, "secure_fs_mcp").await?;
//! ```

pub mod classify;
pub mod config;
pub mod handlers;
pub mod ops;
pub mod params;
pub mod registry;
pub mod sandbox;
pub mod server;
pub mod types;

// Re-export main server type
pub use server::FilesystemMcpServer;

pub use types::{Config, FsError, FsResult, Limits, BASE64_LIMIT, INLINE_LIMIT};

// Re-export parameter types for direct API usage
pub use params::*;
