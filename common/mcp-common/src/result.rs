//! Result helpers for MCP tool responses
//!
//! Provides convenient functions for creating `CallToolResult` responses,
//! reducing boilerplate in tool implementations.
//!
//! A *failed* result is still a normal response: the call succeeded at the
//! protocol level but the tool reports `is_error = true` with an explanation.

use rmcp::model::{CallToolResult, Content};

/// Create a successful plain text response
///
/// # Example
///
/// ```rust,ignore
/// use mcp_common::text_success;
///
/// fn my_tool(&self) -> CallToolResult {
///     text_success("Operation completed successfully")
/// }
/// ```
pub fn text_success(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Create a successful response with multiple content items
///
/// ```rust,ignore
/// use mcp_common::multi_success;
/// use rmcp::model::Content;
///
/// fn my_tool(&self) -> CallToolResult {
///     multi_success(vec![
///         Content::text("First part"),
///         Content::text("Second part"),
///     ])
/// }
/// ```
pub fn multi_success(contents: Vec<Content>) -> CallToolResult {
    CallToolResult::success(contents)
}

/// Create a failed result carrying a single text explanation
pub fn text_failure(text: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(text.into())])
}
