//! Error handling utilities for MCP servers
//!
//! Protocol-level failures (malformed requests, unsupported resources) are
//! reported as [`McpError`]. Operational failures belong in a failed
//! `CallToolResult` instead; see [`crate::result::text_failure`].

use rmcp::ErrorData as McpError;

/// Create an internal error with a message
///
/// # Example
///
/// ```rust,ignore
/// use mcp_common::internal_error;
///
/// fn my_tool(&self) -> Result<CallToolResult, McpError> {
///     if bad_condition {
///         return Err(internal_error("Something went wrong"));
///     }
///     // ...
/// }
/// ```
pub fn internal_error(message: impl Into<String>) -> McpError {
    McpError::internal_error(message.into(), None)
}

/// Create an invalid params error with a message
///
/// Use this when the request itself is malformed.
pub fn invalid_params(message: impl Into<String>) -> McpError {
    McpError::invalid_params(message.into(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error() {
        let err = internal_error("test");
        assert!(err.message.contains("test"));
    }

    #[test]
    fn test_invalid_params() {
        let err = invalid_params("bad param");
        assert!(err.message.contains("bad param"));
    }
}
