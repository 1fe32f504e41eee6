//! MCP Server implementation for sandboxed filesystem operations
//!
//! This module defines the main MCP server that exposes filesystem operations as tools
//! and `file://` resources. Handler implementations are in the handlers module.

use mcp_common::{CallToolResult, McpError};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, Implementation, ListResourcesResult, PaginatedRequestParam, RawResource,
        ReadResourceRequestParam, ReadResourceResult, Resource, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, RoleServer,
};

use crate::handlers;
use crate::params::*;
use crate::registry::AllowedRoots;
use crate::sandbox::Sandbox;
use crate::types::{Config, FsError, FsResult};

/// Name advertised during initialization
pub const SERVER_NAME: &str = "secure-filesystem-server";

/// The single advertised resource; every path under the allowed roots is readable through it
pub fn filesystem_resource() -> Resource {
    RawResource {
        description: Some(
            "Access to files and directories on the local file system".to_string(),
        ),
        ..RawResource::new("file://", "File System")
    }
    .no_annotation()
}

/// The secure filesystem MCP server
#[derive(Clone)]
pub struct FilesystemMcpServer {
    sandbox: Sandbox,
    config: Config,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Tool Router - Each tool delegates to its handler
// ============================================================================

#[tool_router]
impl FilesystemMcpServer {
    /// Create a server confined to `config.allowed_directories`
    pub fn with_config(config: Config) -> FsResult<Self> {
        if config.allowed_directories.is_empty() {
            return Err(FsError::ConfigError(
                "at least one allowed directory is required".to_string(),
            ));
        }

        let roots = AllowedRoots::initialize(&config.allowed_directories)?;

        Ok(Self {
            sandbox: Sandbox::new(roots),
            config,
            tool_router: Self::tool_router(),
        })
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[tool(description = "Read the complete contents of a file from the file system.")]
    async fn read_file(
        &self,
        Parameters(params): Parameters<ReadFileParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::read_file(&self.sandbox, &self.config.limits, params).await
    }

    #[tool(
        description = "Read the contents of multiple files in a single call. Each file is read independently; a failure for one path does not affect the others."
    )]
    async fn read_multiple_files(
        &self,
        Parameters(params): Parameters<ReadMultipleFilesParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::read_multiple_files(&self.sandbox, &self.config.limits, params, &context.ct)
            .await
    }

    #[tool(description = "Create a new file or overwrite an existing file with new content.")]
    async fn write_file(
        &self,
        Parameters(params): Parameters<WriteFileParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::write_file(&self.sandbox, params).await
    }

    #[tool(
        description = "Get a detailed listing of all files and directories in a specified path."
    )]
    async fn list_directory(
        &self,
        Parameters(params): Parameters<ListDirectoryParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::list_directory(&self.sandbox, params).await
    }

    #[tool(description = "Create a new directory or ensure a directory exists.")]
    async fn create_directory(
        &self,
        Parameters(params): Parameters<CreateDirectoryParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::create_directory(&self.sandbox, params).await
    }

    #[tool(description = "Move or rename files and directories.")]
    async fn move_file(
        &self,
        Parameters(params): Parameters<MoveFileParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::move_file(&self.sandbox, params).await
    }

    #[tool(description = "Recursively search for files and directories matching a pattern.")]
    async fn search_files(
        &self,
        Parameters(params): Parameters<SearchFilesParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        handlers::search_files(&self.sandbox, params, context.ct.clone()).await
    }

    #[tool(description = "Retrieve detailed metadata about a file or directory.")]
    async fn get_file_info(
        &self,
        Parameters(params): Parameters<GetFileInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_file_info(&self.sandbox, params).await
    }

    #[tool(description = "Returns the list of directories that this server is allowed to access.")]
    async fn list_allowed_directories(&self) -> Result<CallToolResult, McpError> {
        handlers::list_allowed_directories(&self.sandbox).await
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for FilesystemMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Filesystem access confined to the configured allowed directories. \
                 Use list_allowed_directories to see what paths are accessible. \
                 Files and directories are also readable as file:// resources."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(vec![filesystem_resource()]))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let contents =
            handlers::read_resource(&self.sandbox, &self.config.limits, &request.uri).await?;
        Ok(ReadResourceResult { contents })
    }
}
