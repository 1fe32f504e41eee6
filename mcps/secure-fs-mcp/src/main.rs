//! secure-fs-mcp - filesystem MCP server confined to allowed directories
//!
//! ```text
//! secure-fs-mcp [--config <FILE>] <ALLOWED_DIR>...
//! ```

use std::path::PathBuf;

use clap::Parser;
use secure_fs_mcp::{Config, FilesystemMcpServer};

#[derive(Parser)]
#[command(name = "secure-fs-mcp")]
#[command(about = "Filesystem MCP server confined to a set of allowed directories")]
#[command(version)]
struct Cli {
    /// TOML config file (overrides discovery, including SECURE_FS_CONFIG)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directories the server may access
    #[arg(value_name = "ALLOWED_DIR")]
    allowed_directories: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    mcp_common::init_tracing("secure_fs_mcp")?;

    let config = Config::load(cli.config.as_deref(), &cli.allowed_directories)?;
    tracing::info!(
        inline_limit = config.limits.inline_limit,
        base64_limit = config.limits.base64_limit,
        "Content limits"
    );

    let server = FilesystemMcpServer::with_config(config)?;
    mcp_common::serve_stdio(server, "secure_fs_mcp").await
}
