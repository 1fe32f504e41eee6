//! Type definitions for secure-fs-mcp

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Configuration Types
// ============================================================================

/// Largest file whose content is ever returned inline (5 MiB)
pub const INLINE_LIMIT: u64 = 5 * 1024 * 1024;

/// Largest binary file returned inline as base64 (1 MiB)
pub const BASE64_LIMIT: u64 = 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directories the server may touch
    #[serde(default)]
    pub allowed_directories: Vec<String>,
    #[serde(default)]
    pub limits: Limits,
}

/// Content delivery thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Files above this size are only ever returned as a reference
    #[serde(default = "default_inline_limit")]
    pub inline_limit: u64,
    /// Binary files up to this size are returned as base64
    #[serde(default = "default_base64_limit")]
    pub base64_limit: u64,
}

fn default_inline_limit() -> u64 {
    INLINE_LIMIT
}

fn default_base64_limit() -> u64 {
    BASE64_LIMIT
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            inline_limit: default_inline_limit(),
            base64_limit: default_base64_limit(),
        }
    }
}

// ============================================================================
// Filesystem Types
// ============================================================================

/// Metadata snapshot of a resolved path, re-read on every query
#[derive(Debug, Clone, Serialize)]
pub struct FileStat {
    pub size: u64,
    /// Falls back to `modified` where the platform has no birth time
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// Falls back to `modified` where the platform has no access time
    pub accessed: DateTime<Utc>,
    pub is_directory: bool,
    pub is_file: bool,
    /// Octal permission bits, e.g. `644`
    pub permissions: String,
}

/// Why a file is delivered as a reference instead of content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceReason {
    /// Above the inline ceiling, whatever the type
    ExceedsInlineLimit,
    /// Binary and above the base64 ceiling
    BinaryExceedsBase64Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    InlineText,
    InlineBase64,
    ReferenceOnly(ReferenceReason),
}

/// How a file's content is represented to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDecision {
    pub mime_type: String,
    pub is_text: bool,
    pub mode: DeliveryMode,
}

/// A search hit collected during one walk
#[derive(Debug, Clone)]
pub struct SearchMatch {
    /// Path as encountered by the walk
    pub path: PathBuf,
    /// Sandbox-resolved path
    pub resolved: PathBuf,
    /// `None` when the entry vanished or could not be stat'ed after matching
    pub stat: Option<FileStat>,
}

/// One immediate child of a listed directory
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    /// File size; `None` for directories or when metadata is unavailable
    pub size: Option<u64>,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum FsError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("access denied - path outside allowed directories: {0}")]
    OutsideAllowed(String),

    #[error("access denied - parent directory outside allowed directories")]
    ParentOutsideAllowed,

    #[error("access denied - symlink target outside allowed directories")]
    SymlinkEscape,

    #[error("parent directory does not exist: {0}")]
    ParentMissing(String),

    #[error("Path is not a directory")]
    NotADirectory,

    #[error("Search path must be a directory")]
    SearchRootNotDirectory,

    #[error("Cannot write to a directory")]
    IsADirectory,

    #[error("Path exists but is not a directory: {0}")]
    ExistsNotDirectory(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// True for every sandbox rejection, whichever phase produced it
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            FsError::OutsideAllowed(_)
                | FsError::ParentOutsideAllowed
                | FsError::SymlinkEscape
                | FsError::ParentMissing(_)
        )
    }
}

pub type FsResult<T> = Result<T, FsError>;

/// Failure of a move, tagged with the step that failed
#[derive(Error, Debug)]
pub enum MoveError {
    #[error("Error with source path: {0}")]
    Source(FsError),

    #[error("Error: Source does not exist: {0}")]
    SourceMissing(String),

    #[error("Error with destination path: {0}")]
    Destination(FsError),

    #[error("Error creating destination directory: {0}")]
    CreateParent(std::io::Error),

    #[error("Error moving file: {0}")]
    Rename(std::io::Error),
}
