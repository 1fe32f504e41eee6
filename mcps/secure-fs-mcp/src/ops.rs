//! Sandboxed filesystem operations
//!
//! Each operation resolves its paths through the [`Sandbox`] first, then
//! performs the OS call. Results are plain typed values; turning them into
//! MCP content is the job of [`crate::handlers`].

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::classify;
use crate::sandbox::Sandbox;
use crate::types::{
    ContentDecision, DeliveryMode, DirEntryInfo, FileStat, FsError, FsResult, Limits, MoveError,
    SearchMatch,
};

/// Result of reading a path
#[derive(Debug)]
pub enum ReadOutcome {
    /// Directories are never read as bytes
    Directory(PathBuf),
    File(FileContent),
}

/// A classified file, with its bytes when the decision inlines them
#[derive(Debug)]
pub struct FileContent {
    pub path: PathBuf,
    pub size: u64,
    pub decision: ContentDecision,
    /// Present for `InlineText` and `InlineBase64`
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CreateDirOutcome {
    Created(PathBuf),
    AlreadyExists(PathBuf),
}

// ============================================================================
// Metadata
// ============================================================================

fn to_utc(time: std::io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> String {
    if metadata.permissions().readonly() {
        "444".to_string()
    } else {
        "666".to_string()
    }
}

/// Build a [`FileStat`] from OS metadata
pub fn file_stat(metadata: &Metadata) -> FileStat {
    let modified =
        to_utc(metadata.modified()).unwrap_or_else(|| DateTime::<Utc>::from(UNIX_EPOCH));

    FileStat {
        size: metadata.len(),
        created: to_utc(metadata.created()).unwrap_or(modified),
        modified,
        accessed: to_utc(metadata.accessed()).unwrap_or(modified),
        is_directory: metadata.is_dir(),
        is_file: !metadata.is_dir(),
        permissions: permission_bits(metadata),
    }
}

pub async fn stat(path: &Path) -> FsResult<FileStat> {
    let metadata = fs::metadata(path).await?;
    Ok(file_stat(&metadata))
}

// ============================================================================
// Read
// ============================================================================

pub async fn read(sandbox: &Sandbox, limits: &Limits, path: &str) -> FsResult<ReadOutcome> {
    let resolved = sandbox.validate(path).await?;
    read_resolved(limits, resolved).await
}

/// Read a path that has already been through the sandbox
pub async fn read_resolved(limits: &Limits, path: PathBuf) -> FsResult<ReadOutcome> {
    let stat = stat(&path).await?;
    if stat.is_directory {
        return Ok(ReadOutcome::Directory(path));
    }

    let decision = classify::classify(&path, &stat, limits).await;
    let data = match decision.mode {
        DeliveryMode::InlineText | DeliveryMode::InlineBase64 => Some(fs::read(&path).await?),
        DeliveryMode::ReferenceOnly(_) => None,
    };

    tracing::debug!(
        path = %path.display(),
        size = stat.size,
        mime = %decision.mime_type,
        mode = ?decision.mode,
        "Classified file"
    );

    Ok(ReadOutcome::File(FileContent {
        path,
        size: stat.size,
        decision,
        data,
    }))
}

// ============================================================================
// Write
// ============================================================================

/// Write `content` to `path`, creating missing parents; returns bytes written
pub async fn write(sandbox: &Sandbox, path: &str, content: &[u8]) -> FsResult<(PathBuf, u64)> {
    let resolved = sandbox.validate(path).await?;

    if let Ok(metadata) = fs::metadata(&resolved).await {
        if metadata.is_dir() {
            return Err(FsError::IsADirectory);
        }
    }

    if let Some(parent) = resolved.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&resolved, content).await?;

    tracing::info!(path = %resolved.display(), bytes = content.len(), "Wrote file");
    Ok((resolved, content.len() as u64))
}

// ============================================================================
// Directories
// ============================================================================

pub async fn list_directory(
    sandbox: &Sandbox,
    path: &str,
) -> FsResult<(PathBuf, Vec<DirEntryInfo>)> {
    let resolved = sandbox.validate(path).await?;
    let entries = list_resolved(&resolved).await?;
    Ok((resolved, entries))
}

/// Enumerate the immediate children of a resolved directory
pub async fn list_resolved(dir: &Path) -> FsResult<Vec<DirEntryInfo>> {
    let metadata = fs::metadata(dir).await?;
    if !metadata.is_dir() {
        return Err(FsError::NotADirectory);
    }

    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let is_directory = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        let size = if is_directory {
            None
        } else {
            entry.metadata().await.ok().map(|m| m.len())
        };

        entries.push(DirEntryInfo {
            name: entry.file_name().to_string_lossy().to_string(),
            path: entry.path(),
            is_directory,
            size,
        });
    }

    Ok(entries)
}

pub async fn create_directory(sandbox: &Sandbox, path: &str) -> FsResult<CreateDirOutcome> {
    let resolved = sandbox.validate(path).await?;

    if let Ok(metadata) = fs::metadata(&resolved).await {
        if metadata.is_dir() {
            return Ok(CreateDirOutcome::AlreadyExists(resolved));
        }
        return Err(FsError::ExistsNotDirectory(path.to_string()));
    }

    fs::create_dir_all(&resolved).await?;
    tracing::info!(path = %resolved.display(), "Created directory");
    Ok(CreateDirOutcome::Created(resolved))
}

// ============================================================================
// Move
// ============================================================================

/// Rename `source` to `destination`; never falls back to copy + delete
pub async fn move_file(
    sandbox: &Sandbox,
    source: &str,
    destination: &str,
) -> Result<PathBuf, MoveError> {
    let src = sandbox.validate(source).await.map_err(MoveError::Source)?;
    if fs::symlink_metadata(&src).await.is_err() {
        return Err(MoveError::SourceMissing(source.to_string()));
    }

    let dst = sandbox
        .validate(destination)
        .await
        .map_err(MoveError::Destination)?;

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(MoveError::CreateParent)?;
    }

    fs::rename(&src, &dst).await.map_err(MoveError::Rename)?;

    tracing::info!(from = %src.display(), to = %dst.display(), "Moved file");
    Ok(dst)
}

// ============================================================================
// Search
// ============================================================================

/// Case-insensitive substring search over entry names below `path`
///
/// Entries that fail sandbox resolution or cannot be visited are skipped.
/// Only a root that cannot be resolved or is not a directory is an error.
pub async fn search_files(
    sandbox: &Sandbox,
    path: &str,
    pattern: &str,
    cancel: CancellationToken,
) -> FsResult<(PathBuf, Vec<SearchMatch>)> {
    let root = sandbox.validate(path).await?;

    let metadata = fs::metadata(&root).await?;
    if !metadata.is_dir() {
        return Err(FsError::SearchRootNotDirectory);
    }

    let walker = sandbox.clone();
    let walk_root = root.clone();
    let pattern = pattern.to_lowercase();
    let matches =
        tokio::task::spawn_blocking(move || walk(&walker, &walk_root, &pattern, &cancel))
            .await
            .map_err(|e| FsError::Io(std::io::Error::other(e)))??;

    tracing::debug!(root = %root.display(), matches = matches.len(), "Search finished");
    Ok((root, matches))
}

fn walk(
    sandbox: &Sandbox,
    root: &Path,
    pattern: &str,
    cancel: &CancellationToken,
) -> FsResult<Vec<SearchMatch>> {
    let mut matches = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        if cancel.is_cancelled() {
            return Err(FsError::Cancelled);
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::trace!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        // Dangling links fail resolution too, so they never show up as matches
        let resolved = match sandbox.resolve_path(entry.path()) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::trace!(path = %entry.path().display(), error = %e, "Skipping entry");
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.contains(pattern) {
            let stat = std::fs::metadata(&resolved).ok().map(|m| file_stat(&m));
            matches.push(SearchMatch {
                path: entry.path().to_path_buf(),
                resolved,
                stat,
            });
        }
    }

    Ok(matches)
}

// ============================================================================
// Info
// ============================================================================

/// Metadata plus MIME type; directories report `directory` and are never sniffed
pub async fn file_info(sandbox: &Sandbox, path: &str) -> FsResult<(PathBuf, FileStat, String)> {
    let resolved = sandbox.validate(path).await?;
    let stat = stat(&resolved).await?;

    let mime_type = if stat.is_directory {
        "directory".to_string()
    } else {
        classify::detect_mime_type(&resolved).await
    };

    Ok((resolved, stat, mime_type))
}
