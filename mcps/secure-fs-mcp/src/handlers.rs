//! Filesystem tool handlers
//!
//! Each handler runs one operation from [`crate::ops`] and shapes the outcome
//! into MCP content. Operational failures (access denied, not found, ...)
//! become failed results with `is_error` set; only malformed requests and
//! resource reads produce protocol errors.

use std::fmt::Display;
use std::fmt::Write as _;
use std::path::Path;

use base64::Engine;
use chrono::SecondsFormat;
use mcp_common::{
    internal_error, invalid_params, multi_success, text_failure, text_success, CallToolResult,
    Content, McpError,
};
use rmcp::model::ResourceContents;
use tokio_util::sync::CancellationToken;

use crate::ops::{self, CreateDirOutcome, FileContent, ReadOutcome};
use crate::params::*;
use crate::sandbox::Sandbox;
use crate::types::{DeliveryMode, DirEntryInfo, FsError, Limits, ReferenceReason};

// ============================================================================
// Helper Functions
// ============================================================================

/// Map an [`FsError`] onto a protocol error, for callers with no failed-result form
pub fn fs_error_to_mcp(err: FsError) -> McpError {
    match &err {
        e if e.is_access_denied() => McpError::invalid_request(err.to_string(), None),
        FsError::InvalidPath(_) => invalid_params(err.to_string()),
        FsError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            McpError::resource_not_found(err.to_string(), None)
        }
        _ => internal_error(err.to_string()),
    }
}

/// Reference identifier for a path
pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn failure(err: impl Display) -> CallToolResult {
    text_failure(format!("Error: {}", err))
}

fn text_resource(uri: &str, mime_type: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(mime_type.to_string()),
        text,
        meta: None,
    }
}

fn blob_resource(uri: &str, mime_type: &str, data: &[u8]) -> ResourceContents {
    ResourceContents::BlobResourceContents {
        uri: uri.to_string(),
        mime_type: Some(mime_type.to_string()),
        blob: base64::engine::general_purpose::STANDARD.encode(data),
        meta: None,
    }
}

/// Embedded text reference pointing at `path`
fn reference(path: &Path, text: String) -> Content {
    Content::resource(text_resource(&file_uri(path), "text/plain", text))
}

fn directory_reference(path: &Path) -> Content {
    reference(path, format!("Directory: {}", path.display()))
}

/// Listing text shared by `list_directory` and directory resource reads
pub fn format_listing(dir: &Path, entries: &[DirEntryInfo]) -> String {
    let mut out = format!("Directory listing for: {}\n\n", dir.display());
    for entry in entries {
        let uri = file_uri(&entry.path);
        let _ = match (entry.is_directory, entry.size) {
            (true, _) => writeln!(out, "[DIR]  {} ({})", entry.name, uri),
            (false, Some(size)) => writeln!(out, "[FILE] {} ({}) - {} bytes", entry.name, uri, size),
            (false, None) => writeln!(out, "[FILE] {} ({})", entry.name, uri),
        };
    }
    out
}

/// Content items for a read, by delivery mode
pub fn read_contents(outcome: ReadOutcome) -> Vec<Content> {
    let file = match outcome {
        ReadOutcome::Directory(path) => {
            return vec![
                Content::text(format!(
                    "This is a directory. Use the resource URI to browse its contents: {}",
                    file_uri(&path)
                )),
                directory_reference(&path),
            ];
        }
        ReadOutcome::File(file) => file,
    };

    let FileContent {
        path,
        size,
        decision,
        data,
    } = file;
    let uri = file_uri(&path);
    let mime = decision.mime_type;
    let summary = format!("{} ({}, {} bytes)", path.display(), mime, size);

    match decision.mode {
        DeliveryMode::InlineText => {
            let data = data.unwrap_or_default();
            vec![Content::text(String::from_utf8_lossy(&data).into_owned())]
        }
        DeliveryMode::InlineBase64 => {
            let data = data.unwrap_or_default();
            vec![
                Content::text(format!("Binary file: {}", summary)),
                Content::resource(blob_resource(&uri, &mime, &data)),
            ]
        }
        DeliveryMode::ReferenceOnly(ReferenceReason::ExceedsInlineLimit) => vec![
            Content::text(format!(
                "File is too large to display inline ({} bytes). Access it via resource URI: {}",
                size, uri
            )),
            reference(&path, format!("Large file: {}", summary)),
        ],
        DeliveryMode::ReferenceOnly(ReferenceReason::BinaryExceedsBase64Limit) => vec![
            Content::text(format!(
                "Binary file: {}. Access it via resource URI: {}",
                summary, uri
            )),
            reference(&path, format!("Binary file: {}", summary)),
        ],
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

pub async fn read_file(
    sandbox: &Sandbox,
    limits: &Limits,
    params: ReadFileParams,
) -> Result<CallToolResult, McpError> {
    match ops::read(sandbox, limits, &params.path).await {
        Ok(outcome) => Ok(multi_success(read_contents(outcome))),
        Err(e) => {
            tracing::debug!(path = %params.path, error = %e, "read_file failed");
            Ok(failure(e))
        }
    }
}

pub async fn read_multiple_files(
    sandbox: &Sandbox,
    limits: &Limits,
    params: ReadMultipleFilesParams,
    cancel: &CancellationToken,
) -> Result<CallToolResult, McpError> {
    let mut contents = Vec::with_capacity(params.paths.len() * 2);

    for path in &params.paths {
        if cancel.is_cancelled() {
            return Ok(failure(FsError::Cancelled));
        }

        contents.push(Content::text(format!("--- File: {} ---", path)));
        match ops::read(sandbox, limits, path).await {
            Ok(outcome) => contents.extend(read_contents(outcome)),
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "read_multiple_files entry failed");
                contents.push(Content::text(format!("Error: {}", e)));
            }
        }
    }

    Ok(multi_success(contents))
}

pub async fn write_file(
    sandbox: &Sandbox,
    params: WriteFileParams,
) -> Result<CallToolResult, McpError> {
    match ops::write(sandbox, &params.path, params.content.as_bytes()).await {
        Ok((path, bytes)) => Ok(multi_success(vec![
            Content::text(format!(
                "Successfully wrote {} bytes to {}",
                bytes, params.path
            )),
            reference(&path, format!("File: {} ({} bytes)", path.display(), bytes)),
        ])),
        Err(e) => Ok(failure(e)),
    }
}

pub async fn list_directory(
    sandbox: &Sandbox,
    params: ListDirectoryParams,
) -> Result<CallToolResult, McpError> {
    match ops::list_directory(sandbox, &params.path).await {
        Ok((path, entries)) => Ok(multi_success(vec![
            Content::text(format_listing(&path, &entries)),
            directory_reference(&path),
        ])),
        Err(e) => Ok(failure(e)),
    }
}

pub async fn create_directory(
    sandbox: &Sandbox,
    params: CreateDirectoryParams,
) -> Result<CallToolResult, McpError> {
    let (message, path) = match ops::create_directory(sandbox, &params.path).await {
        Ok(CreateDirOutcome::AlreadyExists(path)) => {
            (format!("Directory already exists: {}", params.path), path)
        }
        Ok(CreateDirOutcome::Created(path)) => (
            format!("Successfully created directory {}", params.path),
            path,
        ),
        Err(e) => return Ok(failure(e)),
    };

    Ok(multi_success(vec![
        Content::text(message),
        directory_reference(&path),
    ]))
}

pub async fn move_file(
    sandbox: &Sandbox,
    params: MoveFileParams,
) -> Result<CallToolResult, McpError> {
    match ops::move_file(sandbox, &params.source, &params.destination).await {
        Ok(dst) => Ok(multi_success(vec![
            Content::text(format!(
                "Successfully moved {} to {}",
                params.source, params.destination
            )),
            reference(&dst, format!("Moved file: {}", dst.display())),
        ])),
        // MoveError carries its own prefix
        Err(e) => Ok(text_failure(e.to_string())),
    }
}

pub async fn search_files(
    sandbox: &Sandbox,
    params: SearchFilesParams,
    cancel: CancellationToken,
) -> Result<CallToolResult, McpError> {
    let matches = match ops::search_files(sandbox, &params.path, &params.pattern, cancel).await {
        Ok((_, matches)) => matches,
        Err(e) => return Ok(failure(e)),
    };

    if matches.is_empty() {
        return Ok(text_success(format!(
            "No files found matching pattern '{}' in {}",
            params.pattern, params.path
        )));
    }

    let mut out = format!("Found {} results:\n\n", matches.len());
    for m in &matches {
        let uri = file_uri(&m.path);
        let path = m.path.display();
        let _ = match &m.stat {
            Some(stat) if stat.is_directory => writeln!(out, "[DIR]  {} ({})", path, uri),
            Some(stat) => writeln!(out, "[FILE] {} ({}) - {} bytes", path, uri, stat.size),
            None => writeln!(out, "{} ({})", path, uri),
        };
    }

    Ok(text_success(out))
}

pub async fn get_file_info(
    sandbox: &Sandbox,
    params: GetFileInfoParams,
) -> Result<CallToolResult, McpError> {
    let (path, stat, mime_type) = match ops::file_info(sandbox, &params.path).await {
        Ok(info) => info,
        Err(e) => return Ok(failure(e)),
    };

    let uri = file_uri(&path);
    let kind = if stat.is_directory { "Directory" } else { "File" };
    let ts = |t: &chrono::DateTime<chrono::Utc>| t.to_rfc3339_opts(SecondsFormat::Secs, true);

    let text = format!(
        "File information for: {}\n\nSize: {} bytes\nCreated: {}\nModified: {}\nAccessed: {}\nIsDirectory: {}\nIsFile: {}\nPermissions: {}\nMIME Type: {}\nResource URI: {}",
        path.display(),
        stat.size,
        ts(&stat.created),
        ts(&stat.modified),
        ts(&stat.accessed),
        stat.is_directory,
        stat.is_file,
        stat.permissions,
        mime_type,
        uri,
    );

    Ok(multi_success(vec![
        Content::text(text),
        reference(
            &path,
            format!(
                "{}: {} ({}, {} bytes)",
                kind,
                path.display(),
                mime_type,
                stat.size
            ),
        ),
    ]))
}

pub async fn list_allowed_directories(sandbox: &Sandbox) -> Result<CallToolResult, McpError> {
    let mut out = String::from("Allowed directories:\n\n");
    for root in sandbox.roots().roots() {
        let dir = root.display_path();
        let _ = writeln!(out, "{} ({})", dir.display(), file_uri(dir));
    }
    Ok(text_success(out))
}

// ============================================================================
// Resources
// ============================================================================

/// Read a `file://` resource with the same content shaping as `read_file`
pub async fn read_resource(
    sandbox: &Sandbox,
    limits: &Limits,
    uri: &str,
) -> Result<Vec<ResourceContents>, McpError> {
    let path = uri
        .strip_prefix("file://")
        .ok_or_else(|| invalid_params(format!("unsupported URI scheme: {}", uri)))?;

    let resolved = sandbox.validate(path).await.map_err(fs_error_to_mcp)?;
    let outcome = ops::read_resolved(limits, resolved)
        .await
        .map_err(fs_error_to_mcp)?;

    let contents = match outcome {
        ReadOutcome::Directory(dir) => {
            let entries = ops::list_resolved(&dir).await.map_err(fs_error_to_mcp)?;
            text_resource(uri, "text/plain", format_listing(&dir, &entries))
        }
        ReadOutcome::File(FileContent {
            size,
            decision,
            data,
            ..
        }) => match decision.mode {
            DeliveryMode::InlineText => {
                let data = data.unwrap_or_default();
                text_resource(
                    uri,
                    &decision.mime_type,
                    String::from_utf8_lossy(&data).into_owned(),
                )
            }
            DeliveryMode::InlineBase64 => {
                blob_resource(uri, &decision.mime_type, &data.unwrap_or_default())
            }
            DeliveryMode::ReferenceOnly(ReferenceReason::ExceedsInlineLimit) => text_resource(
                uri,
                "text/plain",
                format!(
                    "File is too large to display inline ({} bytes). Use the read_file tool to access specific portions.",
                    size
                ),
            ),
            DeliveryMode::ReferenceOnly(ReferenceReason::BinaryExceedsBase64Limit) => {
                text_resource(
                    uri,
                    "text/plain",
                    format!(
                        "Binary file ({}, {} bytes). Use the read_file tool to access specific portions.",
                        decision.mime_type, size
                    ),
                )
            }
        },
    };

    Ok(vec![contents])
}
