//! Parameter types for secure-fs-mcp tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    #[schemars(description = "Path to the file to read")]
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReadMultipleFilesParams {
    #[schemars(description = "List of file paths to read")]
    pub paths: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WriteFileParams {
    #[schemars(description = "Path where to write the file")]
    pub path: String,

    #[schemars(description = "Content to write to the file")]
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListDirectoryParams {
    #[schemars(description = "Path of the directory to list")]
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateDirectoryParams {
    #[schemars(description = "Path of the directory to create")]
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MoveFileParams {
    #[schemars(description = "Source path of the file or directory")]
    pub source: String,

    #[schemars(description = "Destination path")]
    pub destination: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchFilesParams {
    #[schemars(description = "Starting path for the search")]
    pub path: String,

    #[schemars(description = "Search pattern to match against file names")]
    pub pattern: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetFileInfoParams {
    #[schemars(description = "Path to the file or directory")]
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_multiple_requires_paths() {
        let err = serde_json::from_value::<ReadMultipleFilesParams>(json!({})).unwrap_err();
        assert!(err.to_string().contains("paths"));
    }

    #[test]
    fn test_read_multiple_rejects_non_array() {
        assert!(serde_json::from_value::<ReadMultipleFilesParams>(json!({
            "paths": "not-an-array"
        }))
        .is_err());
    }

    #[test]
    fn test_read_multiple_rejects_non_string_entries() {
        assert!(serde_json::from_value::<ReadMultipleFilesParams>(json!({
            "paths": [123]
        }))
        .is_err());
    }

    #[test]
    fn test_move_uses_source_and_destination() {
        let params: MoveFileParams = serde_json::from_value(json!({
            "source": "/a",
            "destination": "/b"
        }))
        .unwrap();
        assert_eq!(params.source, "/a");
        assert_eq!(params.destination, "/b");
    }
}
