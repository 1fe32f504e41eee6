//! Configuration loading for secure-fs-mcp
//!
//! Configuration is loaded from the first of:
//! 1. `--config <FILE>` on the command line
//! 2. `SECURE_FS_CONFIG` env var
//! 3. `./secure-fs-mcp.toml`
//! 4. `$XDG_CONFIG_HOME/secure-fs-mcp/config.toml`
//! 5. Default config if none found
//!
//! Directories given on the command line are appended to the loaded ones.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::types::Config;

pub const CONFIG_ENV: &str = "SECURE_FS_CONFIG";

impl Config {
    /// Load the config file, then append command-line directories
    pub fn load(explicit: Option<&Path>, cli_dirs: &[String]) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => Self::discover(),
        };

        config.allowed_directories.extend(cli_dirs.iter().cloned());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str::<Config>(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn discover() -> Self {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Skipping config {}: {:#}", path.display(), e),
            }
        }

        tracing::info!("Using default configuration");
        Config::default()
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(env_path));
        }

        paths.push(PathBuf::from("secure-fs-mcp.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("secure-fs-mcp").join("config.toml"));
        }

        paths
    }
}
