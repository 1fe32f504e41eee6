//! Allowed-root registry
//!
//! Built once at startup and never mutated afterwards. Containment is a
//! component-wise prefix test (`Path::starts_with`), so `/tmp/foo` never
//! admits `/tmp/foobar`.

use std::path::{Path, PathBuf};

use path_absolutize::Absolutize;

use crate::types::{FsError, FsResult};

/// A directory the server may access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoot {
    /// Absolute, lexically cleaned form as configured
    lexical: PathBuf,
    /// Symlink-resolved form
    canonical: PathBuf,
}

impl AllowedRoot {
    /// Display form, without a trailing separator
    pub fn display_path(&self) -> &Path {
        &self.lexical
    }

    pub fn canonical_path(&self) -> &Path {
        &self.canonical
    }

    fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.canonical) || path.starts_with(&self.lexical)
    }
}

/// The immutable set of allowed roots
#[derive(Debug, Clone)]
pub struct AllowedRoots {
    roots: Vec<AllowedRoot>,
}

impl AllowedRoots {
    /// Validate and normalize every configured directory
    ///
    /// Any entry that cannot be made absolute, does not exist or is not a
    /// directory fails the whole registry.
    pub fn initialize<S: AsRef<str>>(raw_dirs: &[S]) -> FsResult<Self> {
        let mut roots = Vec::with_capacity(raw_dirs.len());

        for raw in raw_dirs {
            let raw = raw.as_ref();
            let lexical = Path::new(raw)
                .absolutize()
                .map_err(|e| {
                    FsError::ConfigError(format!("failed to resolve path {}: {}", raw, e))
                })?
                .to_path_buf();

            let metadata = std::fs::metadata(&lexical).map_err(|e| {
                FsError::ConfigError(format!(
                    "failed to access directory {}: {}",
                    lexical.display(),
                    e
                ))
            })?;
            if !metadata.is_dir() {
                return Err(FsError::ConfigError(format!(
                    "path is not a directory: {}",
                    lexical.display()
                )));
            }

            let canonical = lexical.canonicalize().map_err(|e| {
                FsError::ConfigError(format!(
                    "failed to resolve symlinks for {}: {}",
                    lexical.display(),
                    e
                ))
            })?;

            tracing::info!(
                root = %lexical.display(),
                resolved = %canonical.display(),
                "Registered allowed directory"
            );
            roots.push(AllowedRoot { lexical, canonical });
        }

        Ok(Self { roots })
    }

    /// True if `path` lies at or below some allowed root
    ///
    /// `path` must already be absolute and lexically clean.
    pub fn contains(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| root.contains(path))
    }

    pub fn roots(&self) -> &[AllowedRoot] {
        &self.roots
    }
}
