//! Sandbox module for path validation and security
//!
//! Every caller path passes two containment checks against the
//! [`AllowedRoots`]: once on the lexical absolute path, and once on the
//! symlink-resolved path (or the resolved parent, for paths that do not exist
//! yet). Both must pass.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use path_absolutize::Absolutize;

use crate::registry::AllowedRoots;
use crate::types::{FsError, FsResult};

/// Path resolver bound to an immutable root registry
#[derive(Debug, Clone)]
pub struct Sandbox {
    roots: Arc<AllowedRoots>,
}

impl Sandbox {
    pub fn new(roots: AllowedRoots) -> Self {
        Self {
            roots: Arc::new(roots),
        }
    }

    pub fn roots(&self) -> &AllowedRoots {
        &self.roots
    }

    /// Resolve a caller path to a verified absolute path
    ///
    /// Existing paths come back symlink-resolved. A path that does not exist
    /// yet comes back in its lexical absolute form, after its parent has been
    /// resolved and checked.
    pub fn resolve(&self, requested: &str) -> FsResult<PathBuf> {
        if requested.contains('\0') {
            return Err(FsError::InvalidPath("path contains null byte".to_string()));
        }
        self.resolve_path(Path::new(requested))
    }

    /// Same as [`Sandbox::resolve`] for paths that are already `Path`s,
    /// such as entries produced by a directory walk
    pub fn resolve_path(&self, requested: &Path) -> FsResult<PathBuf> {
        let abs = requested
            .absolutize()
            .map_err(|e| FsError::InvalidPath(format!("{}: {}", requested.display(), e)))?
            .to_path_buf();

        if !self.roots.contains(&abs) {
            tracing::debug!(path = %abs.display(), "Rejected path outside allowed directories");
            return Err(FsError::OutsideAllowed(abs.display().to_string()));
        }

        match abs.canonicalize() {
            Ok(real) => {
                if !self.roots.contains(&real) {
                    tracing::debug!(
                        path = %abs.display(),
                        target = %real.display(),
                        "Rejected symlink escaping allowed directories"
                    );
                    return Err(FsError::SymlinkEscape);
                }
                Ok(real)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => self.resolve_missing(abs),
            Err(e) => Err(FsError::Io(e)),
        }
    }

    /// Resolve on the blocking pool; `canonicalize` may stall on slow storage
    pub async fn validate(&self, requested: &str) -> FsResult<PathBuf> {
        let sandbox = self.clone();
        let requested = requested.to_string();
        tokio::task::spawn_blocking(move || sandbox.resolve(&requested))
            .await
            .map_err(|e| FsError::Io(std::io::Error::other(e)))?
    }

    /// Resolve a path that does not exist yet
    ///
    /// Walks up to the nearest existing ancestor, resolves it and checks it.
    /// Missing components in between are created later under that verified
    /// ancestor, so none of them may be a dangling symlink.
    fn resolve_missing(&self, abs: PathBuf) -> FsResult<PathBuf> {
        let mut missing = abs.as_path();
        loop {
            // A link that exists but points nowhere would be followed by the writer.
            if missing.symlink_metadata().is_ok() {
                tracing::debug!(path = %missing.display(), "Rejected dangling symlink");
                return Err(FsError::SymlinkEscape);
            }

            let parent = missing
                .parent()
                .ok_or_else(|| FsError::ParentMissing(abs.display().to_string()))?;

            match parent.canonicalize() {
                Ok(real_parent) => {
                    if !self.roots.contains(&real_parent) {
                        tracing::debug!(
                            path = %abs.display(),
                            parent = %real_parent.display(),
                            "Rejected parent outside allowed directories"
                        );
                        return Err(FsError::ParentOutsideAllowed);
                    }
                    return Ok(abs);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => missing = parent,
                Err(_) => return Err(FsError::ParentMissing(parent.display().to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sandbox_for(dir: &Path) -> Sandbox {
        Sandbox::new(AllowedRoots::initialize(&[dir.display().to_string()]).unwrap())
    }

    fn path_str(p: &Path) -> String {
        p.display().to_string()
    }

    #[test]
    fn test_resolve_existing_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hello").unwrap();

        let sandbox = sandbox_for(dir.path());
        let resolved = sandbox.resolve(&path_str(&file)).unwrap();
        assert_eq!(resolved, file.canonicalize().unwrap());
        assert!(sandbox.roots().contains(&resolved));
    }

    #[test]
    fn test_resolve_root_itself() {
        let dir = TempDir::new().unwrap();
        let sandbox = sandbox_for(dir.path());
        assert!(sandbox.resolve(&path_str(dir.path())).is_ok());
    }

    #[test]
    fn test_resolve_outside_denied() {
        let allowed = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        std::fs::write(other.path().join("x"), "x").unwrap();

        let sandbox = sandbox_for(allowed.path());
        for p in [other.path().join("x"), other.path().join("missing")] {
            let err = sandbox.resolve(&path_str(&p)).unwrap_err();
            assert!(matches!(err, FsError::OutsideAllowed(_)), "{err}");
            assert!(err
                .to_string()
                .contains("access denied - path outside allowed directories"));
        }
    }

    #[test]
    fn test_dot_dot_escape_denied() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("secret"), "s").unwrap();

        let sandbox = sandbox_for(&root);
        let sneaky = format!("{}/../secret", root.display());
        let err = sandbox.resolve(&sneaky).unwrap_err();
        assert!(matches!(err, FsError::OutsideAllowed(_)));
    }

    #[test]
    fn test_sibling_prefix_collision_denied() {
        let dir = TempDir::new().unwrap();
        let foo = dir.path().join("foo");
        let foobar = dir.path().join("foobar");
        std::fs::create_dir(&foo).unwrap();
        std::fs::create_dir(&foobar).unwrap();
        std::fs::write(foobar.join("x"), "x").unwrap();

        let sandbox = sandbox_for(&foo);
        let err = sandbox.resolve(&path_str(&foobar.join("x"))).unwrap_err();
        assert!(err.is_access_denied());
    }

    #[test]
    fn test_new_file_under_existing_parent() {
        let dir = TempDir::new().unwrap();
        let sandbox = sandbox_for(dir.path());
        let target = dir.path().join("new.txt");
        let resolved = sandbox.resolve(&path_str(&target)).unwrap();
        assert_eq!(resolved, target);
    }

    #[test]
    fn test_new_file_under_missing_subdirectory() {
        let dir = TempDir::new().unwrap();
        let sandbox = sandbox_for(dir.path());
        let target = dir.path().join("a").join("b").join("c.txt");
        let resolved = sandbox.resolve(&path_str(&target)).unwrap();
        assert_eq!(resolved, target);
    }

    #[test]
    fn test_parent_that_is_a_file_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("plain"), "x").unwrap();
        let sandbox = sandbox_for(dir.path());
        let target = dir.path().join("plain").join("child.txt");
        assert!(sandbox.resolve(&path_str(&target)).is_err());
    }

    #[test]
    fn test_null_byte_rejected() {
        let dir = TempDir::new().unwrap();
        let sandbox = sandbox_for(dir.path());
        let err = sandbox.resolve("bad\0path").unwrap_err();
        assert!(matches!(err, FsError::InvalidPath(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_denied() {
        let allowed = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "s").unwrap();
        let link = allowed.path().join("link");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let sandbox = sandbox_for(allowed.path());
        let err = sandbox
            .resolve(&path_str(&link.join("secret.txt")))
            .unwrap_err();
        assert!(matches!(err, FsError::SymlinkEscape));
        assert!(err
            .to_string()
            .contains("access denied - symlink target outside allowed directories"));
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_through_escaping_parent_link_denied() {
        let allowed = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let link = allowed.path().join("link");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let sandbox = sandbox_for(allowed.path());
        let err = sandbox.resolve(&path_str(&link.join("new.txt"))).unwrap_err();
        assert!(matches!(err, FsError::ParentOutsideAllowed));

        let err = sandbox
            .resolve(&path_str(&link.join("deeper").join("new.txt")))
            .unwrap_err();
        assert!(matches!(err, FsError::ParentOutsideAllowed));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_intermediate_symlink_denied() {
        let allowed = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let link = allowed.path().join("dir-link");
        std::os::unix::fs::symlink(outside.path().join("later"), &link).unwrap();

        let sandbox = sandbox_for(allowed.path());
        let err = sandbox.resolve(&path_str(&link.join("f.txt"))).unwrap_err();
        assert!(matches!(err, FsError::SymlinkEscape));
    }

    #[cfg(unix)]
    #[test]
    fn test_internal_symlink_resolves_to_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("real.txt");
        std::fs::write(&target, "r").unwrap();
        let link = dir.path().join("alias.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let sandbox = sandbox_for(dir.path());
        let resolved = sandbox.resolve(&path_str(&link)).unwrap();
        assert_eq!(resolved, target.canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_denied() {
        let allowed = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let link = allowed.path().join("dangling");
        std::os::unix::fs::symlink(outside.path().join("not-yet"), &link).unwrap();

        let sandbox = sandbox_for(allowed.path());
        let err = sandbox.resolve(&path_str(&link)).unwrap_err();
        assert!(matches!(err, FsError::SymlinkEscape));
    }

    #[tokio::test]
    async fn test_validate_runs_off_thread() {
        let dir = TempDir::new().unwrap();
        let sandbox = sandbox_for(dir.path());
        let resolved = sandbox.validate(&path_str(dir.path())).await.unwrap();
        assert_eq!(resolved, dir.path().canonicalize().unwrap());
    }
}
