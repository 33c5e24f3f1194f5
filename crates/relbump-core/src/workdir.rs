//! Scoped working-directory changes.
//!
//! The release workflows run from the repository root so that relative
//! manifest and changelog paths resolve the same way the external tools see
//! them. [`DirGuard`] changes the process directory and puts it back when it
//! goes out of scope, whichever way the workflow returns.

use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::git::{GitError, SourceControl};

/// Errors from locating or entering the project root.
#[derive(Error, Debug)]
pub enum RootError {
    /// The version-control system could not name a top-level directory.
    #[error("could not determine the project root: {0}")]
    NotFound(#[source] GitError),

    /// The directory exists in git's view but could not be entered.
    #[error("failed to enter {path}: {source}")]
    Enter {
        /// The directory that could not be entered.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Restores the previous working directory on drop.
#[derive(Debug)]
#[must_use = "the directory is restored as soon as the guard is dropped"]
pub struct DirGuard {
    original: PathBuf,
}

impl DirGuard {
    /// Change into `dir`, remembering where we came from.
    pub fn enter(dir: &Utf8Path) -> std::io::Result<Self> {
        let original = std::env::current_dir()?;
        std::env::set_current_dir(dir)?;
        debug!(%dir, original = %original.display(), "entered directory");
        Ok(Self { original })
    }

    /// The directory that will be restored.
    pub fn original(&self) -> &std::path::Path {
        &self.original
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        match std::env::set_current_dir(&self.original) {
            Ok(()) => debug!(dir = %self.original.display(), "restored directory"),
            Err(e) => warn!(
                dir = %self.original.display(),
                error = %e,
                "failed to restore working directory"
            ),
        }
    }
}

/// Resolve the repository root through `scm` and change into it.
pub fn enter_project_root(scm: &dyn SourceControl) -> Result<(Utf8PathBuf, DirGuard), RootError> {
    let root = scm.toplevel().map_err(RootError::NotFound)?;
    let guard = DirGuard::enter(&root).map_err(|source| RootError::Enter {
        path: root.clone(),
        source,
    })?;
    Ok((root, guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial(cwd)]
    fn guard_restores_on_drop() {
        let before = std::env::current_dir().unwrap();
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().canonicalize().unwrap()).unwrap();

        {
            let guard = DirGuard::enter(&dir).unwrap();
            assert_eq!(guard.original(), before.as_path());
            assert_eq!(std::env::current_dir().unwrap(), dir.as_std_path());
        }

        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial(cwd)]
    fn guard_restores_on_early_return() {
        fn failing_step(dir: &Utf8Path) -> Result<(), &'static str> {
            let _guard = DirGuard::enter(dir).map_err(|_| "enter")?;
            Err("step failed")
        }

        let before = std::env::current_dir().unwrap();
        let tmp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();

        assert_eq!(failing_step(&dir), Err("step failed"));
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial(cwd)]
    fn entering_missing_directory_fails_without_moving() {
        let before = std::env::current_dir().unwrap();
        let result = DirGuard::enter(Utf8Path::new("/nonexistent/relbump/dir"));
        assert!(result.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
