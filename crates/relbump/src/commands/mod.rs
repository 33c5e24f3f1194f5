//! Command implementations

pub mod current;

pub mod notes;

pub mod release;

use camino::{Utf8Path, Utf8PathBuf};
use relbump_core::git::{SourceControl, SystemGit};
use relbump_core::shell::Shell;
use tracing::debug;

/// The repository root, or `cwd` when not inside a git checkout.
///
/// Only the read-only commands use this; the release workflow insists on a
/// repository.
pub fn project_root_or_cwd(cwd: &Utf8Path) -> Utf8PathBuf {
    match SystemGit::new(Shell::default(), "origin").toplevel() {
        Ok(root) => root,
        Err(e) => {
            debug!(error = %e, "no repository root, using current directory");
            cwd.to_path_buf()
        }
    }
}
