//! Version update phase.
//!
//! Moves the project from its manifest version to a strictly greater one:
//! the package manager rewrites the manifest, the changelog tool adds an
//! entry, and the caller gets back the manual steps that finish the release
//! (unless the publish phase is about to run them).

use camino::Utf8PathBuf;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::git::GitError;
use crate::package::ManifestError;
use crate::shell::{ExternalCommand, ShellError};
use crate::version::{self, ReleaseVersion};
use crate::workdir::{self, RootError};
use crate::workflow::{ProjectFiles, ReleaseEvent, ReleaseStep, RunConfig, Tools, report};

/// Errors from the version update phase.
#[derive(Error, Debug)]
pub enum BumpError {
    /// The project root could not be found or entered.
    #[error(transparent)]
    Root(#[from] RootError),

    /// The manifest has no readable current version.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The requested version does not sort after the current one.
    #[error("new version {requested} must be greater than current version {current}")]
    VersionNotGreater {
        /// Version in the manifest.
        current: String,
        /// Version that was requested.
        requested: String,
    },

    /// The package manager failed to set the version.
    #[error(transparent)]
    Shell(#[from] ShellError),

    /// Git status could not be shown.
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Result alias for the version update phase.
pub type BumpResult<T> = Result<T, BumpError>;

/// What the version update phase did.
#[derive(Debug, Clone, Serialize)]
pub struct BumpOutcome {
    /// Project root the phase ran in.
    pub root: Utf8PathBuf,
    /// Version before the update.
    pub previous: String,
    /// Version after the update.
    pub new: ReleaseVersion,
    /// Whether the changelog tool succeeded.
    pub changelog_generated: bool,
    /// Commands the user should run next; empty when publishing follows.
    pub next_steps: Vec<String>,
}

/// Update the project to `new`.
///
/// Runs from the project root and restores the working directory on every
/// exit path. A changelog tool failure is reported and otherwise ignored.
#[instrument(skip_all, fields(%new))]
pub fn update_version(
    new: &ReleaseVersion,
    config: &RunConfig,
    tools: &Tools<'_>,
    mut on_event: impl FnMut(ReleaseEvent),
) -> BumpResult<BumpOutcome> {
    let (root, _guard) = workdir::enter_project_root(tools.scm)?;

    let current = tools.versions.read_version()?;
    on_event(ReleaseEvent::VersionChange {
        current: current.clone(),
        new: new.to_string(),
    });

    if version::is_less_or_equal(new.as_str(), &current) {
        return Err(BumpError::VersionNotGreater {
            current,
            requested: new.to_string(),
        });
    }

    on_event(ReleaseEvent::StepStarted(ReleaseStep::VersionSet));
    report(tools.versions.write_version(new)?, &mut on_event);

    on_event(ReleaseEvent::StepStarted(ReleaseStep::Changelog));
    let changelog_generated = match tools.changelog.generate(new) {
        Ok(execution) => {
            report(execution, &mut on_event);
            true
        }
        Err(e) => {
            warn!(error = %e, "changelog generation failed, continuing");
            on_event(ReleaseEvent::ChangelogFailed(e.to_string()));
            false
        }
    };

    if !config.dry_run {
        on_event(ReleaseEvent::GitStatus(tools.scm.status()?));
    }

    let next_steps = if config.publish {
        Vec::new()
    } else {
        next_steps(new, &config.files)
    };

    info!(previous = %current, "version updated");
    Ok(BumpOutcome {
        root,
        previous: current,
        new: new.clone(),
        changelog_generated,
        next_steps,
    })
}

/// The manual commands that finish a release after a bump.
pub fn next_steps(version: &ReleaseVersion, files: &ProjectFiles) -> Vec<String> {
    let v = version.as_str();
    let stage = ExternalCommand::new("git")
        .arg("add")
        .args(files.as_strs());
    let message = format!("Version {v}");
    let commit = ExternalCommand::new("git").args(["commit", "-m", message.as_str()]);
    let notes = ExternalCommand::new("relbump").args(["--notes", v]);
    let tag = ExternalCommand::new("git").args(["tag", "-a", v, "-F", "-"]);

    vec![
        stage.display_line(),
        commit.display_line(),
        format!("{notes} | {tag}"),
    ]
}
