//! Publish phase: commit, tag, push, publish.
//!
//! The commit and annotated tag are gated on the working-tree state (see
//! [`CommitGate`]); pushing and publishing always run, and the first failing
//! step ends the phase.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::changelog;
use crate::git::{self, GitError};
use crate::package::ManifestError;
use crate::shell::ShellError;
use crate::version::ReleaseVersion;
use crate::workdir::{self, RootError};
use crate::workflow::{ReleaseEvent, ReleaseStep, RunConfig, Tools, report};

/// Errors from the publish phase.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The project root could not be found or entered.
    #[error(transparent)]
    Root(#[from] RootError),

    /// No version was supplied and the manifest has none.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A git step failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The registry publish failed.
    #[error(transparent)]
    Shell(#[from] ShellError),
}

/// Result alias for the publish phase.
pub type PublishResult<T> = Result<T, PublishError>;

/// When the publish phase creates the release commit and tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitGate {
    /// Only when `git status --short` is empty.
    #[default]
    CleanTree,
    /// Only when `git status --short` shows changes to commit.
    PendingChanges,
}

impl CommitGate {
    /// Whether commit and tag should run given `git status --short` output.
    pub fn allows(self, status_short: &str) -> bool {
        let clean = status_short.trim().is_empty();
        match self {
            Self::CleanTree => clean,
            Self::PendingChanges => !clean,
        }
    }
}

impl fmt::Display for CommitGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CleanTree => f.write_str("clean-tree"),
            Self::PendingChanges => f.write_str("pending-changes"),
        }
    }
}

/// What the publish phase did.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    /// The version that was published.
    pub version: String,
    /// Whether the commit and tag steps ran.
    pub committed: bool,
    /// Releases page to finish the release on (not computed in dry runs).
    pub releases_url: Option<String>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Commit, tag, push and publish `version` (or the manifest version).
#[instrument(skip_all, fields(
    version = ?version.map(ReleaseVersion::as_str),
    gate = %config.commit_gate,
))]
pub fn publish(
    version: Option<&ReleaseVersion>,
    config: &RunConfig,
    tools: &Tools<'_>,
    mut on_event: impl FnMut(ReleaseEvent),
) -> PublishResult<PublishOutcome> {
    let (_root, _guard) = workdir::enter_project_root(tools.scm)?;

    let version = match version {
        Some(v) => v.to_string(),
        None => tools.versions.read_version()?,
    };

    let status = tools.scm.status_short()?;
    let committed = config.commit_gate.allows(&status);
    if committed {
        on_event(ReleaseEvent::StepStarted(ReleaseStep::Stage));
        report(tools.scm.stage(&config.files.as_strs())?, &mut on_event);

        on_event(ReleaseEvent::StepStarted(ReleaseStep::Commit));
        report(
            tools.scm.commit(&format!("Version {version}"))?,
            &mut on_event,
        );

        on_event(ReleaseEvent::StepStarted(ReleaseStep::Tag));
        let message = tag_message(config, &version);
        report(tools.scm.tag(&version, &message)?, &mut on_event);
    } else {
        debug!(%status, "commit gate closed");
        on_event(ReleaseEvent::CommitSkipped {
            gate: config.commit_gate,
        });
    }

    on_event(ReleaseEvent::StepStarted(ReleaseStep::Push));
    report(tools.scm.push()?, &mut on_event);

    on_event(ReleaseEvent::StepStarted(ReleaseStep::PushTags));
    report(tools.scm.push_tags()?, &mut on_event);

    on_event(ReleaseEvent::StepStarted(ReleaseStep::Publish));
    report(tools.registry.publish()?, &mut on_event);

    let releases_url = if config.dry_run {
        None
    } else {
        tools
            .scm
            .remote_url()?
            .as_deref()
            .and_then(git::releases_url)
    };

    info!(%version, committed, "published");
    Ok(PublishOutcome {
        version,
        committed,
        releases_url,
        dry_run: config.dry_run,
    })
}

/// Annotated tag message: the changelog section for `version`, or
/// `Version <version>` when the changelog has none.
fn tag_message(config: &RunConfig, version: &str) -> String {
    let section = match changelog::read_section(&config.files.changelog, version) {
        Ok(section) => section,
        Err(e) => {
            warn!(path = %config.files.changelog, error = %e, "could not read changelog");
            String::new()
        }
    };
    if section.trim().is_empty() {
        format!("Version {version}")
    } else {
        section
    }
}
