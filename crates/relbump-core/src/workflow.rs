//! Top-level release workflow.
//!
//! Ties the version update and publish phases together. A run is described
//! once by an immutable [`RunConfig`]; collaborators are passed in as a
//! [`Tools`] bundle so tests can substitute fakes. Nothing here prints:
//! progress is reported through [`ReleaseEvent`]s and the final
//! [`RunOutcome`], and the CLI decides how to display them.

use std::fmt;

use camino::Utf8PathBuf;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::bump::{self, BumpError, BumpOutcome};
use crate::changelog::ChangelogTool;
use crate::config::Config;
use crate::git::SourceControl;
use crate::package::{PackageRegistry, VersionStore};
use crate::publish::{self, CommitGate, PublishError, PublishOutcome};
use crate::shell::Execution;
use crate::version::ReleaseVersion;

/// Errors from a release run.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The version update phase failed.
    #[error(transparent)]
    Bump(#[from] BumpError),

    /// The publish phase failed.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Neither a new version nor publishing was requested.
    #[error("nothing to do: supply a version, --publish, or both")]
    NothingToDo,
}

/// Result alias for workflow runs.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Manifest and changelog locations, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectFiles {
    /// Package manifest.
    pub manifest: Utf8PathBuf,
    /// Changelog.
    pub changelog: Utf8PathBuf,
}

impl ProjectFiles {
    /// Both paths as strings, in staging order.
    pub fn as_strs(&self) -> [&str; 2] {
        [self.manifest.as_str(), self.changelog.as_str()]
    }
}

impl Default for ProjectFiles {
    fn default() -> Self {
        Self {
            manifest: Utf8PathBuf::from(crate::config::DEFAULT_MANIFEST),
            changelog: Utf8PathBuf::from(crate::config::DEFAULT_CHANGELOG),
        }
    }
}

/// Everything a run needs to know, fixed before it starts.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Version to bump to; `None` publishes the manifest's current version.
    pub new_version: Option<ReleaseVersion>,
    /// Run the publish phase.
    pub publish: bool,
    /// Print mutating commands instead of running them.
    pub dry_run: bool,
    /// When the publish phase commits and tags.
    pub commit_gate: CommitGate,
    /// Manifest and changelog paths.
    pub files: ProjectFiles,
}

impl RunConfig {
    /// Build a run from command-line choices and loaded configuration.
    pub fn from_config(
        config: &Config,
        new_version: Option<ReleaseVersion>,
        publish: bool,
        dry_run: bool,
    ) -> Self {
        Self {
            new_version,
            publish,
            dry_run,
            commit_gate: config.commit_gate(),
            files: ProjectFiles {
                manifest: config.manifest_path(),
                changelog: config.changelog_path(),
            },
        }
    }
}

/// The external collaborators of a run.
#[derive(Clone, Copy)]
pub struct Tools<'a> {
    /// Manifest version access.
    pub versions: &'a dyn VersionStore,
    /// Version control.
    pub scm: &'a dyn SourceControl,
    /// Changelog generator.
    pub changelog: &'a dyn ChangelogTool,
    /// Package registry.
    pub registry: &'a dyn PackageRegistry,
}

impl fmt::Debug for Tools<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tools").finish_non_exhaustive()
    }
}

/// A single external step of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStep {
    /// Package manager rewrites the manifest version.
    VersionSet,
    /// Changelog generation.
    Changelog,
    /// Stage manifest and changelog.
    Stage,
    /// Commit the release.
    Commit,
    /// Create the annotated tag.
    Tag,
    /// Push commits.
    Push,
    /// Push tags.
    PushTags,
    /// Publish to the registry.
    Publish,
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VersionSet => "version-set",
            Self::Changelog => "changelog",
            Self::Stage => "stage",
            Self::Commit => "commit",
            Self::Tag => "tag",
            Self::Push => "push",
            Self::PushTags => "push-tags",
            Self::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Progress events emitted while a run executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseEvent {
    /// Current and requested versions, before they are compared.
    VersionChange {
        /// Version in the manifest.
        current: String,
        /// Requested version.
        new: String,
    },
    /// An external step is about to run.
    StepStarted(ReleaseStep),
    /// Dry run: the command line a step would have run.
    CommandPrinted(String),
    /// The changelog tool failed; the run continues.
    ChangelogFailed(String),
    /// `git status` after the version update.
    GitStatus(String),
    /// The commit gate did not pass, so commit and tag were skipped.
    CommitSkipped {
        /// The gate that was applied.
        gate: CommitGate,
    },
}

/// Forward a dry-run command line as an event.
pub(crate) fn report(execution: Execution, on_event: &mut impl FnMut(ReleaseEvent)) {
    if let Execution::Printed(line) = execution {
        on_event(ReleaseEvent::CommandPrinted(line));
    }
}

/// Result of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Version update phase, when a version was supplied.
    pub bump: Option<BumpOutcome>,
    /// Publish phase, when requested.
    pub publish: Option<PublishOutcome>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

/// Run the version update and/or publish phases.
///
/// With a new version, the update phase runs first; when `publish` is also
/// set, the publish phase follows with the same version. With `publish`
/// alone, the manifest's current version is published.
#[instrument(skip_all, fields(
    version = ?config.new_version.as_ref().map(ReleaseVersion::as_str),
    publish = config.publish,
    dry_run = config.dry_run,
))]
pub fn run(
    config: &RunConfig,
    tools: &Tools<'_>,
    mut on_event: impl FnMut(ReleaseEvent),
) -> WorkflowResult<RunOutcome> {
    if config.new_version.is_none() && !config.publish {
        return Err(WorkflowError::NothingToDo);
    }

    let bump = config
        .new_version
        .as_ref()
        .map(|version| bump::update_version(version, config, tools, &mut on_event))
        .transpose()?;

    let publish = if config.publish {
        Some(publish::publish(
            config.new_version.as_ref(),
            config,
            tools,
            &mut on_event,
        )?)
    } else {
        None
    };

    info!("release run complete");
    Ok(RunOutcome {
        bump,
        publish,
        dry_run: config.dry_run,
    })
}
