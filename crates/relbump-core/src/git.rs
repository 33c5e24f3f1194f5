//! Git operations for the release workflow.
//!
//! Shells out to `git` for everything, so the user's SSH keys, signing
//! setup and hooks apply. Queries always run; history-changing commands go
//! through the [`Shell`] and are only printed during a dry run.

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::shell::{Execution, ExternalCommand, Shell, ShellError};

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// `git` could not be spawned, or a history-changing command failed.
    #[error(transparent)]
    Shell(#[from] ShellError),

    /// A git query returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "status").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// The version-control operations the release workflow needs.
pub trait SourceControl {
    /// Absolute path of the repository's top-level directory.
    fn toplevel(&self) -> GitResult<Utf8PathBuf>;

    /// Human-readable status, shown to the user after a bump.
    fn status(&self) -> GitResult<String>;

    /// `git status --short` output; empty means a clean tree.
    fn status_short(&self) -> GitResult<String>;

    /// Stage the given paths.
    fn stage(&self, paths: &[&str]) -> GitResult<Execution>;

    /// Commit staged changes.
    fn commit(&self, message: &str) -> GitResult<Execution>;

    /// Create an annotated tag.
    fn tag(&self, name: &str, message: &str) -> GitResult<Execution>;

    /// Push commits to the upstream branch.
    fn push(&self) -> GitResult<Execution>;

    /// Push all tags.
    fn push_tags(&self) -> GitResult<Execution>;

    /// URL of the configured remote, if it exists.
    fn remote_url(&self) -> GitResult<Option<String>>;
}

/// [`SourceControl`] backed by the `git` binary.
#[derive(Debug, Clone)]
pub struct SystemGit {
    shell: Shell,
    remote: String,
}

impl SystemGit {
    /// Create a git backend; `remote` names the remote used for release URLs.
    pub fn new(shell: Shell, remote: impl Into<String>) -> Self {
        Self {
            shell,
            remote: remote.into(),
        }
    }

    fn mutate(&self, args: &[&str]) -> GitResult<Execution> {
        let command = ExternalCommand::new("git").args(args.iter().copied());
        Ok(self.shell.run(&command)?)
    }
}

impl SourceControl for SystemGit {
    #[instrument(skip(self))]
    fn toplevel(&self) -> GitResult<Utf8PathBuf> {
        let output = git(&["rev-parse", "--show-toplevel"])?;
        let root = Utf8PathBuf::from(output.trim());
        debug!(%root, "repository root");
        Ok(root)
    }

    fn status(&self) -> GitResult<String> {
        git(&["status"])
    }

    #[instrument(skip(self))]
    fn status_short(&self) -> GitResult<String> {
        let output = git(&["status", "--short"])?;
        debug!(clean = output.trim().is_empty(), "working tree status");
        Ok(output)
    }

    fn stage(&self, paths: &[&str]) -> GitResult<Execution> {
        let mut args = vec!["add"];
        args.extend_from_slice(paths);
        self.mutate(&args)
    }

    fn commit(&self, message: &str) -> GitResult<Execution> {
        self.mutate(&["commit", "-m", message])
    }

    fn tag(&self, name: &str, message: &str) -> GitResult<Execution> {
        self.mutate(&["tag", "-a", name, "-m", message])
    }

    fn push(&self) -> GitResult<Execution> {
        self.mutate(&["push"])
    }

    fn push_tags(&self) -> GitResult<Execution> {
        self.mutate(&["push", "--tags"])
    }

    #[instrument(skip(self), fields(remote = %self.remote))]
    fn remote_url(&self) -> GitResult<Option<String>> {
        match git(&["remote", "get-url", &self.remote]) {
            Ok(url) => {
                let url = url.trim().to_string();
                debug!(%url, "remote URL");
                Ok(Some(url))
            }
            Err(GitError::Command { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Derive the web page listing releases from a remote URL.
///
/// Strips a trailing `.git` and appends `/releases`. scp-style SSH remotes
/// (`git@host:owner/repo.git`) are rewritten to `https://host/owner/repo`
/// so the result opens in a browser.
pub fn releases_url(remote_url: &str) -> Option<String> {
    let url = remote_url.trim();
    if url.is_empty() {
        return None;
    }
    let url = url.strip_suffix(".git").unwrap_or(url);

    let base = if let Some((host, path)) = url
        .strip_prefix("git@")
        .and_then(|rest| rest.split_once(':'))
    {
        format!("https://{host}/{path}")
    } else if let Some(rest) = url.strip_prefix("ssh://git@") {
        format!("https://{rest}")
    } else {
        url.to_string()
    };

    Some(format!("{}/releases", base.trim_end_matches('/')))
}

/// Run a read-only git command and return its stdout.
fn git(args: &[&str]) -> GitResult<String> {
    let command = ExternalCommand::new("git").args(args.iter().copied());
    match Shell::default().query(&command) {
        Ok(stdout) => Ok(stdout),
        Err(ShellError::Failed { stderr, .. }) => {
            // Detect "not a git repo" specifically
            if stderr.contains("not a git repository") {
                return Err(GitError::NotARepo);
            }
            Err(GitError::Command {
                command: args.first().unwrap_or(&"").to_string(),
                stderr,
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::RunMode;

    fn dry_git() -> SystemGit {
        SystemGit::new(Shell::new(RunMode::DryRun), "origin")
    }

    #[test]
    fn dry_run_commit_is_quoted() {
        let exec = dry_git().commit("Version 1.0.1").unwrap();
        assert_eq!(
            exec,
            Execution::Printed("git commit -m 'Version 1.0.1'".into())
        );
    }

    #[test]
    fn dry_run_stage_lists_paths() {
        let exec = dry_git().stage(&["package.json", "CHANGELOG.md"]).unwrap();
        assert_eq!(
            exec,
            Execution::Printed("git add package.json CHANGELOG.md".into())
        );
    }

    #[test]
    fn dry_run_tag_is_annotated() {
        let Execution::Printed(line) = dry_git().tag("1.0.1", "* fix bug").unwrap() else {
            panic!("expected a printed command");
        };
        assert_eq!(line, "git tag -a 1.0.1 -m '* fix bug'");
    }

    #[test]
    fn dry_run_push_commands() {
        assert_eq!(
            dry_git().push().unwrap(),
            Execution::Printed("git push".into())
        );
        assert_eq!(
            dry_git().push_tags().unwrap(),
            Execution::Printed("git push --tags".into())
        );
    }

    // These work both inside and outside a git checkout.

    #[test]
    fn toplevel_is_absolute_when_inside_repo() {
        if let Ok(root) = dry_git().toplevel() {
            assert!(root.is_absolute());
        }
    }

    #[test]
    fn status_short_works_in_repo() {
        if dry_git().toplevel().is_ok() {
            assert!(dry_git().status_short().is_ok());
        }
    }

    #[test]
    fn remote_url_for_missing_remote_is_none() {
        if dry_git().toplevel().is_ok() {
            let git = SystemGit::new(Shell::default(), "relbump-no-such-remote");
            assert_eq!(git.remote_url().unwrap(), None);
        }
    }

    #[test]
    fn git_error_on_bad_command() {
        let result = git(&["not-a-real-subcommand"]);
        assert!(result.is_err());
    }

    #[test]
    fn releases_url_https() {
        assert_eq!(
            releases_url("https://github.com/acme/widget.git").as_deref(),
            Some("https://github.com/acme/widget/releases")
        );
    }

    #[test]
    fn releases_url_https_no_suffix() {
        assert_eq!(
            releases_url("https://github.com/acme/widget\n").as_deref(),
            Some("https://github.com/acme/widget/releases")
        );
    }

    #[test]
    fn releases_url_scp_style_ssh() {
        assert_eq!(
            releases_url("git@github.com:acme/widget.git").as_deref(),
            Some("https://github.com/acme/widget/releases")
        );
    }

    #[test]
    fn releases_url_ssh_scheme() {
        assert_eq!(
            releases_url("ssh://git@gitlab.example.com/acme/widget.git").as_deref(),
            Some("https://gitlab.example.com/acme/widget/releases")
        );
    }

    #[test]
    fn releases_url_empty() {
        assert!(releases_url("").is_none());
        assert!(releases_url("   ").is_none());
    }
}
