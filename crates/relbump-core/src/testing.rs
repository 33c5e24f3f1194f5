//! In-memory collaborators for workflow tests.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use crate::changelog::ChangelogTool;
use crate::git::{GitError, GitResult, SourceControl};
use crate::package::{ManifestError, ManifestResult, PackageRegistry, VersionStore};
use crate::shell::{Execution, ShellError, ShellResult};
use crate::version::ReleaseVersion;
use crate::workflow::Tools;

pub const CHANGELOG: &str = "\
1.0.1 / 2024-05-02
==================

  * Fix crash on empty input

1.0.0 / 2024-04-20
==================

  * Initial release
";

/// A fake project rooted in a temporary directory.
///
/// Implements every collaborator trait and records the calls it receives in
/// order, so one log shows the whole run.
pub struct FakeProject {
    dir: TempDir,
    pub has_root: bool,
    pub current: Option<String>,
    pub status_short: String,
    pub remote: Option<String>,
    pub changelog_fails: bool,
    pub push_fails: bool,
    pub dry_run: bool,
    calls: RefCell<Vec<String>>,
    tag_messages: RefCell<Vec<String>>,
}

impl FakeProject {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("CHANGELOG.md"), CHANGELOG).unwrap();
        Self {
            dir,
            has_root: true,
            current: Some("1.0.0".into()),
            status_short: String::new(),
            remote: Some("git@github.com:acme/widget.git".into()),
            changelog_fails: false,
            push_fails: false,
            dry_run: false,
            calls: RefCell::new(Vec::new()),
            tag_messages: RefCell::new(Vec::new()),
        }
    }

    pub fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::try_from(self.dir.path().canonicalize().unwrap()).unwrap()
    }

    pub fn tools(&self) -> Tools<'_> {
        Tools {
            versions: self,
            scm: self,
            changelog: self,
            registry: self,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn tag_messages(&self) -> Vec<String> {
        self.tag_messages.borrow().clone()
    }

    fn record(&self, call: impl Into<String>) -> Execution {
        let call = call.into();
        self.calls.borrow_mut().push(call.clone());
        if self.dry_run {
            Execution::Printed(call)
        } else {
            Execution::Ran
        }
    }
}

impl VersionStore for FakeProject {
    fn read_version(&self) -> ManifestResult<String> {
        self.current
            .clone()
            .ok_or_else(|| ManifestError::VersionNotFound {
                path: "package.json".into(),
                reason: "no \"version\" field".into(),
            })
    }

    fn write_version(&self, version: &ReleaseVersion) -> ShellResult<Execution> {
        Ok(self.record(format!("version-set {version}")))
    }
}

impl ChangelogTool for FakeProject {
    fn generate(&self, version: &ReleaseVersion) -> ShellResult<Execution> {
        let exec = self.record(format!("changelog {version}"));
        if self.changelog_fails {
            return Err(ShellError::Failed {
                command: "git changelog".into(),
                status: "exit status: 1".into(),
                stderr: String::new(),
            });
        }
        Ok(exec)
    }
}

impl PackageRegistry for FakeProject {
    fn publish(&self) -> ShellResult<Execution> {
        Ok(self.record("publish"))
    }
}

impl SourceControl for FakeProject {
    fn toplevel(&self) -> GitResult<Utf8PathBuf> {
        if self.has_root {
            Ok(self.root())
        } else {
            Err(GitError::NotARepo)
        }
    }

    fn status(&self) -> GitResult<String> {
        self.record("git status");
        Ok(" M package.json\n".into())
    }

    fn status_short(&self) -> GitResult<String> {
        Ok(self.status_short.clone())
    }

    fn stage(&self, paths: &[&str]) -> GitResult<Execution> {
        Ok(self.record(format!("git add {}", paths.join(" "))))
    }

    fn commit(&self, message: &str) -> GitResult<Execution> {
        Ok(self.record(format!("git commit {message}")))
    }

    fn tag(&self, name: &str, message: &str) -> GitResult<Execution> {
        self.tag_messages.borrow_mut().push(message.to_owned());
        Ok(self.record(format!("git tag {name}")))
    }

    fn push(&self) -> GitResult<Execution> {
        let exec = self.record("git push");
        if self.push_fails {
            return Err(GitError::Shell(ShellError::Failed {
                command: "git push".into(),
                status: "exit status: 128".into(),
                stderr: String::new(),
            }));
        }
        Ok(exec)
    }

    fn push_tags(&self) -> GitResult<Execution> {
        Ok(self.record("git push --tags"))
    }

    fn remote_url(&self) -> GitResult<Option<String>> {
        Ok(self.remote.clone())
    }
}
