//! Tool detection on `PATH`.
//!
//! The release workflows refuse to start when a configured external tool is
//! missing, rather than failing halfway through a release.

use thiserror::Error;
use tracing::{debug, instrument};

use crate::shell::CommandTemplate;

/// Errors from dependency detection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    /// A required program is not on `PATH`.
    #[error("missing dependency `{tool}`: {hint}")]
    MissingDependency {
        /// The program that was probed.
        tool: String,
        /// How to install it.
        hint: String,
    },
}

/// Result alias for detection.
pub type DetectResult<T> = Result<T, DetectError>;

/// Git subcommands built into git itself. Anything else (`git changelog`)
/// is an external `git-<name>` program.
const GIT_BUILTINS: &[&str] = &[
    "add", "am", "archive", "bisect", "branch", "checkout", "cherry-pick", "clone", "commit",
    "describe", "diff", "fetch", "grep", "init", "log", "merge", "mv", "pull", "push", "rebase",
    "reset", "restore", "rm", "shortlog", "show", "stash", "status", "switch", "tag",
];

/// Check whether a binary is available on `PATH`.
pub fn has_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// The program that must exist for `template` to run.
///
/// `git <sub>` and `cargo <sub>` dispatch to `git-<sub>` / `cargo-<sub>`
/// unless the subcommand is built in.
pub fn required_binary(template: &CommandTemplate) -> String {
    let command = template.to_command();
    let program = command.program();
    let sub = command.arguments().first().map(String::as_str);

    match (program, sub) {
        ("git", Some(sub)) if !sub.starts_with('-') && !GIT_BUILTINS.contains(&sub) => {
            format!("git-{sub}")
        }
        ("cargo", Some(sub)) if !sub.starts_with('-') && !sub.starts_with('+') => {
            if ["build", "check", "publish", "test", "run", "package"].contains(&sub) {
                program.to_string()
            } else {
                format!("cargo-{sub}")
            }
        }
        _ => program.to_string(),
    }
}

/// Verify that every template's program is installed.
#[instrument(skip_all)]
pub fn check_dependencies(templates: &[&CommandTemplate]) -> DetectResult<()> {
    for template in templates {
        let tool = required_binary(template);
        if has_binary(&tool) {
            debug!(%tool, "found dependency");
        } else {
            return Err(DetectError::MissingDependency {
                hint: install_hint(&tool),
                tool,
            });
        }
    }
    Ok(())
}

fn install_hint(tool: &str) -> String {
    match tool {
        "git-changelog" => "install git-extras (https://github.com/tj/git-extras)".into(),
        "git" => "install git (https://git-scm.com/downloads)".into(),
        "npm" | "npx" => "install Node.js (https://nodejs.org)".into(),
        other => format!("install `{other}` and make sure it is on PATH"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(s: &str) -> CommandTemplate {
        CommandTemplate::parse(s).unwrap()
    }

    #[test]
    fn git_extras_subcommand_needs_its_own_binary() {
        assert_eq!(
            required_binary(&template("git changelog --tag {version}")),
            "git-changelog"
        );
    }

    #[test]
    fn git_builtin_needs_only_git() {
        assert_eq!(required_binary(&template("git log --oneline")), "git");
        assert_eq!(required_binary(&template("git --version")), "git");
    }

    #[test]
    fn cargo_subcommands() {
        assert_eq!(required_binary(&template("cargo publish")), "cargo");
        assert_eq!(
            required_binary(&template("cargo set-version {version}")),
            "cargo-set-version"
        );
    }

    #[test]
    fn plain_program() {
        assert_eq!(required_binary(&template("npm publish")), "npm");
        assert_eq!(required_binary(&template("true")), "true");
    }

    #[test]
    fn missing_tool_reports_hint() {
        let t = template("relbump-definitely-missing-tool --flag");
        let err = check_dependencies(&[&t]).unwrap_err();
        let DetectError::MissingDependency { tool, hint } = err;
        assert_eq!(tool, "relbump-definitely-missing-tool");
        assert!(hint.contains("PATH"));
    }

    #[test]
    fn git_changelog_hint_points_at_git_extras() {
        assert!(install_hint("git-changelog").contains("git-extras"));
    }

    #[test]
    fn empty_list_passes() {
        assert!(check_dependencies(&[]).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn present_tool_passes() {
        let t = template("sh -c true");
        assert!(check_dependencies(&[&t]).is_ok());
    }
}
