//! External command execution with a dry-run mode.
//!
//! Every command that changes something (the manifest, the changelog, git
//! history, the registry) goes through [`Shell::run`]. In
//! [`RunMode::DryRun`] nothing is spawned: the command line is rendered with
//! POSIX shell quoting and handed back as [`Execution::Printed`], so the
//! caller can show a line the user could paste into a terminal.
//!
//! Read-only queries use [`Shell::query`], which always executes.

use std::fmt;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, instrument};

/// Placeholder substituted in command templates.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Errors from running external commands.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The program could not be spawned (missing binary, permissions, ...).
    #[error("failed to run `{command}`: {source}")]
    Exec {
        /// The rendered command line.
        command: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("`{command}` failed ({status}){}", stderr_suffix(.stderr))]
    Failed {
        /// The rendered command line.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured stderr (empty when the child inherited the terminal).
        stderr: String,
    },

    /// A configured command template could not be parsed.
    #[error("invalid command template {template:?}: {reason}")]
    Template {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Result alias for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// Whether mutating commands run or are only printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Spawn commands.
    #[default]
    Execute,
    /// Render commands for display instead of spawning them.
    DryRun,
}

/// What happened to a mutating command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    /// The command ran and exited successfully.
    Ran,
    /// Dry run: the quoted command line that would have run.
    Printed(String),
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalCommand {
    /// Start a command for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument list.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Render as a single shell-quoted line.
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_process(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_line())
    }
}

/// Quote a word for POSIX shells, leaving safe words untouched.
fn quote(word: &str) -> String {
    // try_quote only refuses interior NUL bytes, which cannot reach argv anyway
    shlex::try_quote(word).map_or_else(|_| format!("{word:?}"), |q| q.into_owned())
}

/// A configured command line such as `npm version {version} --no-git-tag-version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    source: String,
    words: Vec<String>,
}

impl CommandTemplate {
    /// Split a template with shell word rules.
    pub fn parse(template: &str) -> ShellResult<Self> {
        let words = shlex::split(template).ok_or_else(|| ShellError::Template {
            template: template.to_owned(),
            reason: "unbalanced quotes or trailing escape",
        })?;
        if words.is_empty() {
            return Err(ShellError::Template {
                template: template.to_owned(),
                reason: "empty command",
            });
        }
        Ok(Self {
            source: template.to_owned(),
            words,
        })
    }

    /// The template as written in configuration.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Build the command, substituting `{version}` in every word.
    pub fn render(&self, version: &str) -> ExternalCommand {
        let mut words = self
            .words
            .iter()
            .map(|w| w.replace(VERSION_PLACEHOLDER, version));
        // parse() guarantees at least one word
        let program = words.next().unwrap_or_default();
        ExternalCommand::new(program).args(words)
    }

    /// Build the command without substitution.
    pub fn to_command(&self) -> ExternalCommand {
        let (program, args) = self
            .words
            .split_first()
            .map_or((String::new(), &[][..]), |(p, a)| (p.clone(), a));
        ExternalCommand::new(program).args(args.iter().cloned())
    }
}

/// Runs external commands according to a fixed [`RunMode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Shell {
    mode: RunMode,
}

impl Shell {
    /// Create a shell with the given mode. The mode never changes afterwards.
    pub const fn new(mode: RunMode) -> Self {
        Self { mode }
    }

    /// The mode this shell was created with.
    pub const fn mode(&self) -> RunMode {
        self.mode
    }

    /// Whether mutating commands are only printed.
    pub const fn is_dry_run(&self) -> bool {
        matches!(self.mode, RunMode::DryRun)
    }

    /// Run a mutating command, or render it in dry-run mode.
    ///
    /// The child inherits the terminal so prompts (registry OTP, editors)
    /// keep working.
    #[instrument(skip_all, fields(command = %command))]
    pub fn run(&self, command: &ExternalCommand) -> ShellResult<Execution> {
        if self.is_dry_run() {
            debug!("dry run, not executing");
            return Ok(Execution::Printed(command.display_line()));
        }

        let status = command
            .to_process()
            .status()
            .map_err(|source| ShellError::Exec {
                command: command.display_line(),
                source,
            })?;

        if status.success() {
            debug!("command succeeded");
            Ok(Execution::Ran)
        } else {
            Err(ShellError::Failed {
                command: command.display_line(),
                status: status.to_string(),
                stderr: String::new(),
            })
        }
    }

    /// Run a read-only command and capture its stdout. Runs in every mode.
    #[instrument(skip_all, fields(command = %command))]
    pub fn query(&self, command: &ExternalCommand) -> ShellResult<String> {
        let output = command
            .to_process()
            .output()
            .map_err(|source| ShellError::Exec {
                command: command.display_line(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(ShellError::Failed {
                command: command.display_line(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_line_leaves_plain_words_alone() {
        let cmd = ExternalCommand::new("git").args(["push", "--tags"]);
        assert_eq!(cmd.display_line(), "git push --tags");
    }

    #[test]
    fn display_line_quotes_words_with_spaces() {
        let cmd = ExternalCommand::new("git").args(["commit", "-m", "Version 1.0.1"]);
        assert_eq!(cmd.display_line(), "git commit -m 'Version 1.0.1'");
    }

    #[test]
    fn display_line_round_trips_through_shell_splitting() {
        let message = "* it's fixed, \"quoted\" $HOME";
        let cmd = ExternalCommand::new("git").args(["tag", "-a", "1.0.1", "-m", message]);
        let words = shlex::split(&cmd.display_line()).unwrap();
        assert_eq!(words, ["git", "tag", "-a", "1.0.1", "-m", message]);
    }

    #[test]
    fn dry_run_prints_instead_of_running() {
        let shell = Shell::new(RunMode::DryRun);
        let cmd = ExternalCommand::new("definitely-not-a-real-binary").arg("a b");
        let result = shell.run(&cmd).unwrap();
        assert_eq!(
            result,
            Execution::Printed("definitely-not-a-real-binary 'a b'".into())
        );
    }

    #[test]
    fn execute_reports_missing_binary() {
        let shell = Shell::new(RunMode::Execute);
        let cmd = ExternalCommand::new("definitely-not-a-real-binary");
        assert!(matches!(shell.run(&cmd), Err(ShellError::Exec { .. })));
    }

    #[test]
    fn shell_mode_is_fixed() {
        assert!(Shell::new(RunMode::DryRun).is_dry_run());
        assert!(!Shell::default().is_dry_run());
        assert_eq!(Shell::default().mode(), RunMode::Execute);
    }

    #[test]
    fn template_substitutes_version() {
        let template = CommandTemplate::parse("npm version {version} --no-git-tag-version").unwrap();
        let cmd = template.render("1.2.3");
        assert_eq!(cmd.program(), "npm");
        assert_eq!(cmd.arguments(), ["version", "1.2.3", "--no-git-tag-version"]);
    }

    #[test]
    fn template_substitutes_inside_words() {
        let template = CommandTemplate::parse("tool --tag=v{version}").unwrap();
        assert_eq!(template.render("2.0.0").arguments(), ["--tag=v2.0.0"]);
    }

    #[test]
    fn template_honors_quotes() {
        let template = CommandTemplate::parse("sh -c 'echo {version}'").unwrap();
        assert_eq!(template.render("1.0.0").arguments(), ["-c", "echo 1.0.0"]);
    }

    #[test]
    fn template_without_substitution() {
        let template = CommandTemplate::parse("npm publish --access public").unwrap();
        let cmd = template.to_command();
        assert_eq!(cmd.display_line(), "npm publish --access public");
        assert_eq!(template.source(), "npm publish --access public");
    }

    #[test]
    fn template_rejects_empty_and_unbalanced() {
        assert!(matches!(
            CommandTemplate::parse("   "),
            Err(ShellError::Template { .. })
        ));
        assert!(matches!(
            CommandTemplate::parse("echo 'oops"),
            Err(ShellError::Template { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn query_captures_stdout() {
        let shell = Shell::new(RunMode::DryRun);
        let out = shell
            .query(&ExternalCommand::new("echo").arg("hello"))
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn failed_command_is_an_error() {
        let shell = Shell::new(RunMode::Execute);
        assert!(matches!(
            shell.run(&ExternalCommand::new("false")),
            Err(ShellError::Failed { .. })
        ));
    }
}
