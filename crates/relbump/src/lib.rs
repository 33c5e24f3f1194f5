//! Library interface for the `relbump` CLI.
//!
//! Exposes the argument parser as a library, primarily for documentation
//! generation and testing. The actual entry point is in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Action`] - What a parsed command line asks for
//! - [`CurrentRequest`] - `--current` recovered from a command line clap rejects
//! - [`commands`] - Command implementations
//!
//! The [`command()`] function returns the clap `Command` for generating man
//! pages and shell completions via `xtask`.

pub mod commands;

use clap::{ArgGroup, CommandFactory, Parser};
use relbump_core::ReleaseVersion;
use relbump_core::version;
use std::ffi::OsString;
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
EXAMPLES:
    relbump -v 1.4.0                 Bump to 1.4.0 and regenerate the changelog
    relbump -v 1.4.0 -p              Bump, commit, tag, push and publish
    relbump -p                       Publish the version already in the manifest
    relbump -v 1.4.0 -p -d           Print every command instead of running it
    relbump -c                       Print the current version

ENVIRONMENT VARIABLES:
    RUST_LOG                Log filter (e.g., debug, relbump_core=trace)
    RELBUMP_LOG_PATH        Explicit log file path
    RELBUMP_LOG_DIR         Log directory
";

/// Command-line interface definition for relbump.
#[derive(Parser, Debug)]
#[command(name = "relbump")]
#[command(
    about = "Bump the version, regenerate the changelog, tag and publish",
    long_about = None
)]
#[command(disable_version_flag = true)]
#[command(after_long_help = ENV_HELP)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .multiple(true)
        .args(["new_version", "publish", "current", "notes"])
))]
pub struct Cli {
    /// Version to release (e.g. 1.2.3 or 1.2.3-rc1)
    #[arg(short = 'v', long = "version", value_name = "VERSION", value_parser = version::validate)]
    pub new_version: Option<ReleaseVersion>,

    /// Commit, tag, push and publish after bumping
    #[arg(short, long)]
    pub publish: bool,

    /// Print the current version from the manifest and exit
    #[arg(short, long)]
    pub current: bool,

    /// Print mutating commands instead of running them
    #[arg(short, long)]
    pub dry_run: bool,

    /// Print the changelog entry for VERSION and exit
    #[arg(short, long, value_name = "VERSION", value_parser = version::validate)]
    pub notes: Option<ReleaseVersion>,

    /// Path to configuration file (overrides discovery)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long)]
    pub chdir: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// More log detail (repeatable)
    #[arg(long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long)]
    pub json: bool,
}

/// What a parsed command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print the manifest version.
    Current,
    /// Print the changelog entry for a version.
    Notes(ReleaseVersion),
    /// Bump and/or publish.
    Release,
}

impl Cli {
    /// Resolve the action; `--current` wins over everything else.
    pub fn action(&self) -> Action {
        if self.current {
            Action::Current
        } else if let Some(ref v) = self.notes {
            Action::Notes(v.clone())
        } else {
            Action::Release
        }
    }
}

/// A `--current` request found in a command line that clap rejected.
///
/// `--current` prints the manifest version no matter what else is on the
/// command line, so an unknown flag or an invalid `--version` next to it must
/// not turn into a usage error. Only the options that affect where the
/// version is read from (and how it is printed) are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentRequest {
    /// `-C/--chdir`.
    pub chdir: Option<PathBuf>,
    /// `--config`.
    pub config: Option<PathBuf>,
    /// `--json`.
    pub json: bool,
}

/// Short flags that take no value and may be bundled (`-dc`).
const BUNDLED_FLAGS: &str = "cdpq";

impl CurrentRequest {
    /// Scan raw arguments (program name first) for `-c/--current`.
    ///
    /// Returns `None` when `--current` is absent.
    pub fn scan<I, S>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into).skip(1);
        let mut request = Self::default();
        let mut current = false;

        while let Some(arg) = args.next() {
            let Some(text) = arg.to_str() else {
                continue;
            };
            match text {
                "--" => break,
                "-c" | "--current" => current = true,
                "--json" => request.json = true,
                "-C" | "--chdir" => request.chdir = args.next().map(PathBuf::from),
                "--config" => request.config = args.next().map(PathBuf::from),
                // value belongs to the option, not a flag
                "-v" | "--version" | "-n" | "--notes" | "--color" => {
                    let _ = args.next();
                }
                _ => {
                    if let Some(dir) = text.strip_prefix("--chdir=") {
                        request.chdir = Some(PathBuf::from(dir));
                    } else if let Some(file) = text.strip_prefix("--config=") {
                        request.config = Some(PathBuf::from(file));
                    } else if let Some(dir) = text.strip_prefix("-C") {
                        request.chdir = Some(PathBuf::from(dir));
                    } else if let Some(cluster) = text.strip_prefix('-')
                        && !cluster.starts_with('-')
                        && cluster.contains('c')
                        && cluster.chars().all(|ch| BUNDLED_FLAGS.contains(ch))
                    {
                        current = true;
                    }
                }
            }
        }

        current.then_some(request)
    }
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("relbump").chain(args.iter().copied()))
    }

    #[test]
    fn command_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn version_and_publish_together() {
        let cli = parse(&["-v", "1.2.3", "-p", "-d"]).unwrap();
        assert_eq!(cli.new_version.unwrap().as_str(), "1.2.3");
        assert!(cli.publish && cli.dry_run);
    }

    #[test]
    fn invalid_version_is_rejected() {
        let err = parse(&["-v", "abc"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn some_action_is_required() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
        assert!(parse(&["-d"]).is_err());
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = parse(&["--frobnicate"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn current_wins() {
        let cli = parse(&["-c", "-v", "1.0.0", "-p"]).unwrap();
        assert_eq!(cli.action(), Action::Current);
    }

    #[test]
    fn notes_action() {
        let cli = parse(&["--notes", "1.0.1"]).unwrap();
        assert_eq!(
            cli.action(),
            Action::Notes(version::validate("1.0.1").unwrap())
        );
    }

    #[test]
    fn publish_alone_is_a_release() {
        assert_eq!(parse(&["-p"]).unwrap().action(), Action::Release);
    }

    fn scan(args: &[&str]) -> Option<CurrentRequest> {
        CurrentRequest::scan(std::iter::once("relbump").chain(args.iter().copied()))
    }

    #[test]
    fn scan_without_current_is_none() {
        assert_eq!(scan(&["-v", "1.0.0", "--frobnicate"]), None);
        assert_eq!(scan(&[]), None);
    }

    #[test]
    fn scan_finds_current_next_to_bad_arguments() {
        let request = scan(&["-C", "/tmp/app", "-c", "-v", "abc", "--frobnicate"]).unwrap();
        assert_eq!(request.chdir, Some(PathBuf::from("/tmp/app")));
        assert!(!request.json);
    }

    #[test]
    fn scan_keeps_config_and_json() {
        let request = scan(&["--current", "--config=relbump.toml", "--json", "-x"]).unwrap();
        assert_eq!(request.config, Some(PathBuf::from("relbump.toml")));
        assert!(request.json);
    }

    #[test]
    fn scan_reads_bundled_and_attached_short_flags() {
        let request = scan(&["-dc", "-C/srv/app"]).unwrap();
        assert_eq!(request.chdir, Some(PathBuf::from("/srv/app")));
    }

    #[test]
    fn scan_does_not_mistake_option_values_for_current() {
        assert_eq!(scan(&["--notes", "-c"]), None);
        assert_eq!(scan(&["--", "-c"]), None);
        assert_eq!(scan(&["--color", "auto"]), None);
    }

    #[test]
    fn verbose_counts() {
        let cli = parse(&["-c", "--verbose", "--verbose"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
