//! Changelog generation and per-version section extraction.
//!
//! The changelog is owned by an external generator (git-extras'
//! `git changelog` by default); relbump never writes it. It only reads the
//! file back to slice out one version's entry, for annotated tag messages
//! and for `relbump --notes`.
//!
//! Expected layout:
//!
//! ```text
//! 1.0.1 / 2024-05-02
//! ==================
//!
//!   * Fix crash on empty input
//!
//! 1.0.0 / 2024-04-20
//! ==================
//! ```

use camino::Utf8Path;
use tracing::{debug, instrument};

use crate::shell::{CommandTemplate, Execution, Shell, ShellResult};
use crate::version::ReleaseVersion;

/// Generates or refreshes the changelog for a release.
pub trait ChangelogTool {
    /// Regenerate the changelog with an entry for `version`.
    fn generate(&self, version: &ReleaseVersion) -> ShellResult<Execution>;
}

/// [`ChangelogTool`] that runs a configured command template.
#[derive(Debug, Clone)]
pub struct CommandChangelog {
    shell: Shell,
    template: CommandTemplate,
}

impl CommandChangelog {
    /// Wrap a command template such as `git changelog --tag {version}`.
    pub const fn new(shell: Shell, template: CommandTemplate) -> Self {
        Self { shell, template }
    }
}

impl ChangelogTool for CommandChangelog {
    fn generate(&self, version: &ReleaseVersion) -> ShellResult<Execution> {
        self.shell.run(&self.template.render(version.as_str()))
    }
}

/// Extract the entry for `version` from changelog text.
///
/// Starts after the first line beginning with `version` (followed by
/// nothing or a non-version character, so `1.0.1` does not match a
/// `1.0.10` heading) and stops before the next line starting with a digit.
/// Blank lines and `===` underline rows are dropped. Returns an empty string
/// when there is no such heading.
pub fn extract_section(text: &str, version: &str) -> String {
    let mut lines = text.lines();
    if lines.find(|line| is_heading_for(line, version)).is_none() {
        return String::new();
    }

    lines
        .take_while(|line| !line.starts_with(|c: char| c.is_ascii_digit()))
        .filter(|line| !is_blank_or_underline(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read `path` and extract the entry for `version`.
#[instrument]
pub fn read_section(path: &Utf8Path, version: &str) -> std::io::Result<String> {
    let text = std::fs::read_to_string(path)?;
    let section = extract_section(&text, version);
    debug!(lines = section.lines().count(), "extracted changelog section");
    Ok(section)
}

fn is_heading_for(line: &str, version: &str) -> bool {
    if version.is_empty() {
        return false;
    }
    line.strip_prefix(version).is_some_and(|rest| {
        !rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    })
}

fn is_blank_or_underline(line: &str) -> bool {
    line.trim().chars().all(|c| c == '=')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::RunMode;
    use crate::version::validate;
    use tempfile::TempDir;

    const CHANGELOG: &str = "\
1.1.0 / 2024-06-01
==================

  * Add --json output
  * Speed up startup

1.0.10 / 2024-05-20
===================

  * Ten

1.0.1 / 2024-05-02
==================

  * Fix crash on empty input

1.0.0 / 2024-04-20
==================

  * Initial release
";

    #[test]
    fn extracts_middle_section() {
        assert_eq!(
            extract_section(CHANGELOG, "1.0.1"),
            "  * Fix crash on empty input"
        );
    }

    #[test]
    fn extracts_first_section_with_multiple_lines() {
        assert_eq!(
            extract_section(CHANGELOG, "1.1.0"),
            "  * Add --json output\n  * Speed up startup"
        );
    }

    #[test]
    fn extracts_last_section_to_end_of_file() {
        assert_eq!(extract_section(CHANGELOG, "1.0.0"), "  * Initial release");
    }

    #[test]
    fn version_prefix_does_not_match_longer_heading() {
        assert_eq!(extract_section(CHANGELOG, "1.0.10"), "  * Ten");
        assert_eq!(extract_section("1.0.10\n  * Ten\n", "1.0.1"), "");
    }

    #[test]
    fn missing_version_is_empty() {
        assert_eq!(extract_section(CHANGELOG, "9.9.9"), "");
        assert_eq!(extract_section("", "1.0.0"), "");
        assert_eq!(extract_section(CHANGELOG, ""), "");
    }

    #[test]
    fn bare_heading_without_date() {
        let text = "2.0.0\n=====\n\n* Breaking\n\n* Change\n1.0.0\n";
        assert_eq!(extract_section(text, "2.0.0"), "* Breaking\n* Change");
    }

    #[test]
    fn whitespace_only_lines_are_dropped() {
        let text = "1.0.0\n   \n\t\n* one\n";
        assert_eq!(extract_section(text, "1.0.0"), "* one");
    }

    #[test]
    fn read_section_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("CHANGELOG.md");
        std::fs::write(&path, CHANGELOG).unwrap();
        let path = camino::Utf8PathBuf::try_from(path).unwrap();

        assert_eq!(
            read_section(&path, "1.0.0").unwrap(),
            "  * Initial release"
        );
    }

    #[test]
    fn read_section_missing_file_is_an_error() {
        assert!(read_section(Utf8Path::new("/nonexistent/CHANGELOG.md"), "1.0.0").is_err());
    }

    #[test]
    fn command_changelog_renders_version() {
        let template = CommandTemplate::parse("git changelog --tag {version}").unwrap();
        let tool = CommandChangelog::new(Shell::new(RunMode::DryRun), template);
        let exec = tool.generate(&validate("1.0.1").unwrap()).unwrap();
        assert_eq!(
            exec,
            Execution::Printed("git changelog --tag 1.0.1".into())
        );
    }
}
