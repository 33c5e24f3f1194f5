//! `--notes`: print one version's changelog entry.
//!
//! Output is the raw section text so it can be piped into
//! `git tag -a <version> -F -`.

use anyhow::{Context, bail};
use tracing::{debug, instrument};

use relbump_core::ReleaseVersion;
use relbump_core::changelog;
use relbump_core::config::Config;

/// Print the changelog section for `version`.
#[instrument(name = "cmd_notes", skip_all, fields(%version))]
pub fn cmd_notes(
    version: &ReleaseVersion,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    let path = super::project_root_or_cwd(cwd).join(config.changelog_path());
    debug!(%path, "reading changelog");

    let section = changelog::read_section(&path, version.as_str())
        .with_context(|| format!("failed to read {path}"))?;

    if section.trim().is_empty() {
        bail!("no changelog entry for {version} in {path}");
    }

    if global_json {
        let json = serde_json::json!({ "version": version, "notes": section });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{section}");
    }
    Ok(())
}
