//! `--current`: print the manifest version.

use anyhow::Context;
use tracing::{debug, instrument};

use relbump_core::config::Config;
use relbump_core::package;

/// Print the version recorded in the manifest, and nothing else.
#[instrument(name = "cmd_current", skip_all)]
pub fn cmd_current(
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    let manifest = super::project_root_or_cwd(cwd).join(config.manifest_path());
    debug!(%manifest, "reading current version");

    let version =
        package::read_manifest_version(&manifest).context("failed to read current version")?;

    if global_json {
        println!("{}", serde_json::json!({ "version": version }));
    } else {
        println!("{version}");
    }
    Ok(())
}
