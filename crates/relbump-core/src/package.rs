//! Package manifest and registry access.
//!
//! The current version is read straight from the manifest's top-level
//! `"version"` field. Writing the version and publishing are delegated to the
//! package manager so its own bookkeeping (lockfiles, lifecycle scripts)
//! stays intact.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::shell::{CommandTemplate, Execution, Shell, ShellResult};
use crate::version::ReleaseVersion;

/// Errors from reading the package manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest is missing, unreadable, or has no string `"version"`.
    #[error("could not find the current version in {path}: {reason}")]
    VersionNotFound {
        /// The manifest path.
        path: Utf8PathBuf,
        /// What went wrong.
        reason: String,
    },
}

/// Result alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Reads and writes the project's version.
pub trait VersionStore {
    /// The version currently recorded in the manifest.
    fn read_version(&self) -> ManifestResult<String>;

    /// Record `version` in the manifest without creating a commit or tag.
    fn write_version(&self, version: &ReleaseVersion) -> ShellResult<Execution>;
}

/// Publishes the package.
pub trait PackageRegistry {
    /// Upload the package at its current version.
    fn publish(&self) -> ShellResult<Execution>;
}

/// Process-backed [`VersionStore`] and [`PackageRegistry`] (npm by default).
#[derive(Debug, Clone)]
pub struct PackageManager {
    shell: Shell,
    manifest: Utf8PathBuf,
    version_set: CommandTemplate,
    publish: CommandTemplate,
}

impl PackageManager {
    /// Create a package manager for `manifest`, using the given templates.
    pub fn new(
        shell: Shell,
        manifest: impl Into<Utf8PathBuf>,
        version_set: CommandTemplate,
        publish: CommandTemplate,
    ) -> Self {
        Self {
            shell,
            manifest: manifest.into(),
            version_set,
            publish,
        }
    }

    /// The manifest this package manager reads.
    pub fn manifest(&self) -> &Utf8Path {
        &self.manifest
    }
}

impl VersionStore for PackageManager {
    fn read_version(&self) -> ManifestResult<String> {
        read_manifest_version(&self.manifest)
    }

    fn write_version(&self, version: &ReleaseVersion) -> ShellResult<Execution> {
        self.shell.run(&self.version_set.render(version.as_str()))
    }
}

impl PackageRegistry for PackageManager {
    fn publish(&self) -> ShellResult<Execution> {
        self.shell.run(&self.publish.to_command())
    }
}

/// Read the top-level `"version"` string from a JSON manifest.
#[instrument]
pub fn read_manifest_version(path: &Utf8Path) -> ManifestResult<String> {
    let not_found = |reason: String| ManifestError::VersionNotFound {
        path: path.to_path_buf(),
        reason,
    };

    let text = std::fs::read_to_string(path).map_err(|e| not_found(e.to_string()))?;
    let manifest: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| not_found(format!("invalid JSON: {e}")))?;

    let version = manifest
        .get("version")
        .and_then(serde_json::Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| not_found("no \"version\" field".into()))?;

    debug!(version, "read manifest version");
    Ok(version.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::RunMode;
    use crate::version::validate;
    use std::fs;
    use tempfile::TempDir;

    fn manifest_in(tmp: &TempDir, contents: &str) -> Utf8PathBuf {
        let path = tmp.path().join("package.json");
        fs::write(&path, contents).unwrap();
        Utf8PathBuf::try_from(path).unwrap()
    }

    fn npm(shell: Shell, manifest: Utf8PathBuf) -> PackageManager {
        PackageManager::new(
            shell,
            manifest,
            CommandTemplate::parse("npm version {version} --no-git-tag-version").unwrap(),
            CommandTemplate::parse("npm publish").unwrap(),
        )
    }

    #[test]
    fn reads_version_field() {
        let tmp = TempDir::new().unwrap();
        let path = manifest_in(&tmp, r#"{"name": "widget", "version": "1.4.2"}"#);
        assert_eq!(read_manifest_version(&path).unwrap(), "1.4.2");
    }

    #[test]
    fn ignores_nested_version_fields() {
        let tmp = TempDir::new().unwrap();
        let path = manifest_in(
            &tmp,
            r#"{"name": "widget", "engines": {"version": "9.9.9"}}"#,
        );
        assert!(matches!(
            read_manifest_version(&path),
            Err(ManifestError::VersionNotFound { .. })
        ));
    }

    #[test]
    fn missing_file_is_version_not_found() {
        let err = read_manifest_version(Utf8Path::new("/nonexistent/package.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/package.json"));
    }

    #[test]
    fn invalid_json_is_version_not_found() {
        let tmp = TempDir::new().unwrap();
        let path = manifest_in(&tmp, "{ not json");
        let err = read_manifest_version(&path).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn non_string_or_empty_version_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = manifest_in(&tmp, r#"{"version": 1}"#);
        assert!(read_manifest_version(&path).is_err());
        let path = manifest_in(&tmp, r#"{"version": ""}"#);
        assert!(read_manifest_version(&path).is_err());
    }

    #[test]
    fn dry_run_write_and_publish_are_printed() {
        let tmp = TempDir::new().unwrap();
        let path = manifest_in(&tmp, r#"{"version": "1.0.0"}"#);
        let pm = npm(Shell::new(RunMode::DryRun), path.clone());

        assert_eq!(
            pm.write_version(&validate("1.0.1").unwrap()).unwrap(),
            Execution::Printed("npm version 1.0.1 --no-git-tag-version".into())
        );
        assert_eq!(
            pm.publish().unwrap(),
            Execution::Printed("npm publish".into())
        );
        assert_eq!(pm.read_version().unwrap(), "1.0.0");
        assert_eq!(pm.manifest(), path);
    }
}
