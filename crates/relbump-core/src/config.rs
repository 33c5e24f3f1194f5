//! Configuration loading and discovery.
//!
//! This module provides configuration file discovery by:
//! 1. Walking up from the current directory to find project config
//! 2. Loading user config from XDG config directory
//! 3. Merging with the built-in defaults (npm + git-extras)
//!
//! # Supported formats
//!
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Config file locations (in order of precedence, highest first):
//! - `.relbump.<ext>` in current directory or any parent
//! - `relbump.<ext>` in current directory or any parent
//! - `~/.config/relbump/config.<ext>` (user config)
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use relbump_core::config::ConfigLoader;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let config = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("manifest: {}", config.manifest_path());
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::publish::CommitGate;

/// Default package manifest, relative to the project root.
pub const DEFAULT_MANIFEST: &str = "package.json";
/// Default changelog file, relative to the project root.
pub const DEFAULT_CHANGELOG: &str = "CHANGELOG.md";
/// Default command that rewrites the manifest version without committing.
pub const DEFAULT_VERSION_SET: &str = "npm version {version} --no-git-tag-version";
/// Default changelog generator (git-extras).
pub const DEFAULT_CHANGELOG_COMMAND: &str = "git changelog --tag {version}";
/// Default registry publish command.
pub const DEFAULT_PUBLISH: &str = "npm publish";
/// Default remote used for the releases URL.
pub const DEFAULT_REMOTE: &str = "origin";

/// The configuration for relbump.
///
/// Every section is optional; the accessor methods resolve unset values to
/// the npm + git-extras defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Project file locations.
    pub files: Option<FilesConfig>,
    /// External command templates.
    pub commands: Option<CommandsConfig>,
    /// Publish phase behavior.
    pub publish: Option<PublishConfig>,
}

/// Project file locations, relative to the repository root.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FilesConfig {
    /// Package manifest holding the `"version"` field.
    pub manifest: Option<Utf8PathBuf>,
    /// Changelog maintained by the changelog command.
    pub changelog: Option<Utf8PathBuf>,
}

/// Command templates for each external step.
///
/// Templates are split with shell word rules; `{version}` is replaced with
/// the release version in every word.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CommandsConfig {
    /// Rewrites the manifest version without touching git.
    pub version_set: Option<String>,
    /// Regenerates the changelog for the new version.
    pub changelog: Option<String>,
    /// Publishes the package.
    pub publish: Option<String>,
}

/// Publish phase configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublishConfig {
    /// When the commit and tag steps run (default: `clean-tree`).
    pub commit_gate: Option<CommitGate>,
    /// Remote whose URL is turned into the releases page link.
    pub remote: Option<String>,
}

impl Config {
    /// Manifest path, defaulting to `package.json`.
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.files
            .as_ref()
            .and_then(|f| f.manifest.clone())
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_MANIFEST))
    }

    /// Changelog path, defaulting to `CHANGELOG.md`.
    pub fn changelog_path(&self) -> Utf8PathBuf {
        self.files
            .as_ref()
            .and_then(|f| f.changelog.clone())
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CHANGELOG))
    }

    /// Version-set command template.
    pub fn version_set_command(&self) -> &str {
        self.commands
            .as_ref()
            .and_then(|c| c.version_set.as_deref())
            .unwrap_or(DEFAULT_VERSION_SET)
    }

    /// Changelog command template.
    pub fn changelog_command(&self) -> &str {
        self.commands
            .as_ref()
            .and_then(|c| c.changelog.as_deref())
            .unwrap_or(DEFAULT_CHANGELOG_COMMAND)
    }

    /// Publish command template.
    pub fn publish_command(&self) -> &str {
        self.commands
            .as_ref()
            .and_then(|c| c.publish.as_deref())
            .unwrap_or(DEFAULT_PUBLISH)
    }

    /// Commit gate for the publish phase.
    pub fn commit_gate(&self) -> CommitGate {
        self.publish
            .as_ref()
            .and_then(|p| p.commit_gate)
            .unwrap_or_default()
    }

    /// Remote name for the releases URL.
    pub fn remote(&self) -> &str {
        self.publish
            .as_ref()
            .and_then(|p| p.remote.as_deref())
            .unwrap_or(DEFAULT_REMOTE)
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "relbump";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load.
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/relbump/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order, with later files taking precedence.
    /// Explicit files are loaded after discovered files.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    ///
    /// Precedence (highest to lowest):
    /// 1. Explicit files (in order added via `with_file`)
    /// 2. Project config (closest to search root)
    /// 3. User config (`~/.config/relbump/config.<ext>`)
    /// 4. Default values
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
        }

        if let Some(ref root) = self.project_search_root
            && let Some(project_config) = self.find_project_config(root)
        {
            tracing::debug!(path = %project_config, "found project config");
            figment = Self::merge_file(figment, &project_config);
        }

        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            manifest = %config.manifest_path(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Find project config by walking up from the given directory.
    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
                && dir != start
            {
                break;
            }

            for ext in CONFIG_EXTENSIONS {
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    return Some(dotfile);
                }

                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    return Some(regular);
                }
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        None
    }

    /// Find user config in XDG config directory.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Get the user config directory path.
///
/// Returns `~/.config/relbump/` on Linux, `~/Library/Application Support/relbump/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}
