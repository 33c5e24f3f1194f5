//! Core library for relbump.
//!
//! Everything the `relbump` CLI does lives here; the CLI only parses
//! arguments and displays results.
//!
//! # Modules
//!
//! - [`bump`] - Version update phase (manifest version-set, changelog)
//! - [`changelog`] - Changelog generation and section extraction
//! - [`config`] - Configuration loading and management
//! - [`detect`] - Required tool detection on `PATH`
//! - [`error`] - Configuration error types
//! - [`git`] - Git operations for release workflows
//! - [`package`] - Manifest version access and registry publishing
//! - [`publish`] - Commit, tag, push and publish phase
//! - [`shell`] - External commands with dry-run support
//! - [`version`] - Version validation and ordering
//! - [`workdir`] - Scoped working-directory changes
//! - [`workflow`] - Full release runs
//!
//! # Quick Start
//!
//! ```no_run
//! use relbump_core::{Config, ConfigLoader};
//! use relbump_core::version;
//!
//! let config = ConfigLoader::new()
//!     .with_user_config(true)
//!     .load()
//!     .expect("Failed to load configuration");
//!
//! let next = version::validate("1.2.3").expect("valid version");
//! println!("{} -> {next}", config.manifest_path());
//! ```
#![deny(unsafe_code)]

pub mod bump;

pub mod changelog;

pub mod config;

pub mod detect;

pub mod error;

pub mod git;

pub mod package;

pub mod publish;

pub mod shell;

pub mod version;

pub mod workdir;

pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult};

pub use version::ReleaseVersion;

pub use workflow::{ReleaseEvent, RunConfig, RunOutcome, Tools};
