//! Error types for relbump-core configuration.
//!
//! Workflow errors live next to the code that raises them
//! ([`BumpError`](crate::bump::BumpError), [`PublishError`](crate::publish::PublishError), ...).

use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;
