//! # Configuration Errors
//!
//! Errors raised while loading, resolving, or persisting the CLI
//! configuration. These are surfaced verbatim to the operator, before any
//! network I/O takes place.

use std::path::PathBuf;

use thiserror::Error;

/// Error resolving or persisting configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No configuration was loaded for this invocation.
    #[error("configuration is not loaded")]
    Missing,

    /// The configuration does not designate a current context.
    #[error("current context is not set")]
    CurrentContextNotSet,

    /// A context name does not resolve in the context map.
    #[error("context '{0}' does not exist")]
    ContextNotFound(String),

    /// A network name does not resolve in the network map.
    #[error("network '{0}' does not exist")]
    NetworkNotFound(String),

    /// The home directory could not be determined.
    #[error("unable to determine home directory: set FABRIC_HOME or HOME")]
    HomeNotFound,

    /// The configuration file is not valid YAML for the expected schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(serde_yaml::Error),

    /// Reading or writing the configuration file failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}
