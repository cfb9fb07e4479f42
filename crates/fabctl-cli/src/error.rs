//! Command error types.
//!
//! [`ValidationError`] carries the single message of the first violated
//! argument rule. [`CommandError`] is what a command phase returns; each
//! variant renders its cause inline so the entry point prints one line.

use std::path::PathBuf;

use fabctl_client::{ClientError, FactoryError};
use fabctl_core::ConfigError;
use thiserror::Error;

/// A violated argument rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    /// Build from a human-readable sentence naming the offending argument.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The message shown to the operator.
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Failure of a command phase.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    /// A remote operation failed; `operation` is a stable prefix such as
    /// `failed to commit chaincode`.
    #[error("{operation}: {source}")]
    Client {
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    /// A local input file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("failed to render output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render output: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// `run` was reached without a successful `complete`.
    #[error("command used before it was completed")]
    NotCompleted,
}

impl CommandError {
    /// Wrap a client error with an operation prefix, for use with `map_err`.
    pub fn client(operation: &'static str) -> impl FnOnce(ClientError) -> Self {
        move |source| Self::Client { operation, source }
    }

    /// Attach a path to an IO error, for use with `map_err`.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_error_keeps_cause_in_message() {
        let err = CommandError::client("failed to commit chaincode")(ClientError::Remote(
            "commit error".to_string(),
        ));
        assert_eq!(err.to_string(), "failed to commit chaincode: commit error");
    }

    #[test]
    fn transparent_variants_forward_message() {
        let err: CommandError = ValidationError::new("chaincode name not specified").into();
        assert_eq!(err.to_string(), "chaincode name not specified");

        let err: CommandError = ConfigError::CurrentContextNotSet.into();
        assert_eq!(err.to_string(), "current context is not set");
    }

    #[test]
    fn io_error_names_path() {
        let err = CommandError::io("/tmp/missing.tx")(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        assert_eq!(err.to_string(), "failed to read /tmp/missing.tx: no such file");
    }
}
