//! Client factory and capability client error types.

use std::path::PathBuf;

use fabctl_core::ConfigError;

/// Errors constructing a network session or deriving a client from it.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// The configuration could not be resolved to a context and network.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The network's gateway URL is unusable.
    #[error("invalid gateway URL '{url}': {reason}")]
    InvalidGateway {
        /// The configured URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The TLS CA bundle could not be read.
    #[error("failed to read TLS CA certificate {path}: {source}")]
    TlsCa {
        /// Path of the bundle.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The gateway did not answer the session handshake.
    #[error("handshake with {endpoint} failed: {reason}")]
    Handshake {
        /// Handshake URL.
        endpoint: String,
        /// Transport error or status line.
        reason: String,
    },

    /// Opaque session construction failure.
    #[error("{0}")]
    Session(String),
}

/// Errors from capability client calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The session was closed before or during the call.
    #[error("network session closed")]
    SessionClosed,

    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Endpoint that was called.
        endpoint: String,
        /// Transport error.
        source: reqwest::Error,
    },

    /// The gateway returned a non-2xx status.
    #[error("gateway {endpoint} returned {status}: {body}")]
    Api {
        /// Endpoint that was called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, or a placeholder when empty.
        body: String,
    },

    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// Endpoint that was called.
        endpoint: String,
        /// Decoding error.
        source: reqwest::Error,
    },

    /// Opaque failure reported by the remote side.
    #[error("{0}")]
    Remote(String),
}
