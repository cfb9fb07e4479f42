//! # Network and Context Configuration
//!
//! The configuration file maps network names to gateway endpoints and
//! context names to connection parameters, and designates one context as
//! current. Every network-facing command starts by resolving the current
//! context; a missing or dangling `current-context` stops the command
//! before any network I/O.
//!
//! ```yaml
//! networks:
//!   local:
//!     gateway: https://localhost:7443
//!     tls-ca-cert: /etc/fabric/ca.pem
//! contexts:
//!   org1-admin:
//!     network: local
//!     organization: Org1MSP
//!     user: Admin
//!     channel: mychannel
//!     peers: [peer0.org1.example.com]
//!     orderers: [orderer.example.com]
//! current-context: org1-admin
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default per-request timeout for gateway sessions.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The full CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Known networks, keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, Network>,

    /// Known contexts, keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contexts: BTreeMap<String, Context>,

    /// Name of the context used by network commands.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,
}

/// A named bundle of connection parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Context {
    /// Network this context connects to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network: String,

    /// MSP identifier of the operator's organization.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organization: String,

    /// Enrolled user name the operator acts as.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,

    /// Default channel for channel-scoped operations.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel: String,

    /// Orderer endpoints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orderers: Vec<String>,

    /// Peer endpoints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peers: Vec<String>,
}

/// A ledger network reachable through a REST gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Network {
    /// Base URL of the gateway (e.g. `https://localhost:7443`).
    pub gateway: String,

    /// PEM bundle of the CA that signed the gateway's TLS certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Network {
    /// Request timeout, falling back to [`DEFAULT_TIMEOUT_SECS`].
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

impl Config {
    /// Resolve the current context.
    ///
    /// Fails when `current-context` is empty or names a context that is not
    /// present in the context map.
    pub fn current_context(&self) -> Result<&Context, ConfigError> {
        if self.current_context.is_empty() {
            return Err(ConfigError::CurrentContextNotSet);
        }
        self.contexts
            .get(&self.current_context)
            .ok_or_else(|| ConfigError::ContextNotFound(self.current_context.clone()))
    }

    /// Resolve the network a context points at.
    pub fn network_for(&self, context: &Context) -> Result<&Network, ConfigError> {
        self.networks
            .get(&context.network)
            .ok_or_else(|| ConfigError::NetworkNotFound(context.network.clone()))
    }

    /// Switch the current context. The name must already exist.
    pub fn use_context(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.contexts.contains_key(name) {
            return Err(ConfigError::ContextNotFound(name.to_string()));
        }
        self.current_context = name.to_string();
        Ok(())
    }

    /// Remove a context. Clears `current-context` when it pointed at it.
    pub fn delete_context(&mut self, name: &str) -> Result<Context, ConfigError> {
        let removed = self
            .contexts
            .remove(name)
            .ok_or_else(|| ConfigError::ContextNotFound(name.to_string()))?;
        if self.current_context == name {
            self.current_context.clear();
        }
        Ok(removed)
    }

    /// Remove a network.
    pub fn delete_network(&mut self, name: &str) -> Result<Network, ConfigError> {
        self.networks
            .remove(name)
            .ok_or_else(|| ConfigError::NetworkNotFound(name.to_string()))
    }
}
