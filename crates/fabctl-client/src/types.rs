//! # Resource Management Request and Response Types
//!
//! Plain data carried across the [`ResourceManagement`] seam. The CLI
//! never interprets these beyond reporting them.
//!
//! [`ResourceManagement`]: crate::ResourceManagement

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a submitted transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    /// Access the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which endpoints a request is sent to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets {
    /// Peer endpoints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peers: Vec<String>,
    /// Orderer endpoint, when the operation involves ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orderer: Option<String>,
}

impl Targets {
    /// Target a set of peers.
    pub fn peers(peers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            peers: peers.into_iter().map(Into::into).collect(),
            orderer: None,
        }
    }

    /// Also route through the given orderer.
    pub fn with_orderer(mut self, orderer: Option<String>) -> Self {
        self.orderer = orderer;
        self
    }
}

/// Channel creation or update: a signed configuration envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveChannelRequest {
    /// Channel being created or updated.
    pub channel_id: String,
    /// Serialized configuration transaction envelope.
    pub envelope: Vec<u8>,
}

/// A channel a peer has joined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel name.
    pub channel_id: String,
}

/// Chaincode package to install on peers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRequest {
    /// Package label.
    pub label: String,
    /// Package bytes (tar.gz).
    pub package: Vec<u8>,
}

/// Per-peer outcome of an install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallResponse {
    /// Peer that installed the package.
    pub target: String,
    /// Package identifier assigned by the peer.
    pub package_id: String,
}

/// Organization approval of a chaincode definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveRequest {
    /// Chaincode name.
    pub name: String,
    /// Chaincode version.
    pub version: String,
    /// Installed package being approved.
    pub package_id: String,
    /// Definition sequence number.
    pub sequence: u64,
    /// Endorsement plugin name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endorsement_plugin: Option<String>,
    /// Validation plugin name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_plugin: Option<String>,
    /// Endorsement signature policy expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_policy: Option<String>,
    /// Whether `Init` must be invoked before other transactions.
    #[serde(default)]
    pub init_required: bool,
}

/// Commit of an approved chaincode definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    /// Chaincode name.
    pub name: String,
    /// Chaincode version.
    pub version: String,
    /// Definition sequence number.
    pub sequence: u64,
    /// Endorsement plugin name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endorsement_plugin: Option<String>,
    /// Validation plugin name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_plugin: Option<String>,
    /// Endorsement signature policy expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_policy: Option<String>,
    /// Whether `Init` must be invoked before other transactions.
    #[serde(default)]
    pub init_required: bool,
}

/// A package installed on a peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledChaincode {
    /// Package identifier.
    pub package_id: String,
    /// Package label.
    pub label: String,
}

/// A chaincode definition committed on a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedChaincode {
    /// Chaincode name.
    pub name: String,
    /// Chaincode version.
    pub version: String,
    /// Definition sequence number.
    pub sequence: u64,
    /// Approval status per organization.
    #[serde(default)]
    pub approvals: BTreeMap<String, bool>,
}

/// Legacy (pre-lifecycle) chaincode instantiation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantiateRequest {
    /// Chaincode name.
    pub name: String,
    /// Chaincode version.
    pub version: String,
    /// Chaincode source path.
    pub path: String,
    /// Constructor arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Endorsement policy expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

/// Result of an instantiation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantiateResponse {
    /// Transaction that carried the instantiation.
    pub transaction_id: TransactionId,
}
