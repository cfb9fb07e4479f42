//! # Resource Management Capability
//!
//! The narrow interface through which commands reach the ledger network:
//! channel administration and chaincode lifecycle. Implementations are
//! derived from a [`Session`](crate::Session) and hold no state of their
//! own; when the session closes, every call fails.
//!
//! Calls are opaque remote operations. They are never retried here.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::types::{
    ApproveRequest, ChannelInfo, CommitRequest, CommittedChaincode, InstallRequest,
    InstallResponse, InstalledChaincode, InstantiateRequest, InstantiateResponse,
    SaveChannelRequest, Targets, TransactionId,
};

/// Channel and chaincode administration operations.
#[async_trait]
pub trait ResourceManagement: Send + Sync {
    /// Create or update a channel from a configuration envelope.
    async fn save_channel(
        &self,
        request: SaveChannelRequest,
        targets: &Targets,
    ) -> Result<TransactionId, ClientError>;

    /// Join peers to a channel.
    async fn join_channel(&self, channel_id: &str, targets: &Targets) -> Result<(), ClientError>;

    /// Channels a peer has joined.
    async fn query_channels(&self, peer: &str) -> Result<Vec<ChannelInfo>, ClientError>;

    /// Latest channel configuration, as reported by the orderer.
    async fn query_config_from_orderer(
        &self,
        channel_id: &str,
        targets: &Targets,
    ) -> Result<serde_json::Value, ClientError>;

    /// Install a chaincode package on peers.
    async fn lifecycle_install_cc(
        &self,
        request: InstallRequest,
        targets: &Targets,
    ) -> Result<Vec<InstallResponse>, ClientError>;

    /// Approve a chaincode definition for the operator's organization.
    async fn lifecycle_approve_cc(
        &self,
        channel_id: &str,
        request: ApproveRequest,
        targets: &Targets,
    ) -> Result<TransactionId, ClientError>;

    /// Commit an approved chaincode definition to a channel.
    async fn lifecycle_commit_cc(
        &self,
        channel_id: &str,
        request: CommitRequest,
        targets: &Targets,
    ) -> Result<TransactionId, ClientError>;

    /// Packages installed on a peer.
    async fn lifecycle_query_installed_cc(
        &self,
        peer: &str,
    ) -> Result<Vec<InstalledChaincode>, ClientError>;

    /// Committed definitions on a channel, optionally filtered by name.
    async fn lifecycle_query_committed_cc(
        &self,
        channel_id: &str,
        name: Option<&str>,
        targets: &Targets,
    ) -> Result<Vec<CommittedChaincode>, ClientError>;

    /// Legacy chaincode instantiation.
    async fn instantiate_cc(
        &self,
        channel_id: &str,
        request: InstantiateRequest,
        targets: &Targets,
    ) -> Result<InstantiateResponse, ClientError>;
}
