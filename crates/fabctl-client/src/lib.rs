//! # fabctl-client: network access for the fabric CLI
//!
//! The seam between commands and the ledger network.
//!
//! ## Layers
//!
//! - [`Factory`]: the single construction point for the network session of one
//!   invocation. Lazy, cached, and the only place that opens connections.
//! - [`Session`]: the live handle. Closing is idempotent.
//! - [`ResourceManagement`]: channel and chaincode-lifecycle operations,
//!   derived from the session.
//!
//! [`NetworkFactory`] talks to a REST gateway ([`gateway`]);
//! [`mock::MockFactory`] serves tests. Callers pick one by injection.
//!
//! ## Crate Policy
//!
//! - No retries. A failed remote call is reported once, with its cause.
//! - No interpretation of transaction identifiers or channel configs.

pub mod error;
pub mod factory;
pub mod gateway;
pub mod mock;
pub mod resmgmt;
pub mod types;

pub use error::{ClientError, FactoryError};
pub use factory::{Factory, NetworkFactory, Session};
pub use gateway::{GatewayResourceManagement, GatewaySession};
pub use resmgmt::ResourceManagement;
pub use types::{
    ApproveRequest, ChannelInfo, CommitRequest, CommittedChaincode, InstallRequest,
    InstallResponse, InstalledChaincode, InstantiateRequest, InstantiateResponse,
    SaveChannelRequest, Targets, TransactionId,
};
