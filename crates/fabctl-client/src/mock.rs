//! # Test Doubles
//!
//! In-memory [`Factory`], [`Session`] and [`ResourceManagement`]
//! implementations for exercising commands without a network.
//!
//! Every resource-management operation is a [`Stub`]: it records the
//! arguments of each call and answers with a configured value, a
//! configured failure, or `Default::default()` when nothing was set.
//!
//! ```
//! # use fabctl_client::mock::MockResourceManagement;
//! # use fabctl_client::TransactionId;
//! let client = MockResourceManagement::default();
//! client.lifecycle_commit_cc.fails("commit error");
//! client.save_channel.returns(TransactionId("tx1".into()));
//! assert_eq!(client.lifecycle_commit_cc.call_count(), 0);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{ClientError, FactoryError};
use crate::factory::{Factory, Session};
use crate::resmgmt::ResourceManagement;
use crate::types::{
    ApproveRequest, ChannelInfo, CommitRequest, CommittedChaincode, InstallRequest,
    InstallResponse, InstalledChaincode, InstantiateRequest, InstantiateResponse,
    SaveChannelRequest, Targets, TransactionId,
};

/// One stubbed operation: recorded calls plus a canned answer.
#[derive(Debug)]
pub struct Stub<A, R> {
    calls: Mutex<Vec<A>>,
    answer: Mutex<Option<Result<R, String>>>,
}

impl<A, R> Default for Stub<A, R> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            answer: Mutex::new(None),
        }
    }
}

impl<A: Clone, R: Clone + Default> Stub<A, R> {
    /// Answer every call with `value`.
    pub fn returns(&self, value: R) {
        *self.answer.lock() = Some(Ok(value));
    }

    /// Fail every call with an opaque remote error carrying `message`.
    pub fn fails(&self, message: impl Into<String>) {
        *self.answer.lock() = Some(Err(message.into()));
    }

    /// Number of calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Arguments of every call so far, oldest first.
    pub fn calls(&self) -> Vec<A> {
        self.calls.lock().clone()
    }

    fn call(&self, args: A) -> Result<R, ClientError> {
        self.calls.lock().push(args);
        match &*self.answer.lock() {
            None => Ok(R::default()),
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(ClientError::Remote(message.clone())),
        }
    }
}

/// Recording [`ResourceManagement`] double.
#[derive(Debug, Default)]
pub struct MockResourceManagement {
    /// `save_channel(request, targets)`.
    pub save_channel: Stub<(SaveChannelRequest, Targets), TransactionId>,
    /// `join_channel(channel_id, targets)`.
    pub join_channel: Stub<(String, Targets), ()>,
    /// `query_channels(peer)`.
    pub query_channels: Stub<String, Vec<ChannelInfo>>,
    /// `query_config_from_orderer(channel_id, targets)`.
    pub query_config_from_orderer: Stub<(String, Targets), serde_json::Value>,
    /// `lifecycle_install_cc(request, targets)`.
    pub lifecycle_install_cc: Stub<(InstallRequest, Targets), Vec<InstallResponse>>,
    /// `lifecycle_approve_cc(channel_id, request, targets)`.
    pub lifecycle_approve_cc: Stub<(String, ApproveRequest, Targets), TransactionId>,
    /// `lifecycle_commit_cc(channel_id, request, targets)`.
    pub lifecycle_commit_cc: Stub<(String, CommitRequest, Targets), TransactionId>,
    /// `lifecycle_query_installed_cc(peer)`.
    pub lifecycle_query_installed_cc: Stub<String, Vec<InstalledChaincode>>,
    /// `lifecycle_query_committed_cc(channel_id, name, targets)`.
    pub lifecycle_query_committed_cc:
        Stub<(String, Option<String>, Targets), Vec<CommittedChaincode>>,
    /// `instantiate_cc(channel_id, request, targets)`.
    pub instantiate_cc: Stub<(String, InstantiateRequest, Targets), InstantiateResponse>,
}

impl MockResourceManagement {
    /// Total number of calls across every operation.
    pub fn total_calls(&self) -> usize {
        self.save_channel.call_count()
            + self.join_channel.call_count()
            + self.query_channels.call_count()
            + self.query_config_from_orderer.call_count()
            + self.lifecycle_install_cc.call_count()
            + self.lifecycle_approve_cc.call_count()
            + self.lifecycle_commit_cc.call_count()
            + self.lifecycle_query_installed_cc.call_count()
            + self.lifecycle_query_committed_cc.call_count()
            + self.instantiate_cc.call_count()
    }
}

#[async_trait]
impl ResourceManagement for MockResourceManagement {
    async fn save_channel(
        &self,
        request: SaveChannelRequest,
        targets: &Targets,
    ) -> Result<TransactionId, ClientError> {
        self.save_channel.call((request, targets.clone()))
    }

    async fn join_channel(&self, channel_id: &str, targets: &Targets) -> Result<(), ClientError> {
        self.join_channel
            .call((channel_id.to_string(), targets.clone()))
    }

    async fn query_channels(&self, peer: &str) -> Result<Vec<ChannelInfo>, ClientError> {
        self.query_channels.call(peer.to_string())
    }

    async fn query_config_from_orderer(
        &self,
        channel_id: &str,
        targets: &Targets,
    ) -> Result<serde_json::Value, ClientError> {
        self.query_config_from_orderer
            .call((channel_id.to_string(), targets.clone()))
    }

    async fn lifecycle_install_cc(
        &self,
        request: InstallRequest,
        targets: &Targets,
    ) -> Result<Vec<InstallResponse>, ClientError> {
        self.lifecycle_install_cc.call((request, targets.clone()))
    }

    async fn lifecycle_approve_cc(
        &self,
        channel_id: &str,
        request: ApproveRequest,
        targets: &Targets,
    ) -> Result<TransactionId, ClientError> {
        self.lifecycle_approve_cc
            .call((channel_id.to_string(), request, targets.clone()))
    }

    async fn lifecycle_commit_cc(
        &self,
        channel_id: &str,
        request: CommitRequest,
        targets: &Targets,
    ) -> Result<TransactionId, ClientError> {
        self.lifecycle_commit_cc
            .call((channel_id.to_string(), request, targets.clone()))
    }

    async fn lifecycle_query_installed_cc(
        &self,
        peer: &str,
    ) -> Result<Vec<InstalledChaincode>, ClientError> {
        self.lifecycle_query_installed_cc.call(peer.to_string())
    }

    async fn lifecycle_query_committed_cc(
        &self,
        channel_id: &str,
        name: Option<&str>,
        targets: &Targets,
    ) -> Result<Vec<CommittedChaincode>, ClientError> {
        self.lifecycle_query_committed_cc.call((
            channel_id.to_string(),
            name.map(str::to_string),
            targets.clone(),
        ))
    }

    async fn instantiate_cc(
        &self,
        channel_id: &str,
        request: InstantiateRequest,
        targets: &Targets,
    ) -> Result<InstantiateResponse, ClientError> {
        self.instantiate_cc
            .call((channel_id.to_string(), request, targets.clone()))
    }
}

/// Session double that counts closes.
#[derive(Debug, Default)]
pub struct MockSession {
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl MockSession {
    /// How many times `close` was called, including no-op repeats.
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl Session for MockSession {
    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Factory double: caches one [`MockSession`] and hands out a shared
/// [`MockResourceManagement`], or fails every construction.
#[derive(Debug, Default)]
pub struct MockFactory {
    client: Arc<MockResourceManagement>,
    session: Mutex<Option<Arc<MockSession>>>,
    session_creations: AtomicUsize,
    resource_management_calls: AtomicUsize,
    failure: Option<String>,
}

impl MockFactory {
    /// A factory whose sessions always open.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory handing out `client`.
    pub fn with_client(client: Arc<MockResourceManagement>) -> Self {
        Self {
            client,
            ..Self::default()
        }
    }

    /// A factory whose session construction always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// The client handed out by `resource_management`.
    pub fn client(&self) -> Arc<MockResourceManagement> {
        self.client.clone()
    }

    /// The cached session, if one was opened.
    pub fn mock_session(&self) -> Option<Arc<MockSession>> {
        self.session.lock().clone()
    }

    /// How many sessions were constructed.
    pub fn session_creations(&self) -> usize {
        self.session_creations.load(Ordering::SeqCst)
    }

    /// How many clients were derived.
    pub fn resource_management_calls(&self) -> usize {
        self.resource_management_calls.load(Ordering::SeqCst)
    }

    fn open(&self) -> Result<Arc<MockSession>, FactoryError> {
        if let Some(message) = &self.failure {
            return Err(FactoryError::Session(message.clone()));
        }
        let mut cached = self.session.lock();
        let session = cached.get_or_insert_with(|| {
            self.session_creations.fetch_add(1, Ordering::SeqCst);
            Arc::new(MockSession::default())
        });
        Ok(session.clone())
    }
}

#[async_trait]
impl Factory for MockFactory {
    async fn sdk(&self) -> Result<Arc<dyn Session>, FactoryError> {
        let session: Arc<dyn Session> = self.open()?;
        Ok(session)
    }

    fn cached_sdk(&self) -> Option<Arc<dyn Session>> {
        self.mock_session()
            .map(|session| session as Arc<dyn Session>)
    }

    async fn resource_management(&self) -> Result<Arc<dyn ResourceManagement>, FactoryError> {
        self.resource_management_calls.fetch_add(1, Ordering::SeqCst);
        self.open()?;
        let client: Arc<dyn ResourceManagement> = self.client.clone();
        Ok(client)
    }
}
