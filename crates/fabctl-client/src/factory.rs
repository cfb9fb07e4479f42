//! # Client Factory
//!
//! A [`Factory`] is the single construction point for the network session
//! of one command invocation. The session is created on first use, cached,
//! and every capability client is derived from the cached handle.
//!
//! ## Implementations
//!
//! - [`NetworkFactory`] opens a [`GatewaySession`] against the network of
//!   the configuration's current context.
//! - [`MockFactory`](crate::mock::MockFactory) hands out in-memory doubles.
//!
//! Commands receive one or the other by injection; nothing downcasts.

use std::sync::Arc;

use async_trait::async_trait;
use fabctl_core::{Config, ConfigError};
use tokio::sync::OnceCell;

use crate::error::FactoryError;
use crate::gateway::{GatewayResourceManagement, GatewaySession};
use crate::resmgmt::ResourceManagement;

/// A live link to the ledger network.
pub trait Session: Send + Sync {
    /// Release the session. Closing twice is a no-op.
    fn close(&self);

    /// Whether [`close`](Session::close) has been called.
    fn is_closed(&self) -> bool;
}

/// Builds and caches a session; derives capability clients from it.
#[async_trait]
pub trait Factory: Send + Sync {
    /// The session handle, opening it on first call.
    async fn sdk(&self) -> Result<Arc<dyn Session>, FactoryError>;

    /// The session handle only if it was already opened.
    fn cached_sdk(&self) -> Option<Arc<dyn Session>>;

    /// A resource-management client bound to the cached session.
    async fn resource_management(&self) -> Result<Arc<dyn ResourceManagement>, FactoryError>;
}

/// Factory backed by a REST gateway session.
#[derive(Debug)]
pub struct NetworkFactory {
    config: Config,
    session: OnceCell<Arc<GatewaySession>>,
}

impl NetworkFactory {
    /// Bind a factory to a configuration. No I/O happens here.
    pub fn new(config: Option<&Config>) -> Result<Self, FactoryError> {
        let config = config.cloned().ok_or(ConfigError::Missing)?;
        Ok(Self {
            config,
            session: OnceCell::new(),
        })
    }

    async fn session(&self) -> Result<&Arc<GatewaySession>, FactoryError> {
        self.session
            .get_or_try_init(|| async {
                let context = self.config.current_context()?;
                let network = self.config.network_for(context)?;
                tracing::info!(
                    context = %self.config.current_context,
                    network = %context.network,
                    "opening network session"
                );
                let session = GatewaySession::connect(network, context).await?;
                Ok::<_, FactoryError>(Arc::new(session))
            })
            .await
    }
}

#[async_trait]
impl Factory for NetworkFactory {
    async fn sdk(&self) -> Result<Arc<dyn Session>, FactoryError> {
        let session: Arc<dyn Session> = self.session().await?.clone();
        Ok(session)
    }

    fn cached_sdk(&self) -> Option<Arc<dyn Session>> {
        self.session
            .get()
            .map(|session| session.clone() as Arc<dyn Session>)
    }

    async fn resource_management(&self) -> Result<Arc<dyn ResourceManagement>, FactoryError> {
        let session = self.session().await?.clone();
        Ok(Arc::new(GatewayResourceManagement::new(session)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabctl_core::{Context, Network};

    fn config(current: &str, gateway: &str) -> Config {
        let mut config = Config::default();
        config.networks.insert(
            "local".to_string(),
            Network {
                gateway: gateway.to_string(),
                ..Network::default()
            },
        );
        config.contexts.insert(
            "foo".to_string(),
            Context {
                network: "local".to_string(),
                ..Context::default()
            },
        );
        config.current_context = current.to_string();
        config
    }

    #[test]
    fn new_without_config_fails() {
        let err = NetworkFactory::new(None).unwrap_err();
        assert_eq!(err.to_string(), "configuration is not loaded");
    }

    #[tokio::test]
    async fn unset_current_context_fails_before_io() {
        let factory = NetworkFactory::new(Some(&config("", "http://127.0.0.1:1"))).unwrap();
        let err = factory.resource_management().await.err().unwrap();
        assert_eq!(err.to_string(), "current context is not set");
        assert!(factory.cached_sdk().is_none());
    }

    #[tokio::test]
    async fn dangling_current_context_fails() {
        let factory = NetworkFactory::new(Some(&config("bar", "http://127.0.0.1:1"))).unwrap();
        let err = factory.sdk().await.err().unwrap();
        assert_eq!(err.to_string(), "context 'bar' does not exist");
    }

    #[tokio::test]
    async fn invalid_gateway_is_reported() {
        let factory = NetworkFactory::new(Some(&config("foo", "not a url"))).unwrap();
        let err = factory.sdk().await.err().unwrap();
        assert!(matches!(err, FactoryError::InvalidGateway { .. }));
        assert!(factory.cached_sdk().is_none());
    }
}
