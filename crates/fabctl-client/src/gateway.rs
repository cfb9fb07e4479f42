//! # REST Gateway Session
//!
//! The shipped network transport: an HTTP/JSON client for a ledger REST
//! gateway that fronts the peers and orderers of one network.
//!
//! ## Session
//!
//! [`GatewaySession::connect`] builds a `reqwest::Client` (per-network
//! timeout, optional private CA) and performs one handshake against
//! `GET /v1/health`. Each request carries the context's organization and
//! user in `X-Fabric-Org` / `X-Fabric-User`.
//!
//! Closing the session flips a watch channel. Requests in flight race
//! against it, up to the last byte of the response body, and fail with
//! [`ClientError::SessionClosed`]; requests issued after close fail without
//! touching the network.
//!
//! ## Error Handling
//!
//! Non-2xx responses become [`ClientError::Api`] with status and body so
//! the operator sees what the gateway said.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fabctl_core::{Context, Network};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use url::Url;

use crate::error::{ClientError, FactoryError};
use crate::factory::Session;
use crate::resmgmt::ResourceManagement;
use crate::types::{
    ApproveRequest, ChannelInfo, CommitRequest, CommittedChaincode, InstallRequest,
    InstallResponse, InstalledChaincode, InstantiateRequest, InstantiateResponse,
    SaveChannelRequest, Targets, TransactionId,
};

/// Header carrying the operator's organization.
pub const ORG_HEADER: &str = "X-Fabric-Org";

/// Header carrying the operator's user.
pub const USER_HEADER: &str = "X-Fabric-User";

const API_VERSION: &str = "v1";

/// A live session with a ledger REST gateway.
#[derive(Debug)]
pub struct GatewaySession {
    client: reqwest::Client,
    base: Url,
    closed: AtomicBool,
    close_tx: watch::Sender<bool>,
}

impl GatewaySession {
    /// Open a session with the network's gateway on behalf of `context`.
    pub async fn connect(network: &Network, context: &Context) -> Result<Self, FactoryError> {
        let base = parse_gateway(&network.gateway)?;

        let mut headers = HeaderMap::new();
        for (name, value) in [
            (ORG_HEADER, &context.organization),
            (USER_HEADER, &context.user),
        ] {
            if value.is_empty() {
                continue;
            }
            let value = HeaderValue::from_str(value).map_err(|_| {
                FactoryError::Session(format!("{name} contains invalid header characters"))
            })?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(network.timeout_secs()))
            .default_headers(headers);
        if let Some(path) = &network.tls_ca_cert {
            let pem = std::fs::read(path).map_err(|source| FactoryError::TlsCa {
                path: path.clone(),
                source,
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(FactoryError::ClientBuild)?;
            builder = builder.add_root_certificate(cert);
        }
        let client = builder.build().map_err(FactoryError::ClientBuild)?;

        let (close_tx, _) = watch::channel(false);
        let session = Self {
            client,
            base,
            closed: AtomicBool::new(false),
            close_tx,
        };
        session.handshake().await?;
        Ok(session)
    }

    async fn handshake(&self) -> Result<(), FactoryError> {
        let url = self.endpoint(&["health"]);
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FactoryError::Handshake {
                endpoint: url.to_string(),
                reason: e.to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(FactoryError::Handshake {
                endpoint: url.to_string(),
                reason: format!("HTTP {}", resp.status()),
            });
        }
        tracing::debug!(gateway = %self.base, "gateway handshake complete");
        Ok(())
    }

    /// `<gateway>/v1/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(API_VERSION).extend(segments);
        }
        url
    }

    /// Run one request unless the session is closed. The whole exchange,
    /// body included, races against close.
    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &Url,
    ) -> Result<T, ClientError> {
        if self.is_closed() {
            return Err(ClientError::SessionClosed);
        }
        let closed = wait_closed(self.close_tx.subscribe());

        tokio::select! {
            result = exchange(request, endpoint) => result,
            () = closed => Err(ClientError::SessionClosed),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments);
        self.call(self.client.get(url.clone()).query(query), &url)
            .await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments);
        self.call(self.client.post(url.clone()).json(body), &url)
            .await
    }

    async fn post_bytes<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        bytes: Vec<u8>,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments);
        let request = self
            .client
            .post(url.clone())
            .query(query)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes);
        self.call(request, &url).await
    }
}

impl Session for GatewaySession {
    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.close_tx.send_replace(true);
        tracing::info!(gateway = %self.base, "network session closed");
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

async fn wait_closed(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn parse_gateway(raw: &str) -> Result<Url, FactoryError> {
    let invalid = |reason: String| FactoryError::InvalidGateway {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("not a base URL".to_string()));
    }
    Ok(url)
}

async fn exchange<T: DeserializeOwned>(
    request: RequestBuilder,
    endpoint: &Url,
) -> Result<T, ClientError> {
    let resp = request.send().await.map_err(|source| ClientError::Http {
        endpoint: endpoint.to_string(),
        source,
    })?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            endpoint: endpoint.to_string(),
            status,
            body: if body.is_empty() {
                "no error details".to_string()
            } else {
                body
            },
        });
    }
    decode(resp, endpoint).await
}

async fn decode<T: DeserializeOwned>(resp: Response, endpoint: &Url) -> Result<T, ClientError> {
    resp.json()
        .await
        .map_err(|source| ClientError::Deserialization {
            endpoint: endpoint.to_string(),
            source,
        })
}

fn peer_query<'a>(targets: &'a Targets) -> Vec<(&'a str, &'a str)> {
    let mut query: Vec<(&str, &str)> = targets.peers.iter().map(|p| ("peer", p.as_str())).collect();
    if let Some(orderer) = &targets.orderer {
        query.push(("orderer", orderer.as_str()));
    }
    query
}

#[derive(Deserialize)]
struct TransactionResponse {
    transaction_id: TransactionId,
}

#[derive(Deserialize)]
struct Accepted {}

#[derive(Serialize)]
struct Targeted<'a, T: Serialize> {
    #[serde(flatten)]
    request: &'a T,
    #[serde(flatten)]
    targets: &'a Targets,
}

/// Resource-management client over a [`GatewaySession`].
#[derive(Debug, Clone)]
pub struct GatewayResourceManagement {
    session: Arc<GatewaySession>,
}

impl GatewayResourceManagement {
    /// Derive a client from a session.
    pub fn new(session: Arc<GatewaySession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ResourceManagement for GatewayResourceManagement {
    async fn save_channel(
        &self,
        request: SaveChannelRequest,
        targets: &Targets,
    ) -> Result<TransactionId, ClientError> {
        let resp: TransactionResponse = self
            .session
            .post_bytes(
                &["channels", request.channel_id.as_str()],
                &peer_query(targets),
                request.envelope,
            )
            .await?;
        Ok(resp.transaction_id)
    }

    async fn join_channel(&self, channel_id: &str, targets: &Targets) -> Result<(), ClientError> {
        let _: Accepted = self
            .session
            .post_json(&["channels", channel_id, "join"], targets)
            .await?;
        Ok(())
    }

    async fn query_channels(&self, peer: &str) -> Result<Vec<ChannelInfo>, ClientError> {
        self.session
            .get_json(&["peers", peer, "channels"], &[])
            .await
    }

    async fn query_config_from_orderer(
        &self,
        channel_id: &str,
        targets: &Targets,
    ) -> Result<serde_json::Value, ClientError> {
        self.session
            .get_json(&["channels", channel_id, "config"], &peer_query(targets))
            .await
    }

    async fn lifecycle_install_cc(
        &self,
        request: InstallRequest,
        targets: &Targets,
    ) -> Result<Vec<InstallResponse>, ClientError> {
        let mut query = vec![("label", request.label.as_str())];
        query.extend(peer_query(targets));
        self.session
            .post_bytes(&["lifecycle", "install"], &query, request.package)
            .await
    }

    async fn lifecycle_approve_cc(
        &self,
        channel_id: &str,
        request: ApproveRequest,
        targets: &Targets,
    ) -> Result<TransactionId, ClientError> {
        let body = Targeted {
            request: &request,
            targets,
        };
        let resp: TransactionResponse = self
            .session
            .post_json(&["channels", channel_id, "lifecycle", "approve"], &body)
            .await?;
        Ok(resp.transaction_id)
    }

    async fn lifecycle_commit_cc(
        &self,
        channel_id: &str,
        request: CommitRequest,
        targets: &Targets,
    ) -> Result<TransactionId, ClientError> {
        let body = Targeted {
            request: &request,
            targets,
        };
        let resp: TransactionResponse = self
            .session
            .post_json(&["channels", channel_id, "lifecycle", "commit"], &body)
            .await?;
        Ok(resp.transaction_id)
    }

    async fn lifecycle_query_installed_cc(
        &self,
        peer: &str,
    ) -> Result<Vec<InstalledChaincode>, ClientError> {
        self.session
            .get_json(&["peers", peer, "lifecycle", "installed"], &[])
            .await
    }

    async fn lifecycle_query_committed_cc(
        &self,
        channel_id: &str,
        name: Option<&str>,
        targets: &Targets,
    ) -> Result<Vec<CommittedChaincode>, ClientError> {
        let mut query = peer_query(targets);
        if let Some(name) = name {
            query.push(("name", name));
        }
        self.session
            .get_json(&["channels", channel_id, "lifecycle", "committed"], &query)
            .await
    }

    async fn instantiate_cc(
        &self,
        channel_id: &str,
        request: InstantiateRequest,
        targets: &Targets,
    ) -> Result<InstantiateResponse, ClientError> {
        let body = Targeted {
            request: &request,
            targets,
        };
        self.session
            .post_json(&["channels", channel_id, "chaincodes", "instantiate"], &body)
            .await
    }
}
