//! # Network Subcommand
//!
//! Manage the networks contexts point at. A network is a REST gateway
//! URL plus its TLS and timeout settings. Nothing here touches the network.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Args, Subcommand};
use fabctl_core::{ConfigError, Network, Settings};

use crate::command::{execute, require, Command, LocalCommand};
use crate::error::{CommandError, ValidationError};

/// Arguments for the `fabric network` subcommand.
#[derive(Args, Debug)]
pub struct NetworkArgs {
    #[command(subcommand)]
    pub command: NetworkCommand,
}

/// Network subcommands.
#[derive(Subcommand, Debug)]
pub enum NetworkCommand {
    /// List networks and their gateways.
    List,

    /// Print a network as YAML.
    #[command(override_usage = "fabric network view <network-name>")]
    View(NameArg),

    /// Create or replace a network.
    #[command(override_usage = "fabric network set <network-name> --gateway <url> [OPTIONS]")]
    Set(SetArgs),

    /// Remove a network.
    #[command(override_usage = "fabric network delete <network-name>")]
    Delete(NameArg),
}

#[derive(Args, Debug, Clone, Default)]
pub struct NameArg {
    /// Network name.
    #[arg(value_name = "network-name")]
    pub name: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Network name.
    #[arg(value_name = "network-name")]
    pub name: Option<String>,

    /// Base URL of the network's REST gateway.
    #[arg(long)]
    pub gateway: Option<String>,

    /// PEM bundle of the CA that signed the gateway certificate.
    #[arg(long)]
    pub tls_ca_cert: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Dispatch a network subcommand.
pub async fn run_network(args: NetworkArgs, settings: Arc<Settings>) -> Result<(), CommandError> {
    let local = LocalCommand::new(settings);
    match args.command {
        NetworkCommand::List => execute(ListNetworks::new(local)).await,
        NetworkCommand::View(arg) => execute(ViewNetwork::new(local, arg)).await,
        NetworkCommand::Set(args) => execute(SetNetwork::new(local, args)).await,
        NetworkCommand::Delete(arg) => execute(DeleteNetwork::new(local, arg)).await,
    }
}

fn require_name(name: &Option<String>) -> Result<(), ValidationError> {
    require(name.as_deref(), "network name not specified")
}

pub struct ListNetworks {
    local: LocalCommand,
}

impl ListNetworks {
    pub fn new(local: LocalCommand) -> Self {
        Self { local }
    }
}

#[async_trait]
impl Command for ListNetworks {
    fn name(&self) -> &'static str {
        "network list"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.local.complete()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    async fn run(&self) -> Result<(), CommandError> {
        for (name, network) in &self.local.config()?.networks {
            self.local
                .print(format_args!("{name}: {}", network.gateway))?;
        }
        Ok(())
    }
}

pub struct ViewNetwork {
    local: LocalCommand,
    arg: NameArg,
}

impl ViewNetwork {
    pub fn new(local: LocalCommand, arg: NameArg) -> Self {
        Self { local, arg }
    }
}

#[async_trait]
impl Command for ViewNetwork {
    fn name(&self) -> &'static str {
        "network view"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.local.complete()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.arg.name)
    }

    async fn run(&self) -> Result<(), CommandError> {
        let name = self.arg.name.as_deref().unwrap_or_default();
        let network = self
            .local
            .config()?
            .networks
            .get(name)
            .ok_or_else(|| ConfigError::NetworkNotFound(name.to_string()))?;
        let yaml = serde_yaml::to_string(network)?;
        self.local.print(yaml.trim_end())
    }
}

pub struct SetNetwork {
    local: LocalCommand,
    args: SetArgs,
}

impl SetNetwork {
    pub fn new(local: LocalCommand, args: SetArgs) -> Self {
        Self { local, args }
    }
}

#[async_trait]
impl Command for SetNetwork {
    fn name(&self) -> &'static str {
        "network set"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.local.complete()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.args.name)?;
        require(self.args.gateway.as_deref(), "network gateway not specified")
    }

    async fn run(&self) -> Result<(), CommandError> {
        let name = self.args.name.as_deref().unwrap_or_default();
        let mut config = self.local.config()?.clone();
        config.networks.insert(
            name.to_string(),
            Network {
                gateway: self.args.gateway.clone().unwrap_or_default(),
                tls_ca_cert: self.args.tls_ca_cert.clone(),
                timeout_secs: self.args.timeout_secs,
            },
        );
        self.local.save(&config)?;
        self.local
            .print(format_args!("successfully saved network '{name}'"))
    }
}

pub struct DeleteNetwork {
    local: LocalCommand,
    arg: NameArg,
}

impl DeleteNetwork {
    pub fn new(local: LocalCommand, arg: NameArg) -> Self {
        Self { local, arg }
    }
}

#[async_trait]
impl Command for DeleteNetwork {
    fn name(&self) -> &'static str {
        "network delete"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.local.complete()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.arg.name)
    }

    async fn run(&self) -> Result<(), CommandError> {
        let name = self.arg.name.as_deref().unwrap_or_default();
        let mut config = self.local.config()?.clone();
        config.delete_network(name)?;
        let users: Vec<&str> = config
            .contexts
            .iter()
            .filter(|(_, context)| context.network == name)
            .map(|(context, _)| context.as_str())
            .collect();
        if !users.is_empty() {
            tracing::warn!(network = name, contexts = ?users, "deleted network is still referenced");
        }
        self.local.save(&config)?;
        self.local
            .print(format_args!("successfully deleted network '{name}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabctl_core::Home;

    use crate::testing::{foo_config, settings_in, settings_with};

    #[tokio::test]
    async fn list_prints_gateways() {
        let (settings, out) = settings_with(Some(foo_config()));
        execute(ListNetworks::new(LocalCommand::new(settings)))
            .await
            .unwrap();
        assert_eq!(out.contents(), "local: http://localhost:7443\n");
    }

    #[test]
    fn set_validation_order() {
        let (settings, _) = settings_with(None);
        let err = SetNetwork::new(LocalCommand::new(settings.clone()), SetArgs::default())
            .validate()
            .unwrap_err();
        assert_eq!(err.message(), "network name not specified");

        let args = SetArgs {
            name: Some("local".to_string()),
            ..SetArgs::default()
        };
        let err = SetNetwork::new(LocalCommand::new(settings), args)
            .validate()
            .unwrap_err();
        assert_eq!(err.message(), "network gateway not specified");
    }

    #[tokio::test]
    async fn set_persists_network() {
        let dir = tempfile::tempdir().unwrap();
        let home = Home::new(dir.path());
        let (settings, out) = settings_in(home.clone(), Some(Default::default()));
        let args = SetArgs {
            name: Some("prod".to_string()),
            gateway: Some("https://gw.example.com".to_string()),
            tls_ca_cert: Some(PathBuf::from("/etc/fabric/ca.pem")),
            timeout_secs: Some(10),
        };

        execute(SetNetwork::new(LocalCommand::new(settings), args))
            .await
            .unwrap();

        assert_eq!(out.contents(), "successfully saved network 'prod'\n");
        let network = &home.load_config().unwrap().networks["prod"];
        assert_eq!(network.gateway, "https://gw.example.com");
        assert_eq!(network.timeout_secs(), 10);
    }

    #[tokio::test]
    async fn delete_unknown_network_fails() {
        let dir = tempfile::tempdir().unwrap();
        let home = Home::new(dir.path());
        let (settings, _) = settings_in(home.clone(), Some(foo_config()));
        let arg = NameArg {
            name: Some("nope".to_string()),
        };

        let err = execute(DeleteNetwork::new(LocalCommand::new(settings), arg))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "network 'nope' does not exist");
        assert!(!home.config_path().exists());
    }

    #[tokio::test]
    async fn delete_removes_network() {
        let dir = tempfile::tempdir().unwrap();
        let home = Home::new(dir.path());
        let (settings, out) = settings_in(home.clone(), Some(foo_config()));
        let arg = NameArg {
            name: Some("local".to_string()),
        };

        execute(DeleteNetwork::new(LocalCommand::new(settings), arg))
            .await
            .unwrap();

        assert_eq!(out.contents(), "successfully deleted network 'local'\n");
        let saved = home.load_config().unwrap();
        assert!(saved.networks.is_empty());
        assert!(saved.contexts.contains_key("foo"));
    }

    #[tokio::test]
    async fn view_prints_yaml() {
        let (settings, out) = settings_with(Some(foo_config()));
        let arg = NameArg {
            name: Some("local".to_string()),
        };
        execute(ViewNetwork::new(LocalCommand::new(settings), arg))
            .await
            .unwrap();
        assert_eq!(out.contents(), "gateway: http://localhost:7443\n");
    }
}
