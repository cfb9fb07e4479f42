//! # Channel Subcommand
//!
//! Channel administration: create or update a channel from a signed
//! configuration transaction, join peers, list joined channels, and fetch
//! the latest channel configuration from the orderer.
//!
//! Peer and orderer targets default to those of the current context.

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Args, Subcommand};
use fabctl_client::{SaveChannelRequest, Targets};
use fabctl_core::{Context, Settings};

use crate::command::{execute, peers_or_default, require, BaseCommand, Command};
use crate::error::{CommandError, ValidationError};

/// Arguments for the `fabric channel` subcommand.
#[derive(Args, Debug)]
pub struct ChannelArgs {
    #[command(subcommand)]
    pub command: ChannelCommand,
}

/// Channel subcommands.
#[derive(Subcommand, Debug)]
pub enum ChannelCommand {
    /// Create a channel from a channel creation transaction.
    #[command(override_usage = "fabric channel create <channel-name> <tx-file> [OPTIONS]")]
    Create(SaveArgs),

    /// Join peers to a channel.
    #[command(override_usage = "fabric channel join <channel-name> [OPTIONS]")]
    Join(JoinArgs),

    /// Update a channel from a configuration update transaction.
    #[command(override_usage = "fabric channel update <channel-name> <tx-file> [OPTIONS]")]
    Update(SaveArgs),

    /// List the channels a peer has joined.
    List(ListArgs),

    /// Show the latest configuration of a channel.
    #[command(override_usage = "fabric channel config <channel-name> [OPTIONS]")]
    Config(ConfigArgs),
}

/// Arguments for `create` and `update`.
#[derive(Args, Debug, Clone, Default)]
pub struct SaveArgs {
    /// Channel name.
    #[arg(value_name = "channel-name")]
    pub channel: Option<String>,

    /// Signed configuration transaction file.
    #[arg(value_name = "tx-file")]
    pub tx_file: Option<String>,

    /// Orderer to submit through; defaults to the context's first orderer.
    #[arg(long)]
    pub orderer: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct JoinArgs {
    /// Channel name.
    #[arg(value_name = "channel-name")]
    pub channel: Option<String>,

    /// Peers to join; defaults to the context's peers.
    #[arg(long = "peer", value_delimiter = ',')]
    pub peers: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Peer to query; defaults to the context's first peer.
    #[arg(long)]
    pub peer: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Channel name.
    #[arg(value_name = "channel-name")]
    pub channel: Option<String>,

    /// Orderer to query; defaults to the context's first orderer.
    #[arg(long)]
    pub orderer: Option<String>,
}

/// Dispatch a channel subcommand.
pub async fn run_channel(args: ChannelArgs, settings: Arc<Settings>) -> Result<(), CommandError> {
    let base = BaseCommand::new(settings);
    match args.command {
        ChannelCommand::Create(args) => execute(SaveCommand::create(base, args)).await,
        ChannelCommand::Join(args) => execute(JoinCommand::new(base, args)).await,
        ChannelCommand::Update(args) => execute(SaveCommand::update(base, args)).await,
        ChannelCommand::List(args) => execute(ListCommand::new(base, args)).await,
        ChannelCommand::Config(args) => execute(ConfigCommand::new(base, args)).await,
    }
}

fn orderer_or_default(explicit: &Option<String>, context: &Context) -> Option<String> {
    explicit
        .clone()
        .filter(|o| !o.is_empty())
        .or_else(|| context.orderers.first().cloned())
}

fn require_channel(channel: &Option<String>) -> Result<(), ValidationError> {
    require(channel.as_deref(), "channel name not specified")
}

// ---------------------------------------------------------------------------
// create / update
// ---------------------------------------------------------------------------

/// Which save operation a [`SaveCommand`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveKind {
    Create,
    Update,
}

/// `channel create` and `channel update`: both submit a configuration
/// envelope, differing only in wording.
pub struct SaveCommand {
    base: BaseCommand,
    args: SaveArgs,
    kind: SaveKind,
}

impl SaveCommand {
    pub fn create(base: BaseCommand, args: SaveArgs) -> Self {
        Self {
            base,
            args,
            kind: SaveKind::Create,
        }
    }

    pub fn update(base: BaseCommand, args: SaveArgs) -> Self {
        Self {
            base,
            args,
            kind: SaveKind::Update,
        }
    }
}

#[async_trait]
impl Command for SaveCommand {
    fn name(&self) -> &'static str {
        match self.kind {
            SaveKind::Create => "channel create",
            SaveKind::Update => "channel update",
        }
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.base.complete().await
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_channel(&self.args.channel)?;
        require(
            self.args.tx_file.as_deref(),
            "channel transaction file not specified",
        )
    }

    async fn run(&self) -> Result<(), CommandError> {
        let context = self.base.current_context()?;
        let channel = self.args.channel.as_deref().unwrap_or_default();
        let path = self.args.tx_file.as_deref().unwrap_or_default();
        let envelope = tokio::fs::read(path).await.map_err(CommandError::io(path))?;

        let request = SaveChannelRequest {
            channel_id: channel.to_string(),
            envelope,
        };
        let targets = Targets::peers(context.peers.clone())
            .with_orderer(orderer_or_default(&self.args.orderer, context));
        let (operation, verb) = match self.kind {
            SaveKind::Create => ("failed to create channel", "created"),
            SaveKind::Update => ("failed to update channel", "updated"),
        };

        let tx = self
            .base
            .client()?
            .save_channel(request, &targets)
            .await
            .map_err(CommandError::client(operation))?;

        tracing::info!(channel, transaction = %tx, "channel configuration submitted");
        self.base
            .print(format_args!("successfully {verb} channel '{channel}'"))
    }
}

// ---------------------------------------------------------------------------
// join
// ---------------------------------------------------------------------------

pub struct JoinCommand {
    base: BaseCommand,
    args: JoinArgs,
}

impl JoinCommand {
    pub fn new(base: BaseCommand, args: JoinArgs) -> Self {
        Self { base, args }
    }
}

#[async_trait]
impl Command for JoinCommand {
    fn name(&self) -> &'static str {
        "channel join"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.base.complete().await
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_channel(&self.args.channel)
    }

    async fn run(&self) -> Result<(), CommandError> {
        let context = self.base.current_context()?;
        let channel = self.args.channel.as_deref().unwrap_or_default();
        let targets = Targets::peers(peers_or_default(&self.args.peers, context));

        self.base
            .client()?
            .join_channel(channel, &targets)
            .await
            .map_err(CommandError::client("failed to join channel"))?;

        self.base
            .print(format_args!("successfully joined channel '{channel}'"))
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

pub struct ListCommand {
    base: BaseCommand,
    args: ListArgs,
}

impl ListCommand {
    pub fn new(base: BaseCommand, args: ListArgs) -> Self {
        Self { base, args }
    }
}

#[async_trait]
impl Command for ListCommand {
    fn name(&self) -> &'static str {
        "channel list"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.base.complete().await
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    async fn run(&self) -> Result<(), CommandError> {
        let context = self.base.current_context()?;
        let peer = self
            .args
            .peer
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| context.peers.first().cloned())
            .ok_or_else(|| ValidationError::new("peer not specified"))?;

        let channels = self
            .base
            .client()?
            .query_channels(&peer)
            .await
            .map_err(CommandError::client("failed to list channels"))?;

        for channel in channels {
            self.base.print(&channel.channel_id)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

pub struct ConfigCommand {
    base: BaseCommand,
    args: ConfigArgs,
}

impl ConfigCommand {
    pub fn new(base: BaseCommand, args: ConfigArgs) -> Self {
        Self { base, args }
    }
}

#[async_trait]
impl Command for ConfigCommand {
    fn name(&self) -> &'static str {
        "channel config"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.base.complete().await
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_channel(&self.args.channel)
    }

    async fn run(&self) -> Result<(), CommandError> {
        let context = self.base.current_context()?;
        let channel = self.args.channel.as_deref().unwrap_or_default();
        let targets = Targets::peers(context.peers.clone())
            .with_orderer(orderer_or_default(&self.args.orderer, context));

        let config = self
            .base
            .client()?
            .query_config_from_orderer(channel, &targets)
            .await
            .map_err(CommandError::client("failed to fetch channel config"))?;

        self.base.print(serde_json::to_string_pretty(&config)?)
    }
}
