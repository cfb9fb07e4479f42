//! # Context Subcommand
//!
//! Manage named contexts in the configuration file and choose which one
//! network commands use. Nothing here touches the network.
//!
//! ```bash
//! fabric context set org1-admin --network local --organization Org1MSP \
//!     --user Admin --channel mychannel --peer peer0.org1.example.com
//! fabric context use org1-admin
//! fabric context list
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Args, Subcommand};
use fabctl_core::{ConfigError, Context, Settings};

use crate::command::{execute, require, Command, LocalCommand};
use crate::error::{CommandError, ValidationError};

/// Arguments for the `fabric context` subcommand.
#[derive(Args, Debug)]
pub struct ContextArgs {
    #[command(subcommand)]
    pub command: ContextCommand,
}

/// Context subcommands.
#[derive(Subcommand, Debug)]
pub enum ContextCommand {
    /// List contexts, marking the current one.
    List,

    /// Print a context as YAML.
    #[command(override_usage = "fabric context view <context-name>")]
    View(NameArg),

    /// Make a context current.
    #[command(override_usage = "fabric context use <context-name>")]
    Use(NameArg),

    /// Create or update a context.
    #[command(override_usage = "fabric context set <context-name> [OPTIONS]")]
    Set(SetArgs),

    /// Remove a context.
    #[command(override_usage = "fabric context delete <context-name>")]
    Delete(NameArg),
}

#[derive(Args, Debug, Clone, Default)]
pub struct NameArg {
    /// Context name.
    #[arg(value_name = "context-name")]
    pub name: Option<String>,
}

/// Fields to set. Omitted options keep their current value.
#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Context name.
    #[arg(value_name = "context-name")]
    pub name: Option<String>,

    /// Network the context connects to.
    #[arg(long)]
    pub network: Option<String>,

    /// MSP identifier of your organization.
    #[arg(long)]
    pub organization: Option<String>,

    /// Enrolled user name.
    #[arg(long)]
    pub user: Option<String>,

    /// Default channel.
    #[arg(long)]
    pub channel: Option<String>,

    /// Orderer endpoints (repeatable or comma-separated).
    #[arg(long = "orderer", value_delimiter = ',')]
    pub orderers: Vec<String>,

    /// Peer endpoints (repeatable or comma-separated).
    #[arg(long = "peer", value_delimiter = ',')]
    pub peers: Vec<String>,
}

impl SetArgs {
    fn apply(&self, context: &mut Context) {
        let fields = [
            (&self.network, &mut context.network),
            (&self.organization, &mut context.organization),
            (&self.user, &mut context.user),
            (&self.channel, &mut context.channel),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                field.clone_from(value);
            }
        }
        if !self.orderers.is_empty() {
            context.orderers.clone_from(&self.orderers);
        }
        if !self.peers.is_empty() {
            context.peers.clone_from(&self.peers);
        }
    }
}

/// Dispatch a context subcommand.
pub async fn run_context(args: ContextArgs, settings: Arc<Settings>) -> Result<(), CommandError> {
    let local = LocalCommand::new(settings);
    match args.command {
        ContextCommand::List => execute(ListContexts::new(local)).await,
        ContextCommand::View(arg) => execute(ViewContext::new(local, arg)).await,
        ContextCommand::Use(arg) => execute(UseContext::new(local, arg)).await,
        ContextCommand::Set(args) => execute(SetContext::new(local, args)).await,
        ContextCommand::Delete(arg) => execute(DeleteContext::new(local, arg)).await,
    }
}

fn require_name(name: &Option<String>) -> Result<(), ValidationError> {
    require(name.as_deref(), "context name not specified")
}

pub struct ListContexts {
    local: LocalCommand,
}

impl ListContexts {
    pub fn new(local: LocalCommand) -> Self {
        Self { local }
    }
}

#[async_trait]
impl Command for ListContexts {
    fn name(&self) -> &'static str {
        "context list"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.local.complete()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    async fn run(&self) -> Result<(), CommandError> {
        let config = self.local.config()?;
        for name in config.contexts.keys() {
            if *name == config.current_context {
                self.local.print(format_args!("{name} (current)"))?;
            } else {
                self.local.print(name)?;
            }
        }
        Ok(())
    }
}

pub struct ViewContext {
    local: LocalCommand,
    arg: NameArg,
}

impl ViewContext {
    pub fn new(local: LocalCommand, arg: NameArg) -> Self {
        Self { local, arg }
    }
}

#[async_trait]
impl Command for ViewContext {
    fn name(&self) -> &'static str {
        "context view"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.local.complete()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.arg.name)
    }

    async fn run(&self) -> Result<(), CommandError> {
        let name = self.arg.name.as_deref().unwrap_or_default();
        let context = self
            .local
            .config()?
            .contexts
            .get(name)
            .ok_or_else(|| ConfigError::ContextNotFound(name.to_string()))?;
        let yaml = serde_yaml::to_string(context)?;
        self.local.print(yaml.trim_end())
    }
}

pub struct UseContext {
    local: LocalCommand,
    arg: NameArg,
}

impl UseContext {
    pub fn new(local: LocalCommand, arg: NameArg) -> Self {
        Self { local, arg }
    }
}

#[async_trait]
impl Command for UseContext {
    fn name(&self) -> &'static str {
        "context use"
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
        config.use_context(name)?;
        self.local.save(&config)?;
        self.local
            .print(format_args!("switched to context '{name}'"))
    }
}

pub struct SetContext {
    local: LocalCommand,
    args: SetArgs,
}

impl SetContext {
    pub fn new(local: LocalCommand, args: SetArgs) -> Self {
        Self { local, args }
    }
}

#[async_trait]
impl Command for SetContext {
    fn name(&self) -> &'static str {
        "context set"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.local.complete()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_name(&self.args.name)
    }

    async fn run(&self) -> Result<(), CommandError> {
        let name = self.args.name.as_deref().unwrap_or_default();
        let mut config = self.local.config()?.clone();
        let context = config.contexts.entry(name.to_string()).or_default();
        self.args.apply(context);
        if !context.network.is_empty() && !config.networks.contains_key(&context.network) {
            tracing::warn!(context = name, network = %context.network, "context refers to an unknown network");
        }
        self.local.save(&config)?;
        self.local
            .print(format_args!("successfully saved context '{name}'"))
    }
}

pub struct DeleteContext {
    local: LocalCommand,
    arg: NameArg,
}

impl DeleteContext {
    pub fn new(local: LocalCommand, arg: NameArg) -> Self {
        Self { local, arg }
    }
}

#[async_trait]
impl Command for DeleteContext {
    fn name(&self) -> &'static str {
        "context delete"
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
        config.delete_context(name)?;
        self.local.save(&config)?;
        self.local
            .print(format_args!("successfully deleted context '{name}'"))
    }
}
