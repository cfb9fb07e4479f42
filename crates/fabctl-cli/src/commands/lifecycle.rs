//! # Lifecycle Subcommand
//!
//! Chaincode lifecycle: install a package on peers, approve a definition
//! for the operator's organization, commit it to the channel, and query
//! what is installed or committed.
//!
//! Channel-scoped operations use the channel of the current context.
//!
//! ```bash
//! fabric lifecycle install mycc_1 ./mycc.tar.gz --peer peer0.org1.example.com
//! fabric lifecycle approve mycc 1.0 mycc_1:abcd 1 --peer peer0.org1.example.com
//! fabric lifecycle commit mycc 1.0 1 --peer peer0.org1.example.com,peer0.org2.example.com
//! fabric lifecycle queryinstalled --peer peer0.org1.example.com
//! fabric lifecycle querycommitted mycc
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Args, Subcommand};
use fabctl_client::{ApproveRequest, CommitRequest, InstallRequest, Targets};
use fabctl_core::Settings;

use crate::command::{
    execute, parse_sequence, peers_or_default, require, require_peers, BaseCommand, Command,
};
use crate::error::{CommandError, ValidationError};

/// Arguments for the `fabric lifecycle` subcommand.
#[derive(Args, Debug)]
pub struct LifecycleArgs {
    #[command(subcommand)]
    pub command: LifecycleCommand,
}

/// Lifecycle subcommands.
#[derive(Subcommand, Debug)]
pub enum LifecycleCommand {
    /// Install a chaincode package on peers.
    #[command(override_usage = "fabric lifecycle install <label> <package-path> [OPTIONS]")]
    Install(InstallArgs),

    /// Approve a chaincode definition for your organization.
    #[command(
        override_usage = "fabric lifecycle approve <chaincode-name> <version> <package-id> <sequence> [OPTIONS]"
    )]
    Approve(ApproveArgs),

    /// Commit an approved chaincode definition to the channel.
    #[command(override_usage = "fabric lifecycle commit <chaincode-name> <version> <sequence> [OPTIONS]")]
    Commit(CommitArgs),

    /// List chaincode packages installed on a peer.
    #[command(name = "queryinstalled")]
    QueryInstalled(QueryInstalledArgs),

    /// List chaincode definitions committed on the channel.
    #[command(name = "querycommitted", override_usage = "fabric lifecycle querycommitted [chaincode-name] [OPTIONS]")]
    QueryCommitted(QueryCommittedArgs),
}

/// Options shared by approve and commit.
#[derive(Args, Debug, Clone, Default)]
pub struct DefinitionOptions {
    /// Endorsement signature policy expression.
    #[arg(long)]
    pub policy: Option<String>,

    /// Require `Init` to be invoked before any other transaction.
    #[arg(long)]
    pub init_required: bool,

    /// Endorsement plugin name.
    #[arg(long)]
    pub endorsement_plugin: Option<String>,

    /// Validation plugin name.
    #[arg(long)]
    pub validation_plugin: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Package label.
    #[arg(value_name = "label")]
    pub label: Option<String>,

    /// Path to the chaincode package (tar.gz).
    #[arg(value_name = "package-path")]
    pub package_path: Option<String>,

    /// Target peers (repeatable or comma-separated).
    #[arg(long = "peer", value_delimiter = ',')]
    pub peers: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ApproveArgs {
    /// Chaincode name.
    #[arg(value_name = "chaincode-name")]
    pub name: Option<String>,

    /// Chaincode version.
    #[arg(value_name = "version")]
    pub version: Option<String>,

    /// Installed package identifier.
    #[arg(value_name = "package-id")]
    pub package_id: Option<String>,

    /// Definition sequence number.
    #[arg(value_name = "sequence", allow_hyphen_values = true)]
    pub sequence: Option<String>,

    /// Target peers (repeatable or comma-separated).
    #[arg(long = "peer", value_delimiter = ',')]
    pub peers: Vec<String>,

    #[command(flatten)]
    pub definition: DefinitionOptions,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommitArgs {
    /// Chaincode name.
    #[arg(value_name = "chaincode-name")]
    pub name: Option<String>,

    /// Chaincode version.
    #[arg(value_name = "version")]
    pub version: Option<String>,

    /// Definition sequence number.
    #[arg(value_name = "sequence", allow_hyphen_values = true)]
    pub sequence: Option<String>,

    /// Target peers (repeatable or comma-separated).
    #[arg(long = "peer", value_delimiter = ',')]
    pub peers: Vec<String>,

    #[command(flatten)]
    pub definition: DefinitionOptions,
}

#[derive(Args, Debug, Clone, Default)]
pub struct QueryInstalledArgs {
    /// Peer to query.
    #[arg(long)]
    pub peer: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct QueryCommittedArgs {
    /// Only show this chaincode.
    #[arg(value_name = "chaincode-name")]
    pub name: Option<String>,

    /// Peers to query; defaults to the context's peers.
    #[arg(long = "peer", value_delimiter = ',')]
    pub peers: Vec<String>,
}

/// Dispatch a lifecycle subcommand.
pub async fn run_lifecycle(args: LifecycleArgs, settings: Arc<Settings>) -> Result<(), CommandError> {
    let base = BaseCommand::new(settings);
    match args.command {
        LifecycleCommand::Install(args) => execute(InstallCommand::new(base, args)).await,
        LifecycleCommand::Approve(args) => execute(ApproveCommand::new(base, args)).await,
        LifecycleCommand::Commit(args) => execute(CommitCommand::new(base, args)).await,
        LifecycleCommand::QueryInstalled(args) => {
            execute(QueryInstalledCommand::new(base, args)).await
        }
        LifecycleCommand::QueryCommitted(args) => {
            execute(QueryCommittedCommand::new(base, args)).await
        }
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// install
// ---------------------------------------------------------------------------

pub struct InstallCommand {
    base: BaseCommand,
    args: InstallArgs,
}

impl InstallCommand {
    pub fn new(base: BaseCommand, args: InstallArgs) -> Self {
        Self { base, args }
    }
}

#[async_trait]
impl Command for InstallCommand {
    fn name(&self) -> &'static str {
        "lifecycle install"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.base.complete().await
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require(self.args.label.as_deref(), "chaincode label not specified")?;
        require(
            self.args.package_path.as_deref(),
            "chaincode package path not specified",
        )?;
        require_peers(&self.args.peers)
    }

    async fn run(&self) -> Result<(), CommandError> {
        self.base.current_context()?;
        let label = text(&self.args.label);
        let path = text(&self.args.package_path);
        let package = tokio::fs::read(path).await.map_err(CommandError::io(path))?;

        let request = InstallRequest {
            label: label.to_string(),
            package,
        };
        let installed = self
            .base
            .client()?
            .lifecycle_install_cc(request, &Targets::peers(self.args.peers.clone()))
            .await
            .map_err(CommandError::client("failed to install chaincode"))?;

        self.base
            .print(format_args!("successfully installed chaincode '{label}'"))?;
        for response in installed {
            self.base
                .print(format_args!("{}: {}", response.target, response.package_id))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// approve
// ---------------------------------------------------------------------------

pub struct ApproveCommand {
    base: BaseCommand,
    args: ApproveArgs,
}

impl ApproveCommand {
    pub fn new(base: BaseCommand, args: ApproveArgs) -> Self {
        Self { base, args }
    }
}

#[async_trait]
impl Command for ApproveCommand {
    fn name(&self) -> &'static str {
        "lifecycle approve"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.base.complete().await
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require(self.args.name.as_deref(), "chaincode name not specified")?;
        require(self.args.version.as_deref(), "chaincode version not specified")?;
        require(self.args.package_id.as_deref(), "package ID not specified")?;
        parse_sequence(self.args.sequence.as_deref())?;
        require_peers(&self.args.peers)
    }

    async fn run(&self) -> Result<(), CommandError> {
        let context = self.base.current_context()?;
        let name = text(&self.args.name);
        let definition = &self.args.definition;
        let request = ApproveRequest {
            name: name.to_string(),
            version: text(&self.args.version).to_string(),
            package_id: text(&self.args.package_id).to_string(),
            sequence: parse_sequence(self.args.sequence.as_deref())?,
            endorsement_plugin: definition.endorsement_plugin.clone(),
            validation_plugin: definition.validation_plugin.clone(),
            signature_policy: definition.policy.clone(),
            init_required: definition.init_required,
        };
        let targets = Targets::peers(self.args.peers.clone())
            .with_orderer(context.orderers.first().cloned());

        let tx = self
            .base
            .client()?
            .lifecycle_approve_cc(&context.channel, request, &targets)
            .await
            .map_err(CommandError::client("failed to approve chaincode"))?;

        tracing::info!(chaincode = name, transaction = %tx, "chaincode approved");
        self.base
            .print(format_args!("successfully approved chaincode '{name}'"))
    }
}

// ---------------------------------------------------------------------------
// commit
// ---------------------------------------------------------------------------

pub struct CommitCommand {
    base: BaseCommand,
    args: CommitArgs,
}

impl CommitCommand {
    pub fn new(base: BaseCommand, args: CommitArgs) -> Self {
        Self { base, args }
    }
}

#[async_trait]
impl Command for CommitCommand {
    fn name(&self) -> &'static str {
        "lifecycle commit"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.base.complete().await
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require(self.args.name.as_deref(), "chaincode name not specified")?;
        require(self.args.version.as_deref(), "chaincode version not specified")?;
        parse_sequence(self.args.sequence.as_deref())?;
        require_peers(&self.args.peers)
    }

    async fn run(&self) -> Result<(), CommandError> {
        let context = self.base.current_context()?;
        let name = text(&self.args.name);
        let definition = &self.args.definition;
        let request = CommitRequest {
            name: name.to_string(),
            version: text(&self.args.version).to_string(),
            sequence: parse_sequence(self.args.sequence.as_deref())?,
            endorsement_plugin: definition.endorsement_plugin.clone(),
            validation_plugin: definition.validation_plugin.clone(),
            signature_policy: definition.policy.clone(),
            init_required: definition.init_required,
        };
        let targets = Targets::peers(self.args.peers.clone())
            .with_orderer(context.orderers.first().cloned());

        let tx = self
            .base
            .client()?
            .lifecycle_commit_cc(&context.channel, request, &targets)
            .await
            .map_err(CommandError::client("failed to commit chaincode"))?;

        tracing::info!(chaincode = name, transaction = %tx, "chaincode committed");
        self.base
            .print(format_args!("successfully committed chaincode '{name}'"))
    }
}

// ---------------------------------------------------------------------------
// queryinstalled
// ---------------------------------------------------------------------------

pub struct QueryInstalledCommand {
    base: BaseCommand,
    args: QueryInstalledArgs,
}

impl QueryInstalledCommand {
    pub fn new(base: BaseCommand, args: QueryInstalledArgs) -> Self {
        Self { base, args }
    }
}

#[async_trait]
impl Command for QueryInstalledCommand {
    fn name(&self) -> &'static str {
        "lifecycle queryinstalled"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.base.complete().await
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require(self.args.peer.as_deref(), "peer not specified")
    }

    async fn run(&self) -> Result<(), CommandError> {
        self.base.current_context()?;
        let installed = self
            .base
            .client()?
            .lifecycle_query_installed_cc(text(&self.args.peer))
            .await
            .map_err(CommandError::client("failed to query installed chaincodes"))?;

        for cc in installed {
            self.base.print(format_args!(
                "Package ID: {}, Label: {}",
                cc.package_id, cc.label
            ))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// querycommitted
// ---------------------------------------------------------------------------

pub struct QueryCommittedCommand {
    base: BaseCommand,
    args: QueryCommittedArgs,
}

impl QueryCommittedCommand {
    pub fn new(base: BaseCommand, args: QueryCommittedArgs) -> Self {
        Self { base, args }
    }
}

#[async_trait]
impl Command for QueryCommittedCommand {
    fn name(&self) -> &'static str {
        "lifecycle querycommitted"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.base.complete().await
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    async fn run(&self) -> Result<(), CommandError> {
        let context = self.base.current_context()?;
        let targets = Targets::peers(peers_or_default(&self.args.peers, context));
        let committed = self
            .base
            .client()?
            .lifecycle_query_committed_cc(
                &context.channel,
                self.args.name.as_deref().filter(|n| !n.is_empty()),
                &targets,
            )
            .await
            .map_err(CommandError::client("failed to query committed chaincodes"))?;

        for cc in committed {
            let approvals = cc
                .approvals
                .iter()
                .map(|(org, approved)| format!("{org}: {approved}"))
                .collect::<Vec<_>>()
                .join(", ");
            self.base.print(format_args!(
                "Name: {}, Version: {}, Sequence: {}, Approvals: [{approvals}]",
                cc.name, cc.version, cc.sequence
            ))?;
        }
        Ok(())
    }
}
