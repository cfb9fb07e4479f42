//! # Chaincode Subcommand
//!
//! Legacy (pre-lifecycle) chaincode management. Only instantiation is
//! supported; new deployments should use `fabric lifecycle`.

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Args, Subcommand};
use fabctl_client::{InstantiateRequest, Targets};
use fabctl_core::Settings;

use crate::command::{execute, peers_or_default, require, BaseCommand, Command};
use crate::error::{CommandError, ValidationError};

/// Arguments for the `fabric chaincode` subcommand.
#[derive(Args, Debug)]
pub struct ChaincodeArgs {
    #[command(subcommand)]
    pub command: ChaincodeCommand,
}

/// Chaincode subcommands.
#[derive(Subcommand, Debug)]
pub enum ChaincodeCommand {
    /// Instantiate an installed chaincode on the channel.
    #[command(override_usage = "fabric chaincode instantiate <chaincode-name> <version> <path> [OPTIONS]")]
    Instantiate(InstantiateArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct InstantiateArgs {
    /// Chaincode name.
    #[arg(value_name = "chaincode-name")]
    pub name: Option<String>,

    /// Chaincode version.
    #[arg(value_name = "version")]
    pub version: Option<String>,

    /// Chaincode source path.
    #[arg(value_name = "path")]
    pub path: Option<String>,

    /// Constructor arguments (repeatable or comma-separated).
    #[arg(long = "arg", value_delimiter = ',')]
    pub args: Vec<String>,

    /// Endorsement policy expression.
    #[arg(long)]
    pub policy: Option<String>,

    /// Target peers; defaults to the context's peers.
    #[arg(long = "peer", value_delimiter = ',')]
    pub peers: Vec<String>,
}

/// Dispatch a chaincode subcommand.
pub async fn run_chaincode(args: ChaincodeArgs, settings: Arc<Settings>) -> Result<(), CommandError> {
    let base = BaseCommand::new(settings);
    match args.command {
        ChaincodeCommand::Instantiate(args) => execute(InstantiateCommand::new(base, args)).await,
    }
}

pub struct InstantiateCommand {
    base: BaseCommand,
    args: InstantiateArgs,
}

impl InstantiateCommand {
    pub fn new(base: BaseCommand, args: InstantiateArgs) -> Self {
        Self { base, args }
    }
}

#[async_trait]
impl Command for InstantiateCommand {
    fn name(&self) -> &'static str {
        "chaincode instantiate"
    }

    async fn complete(&mut self) -> Result<(), CommandError> {
        self.base.complete().await
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require(self.args.name.as_deref(), "chaincode name not specified")?;
        require(self.args.version.as_deref(), "chaincode version not specified")?;
        require(self.args.path.as_deref(), "chaincode path not specified")
    }

    async fn run(&self) -> Result<(), CommandError> {
        let context = self.base.current_context()?;
        let name = self.args.name.as_deref().unwrap_or_default();
        let request = InstantiateRequest {
            name: name.to_string(),
            version: self.args.version.clone().unwrap_or_default(),
            path: self.args.path.clone().unwrap_or_default(),
            args: self.args.args.clone(),
            policy: self.args.policy.clone(),
        };
        let targets = Targets::peers(peers_or_default(&self.args.peers, context));

        let response = self
            .base
            .client()?
            .instantiate_cc(&context.channel, request, &targets)
            .await
            .map_err(CommandError::client("failed to instantiate chaincode"))?;

        tracing::info!(
            chaincode = name,
            transaction = %response.transaction_id,
            "chaincode instantiated"
        );
        self.base
            .print(format_args!("successfully instantiated chaincode '{name}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::{foo_config, mock_base, mock_factory, settings_with};

    fn args(name: &str, version: &str, path: &str) -> InstantiateArgs {
        let some = |s: &str| (!s.is_empty()).then(|| s.to_string());
        InstantiateArgs {
            name: some(name),
            version: some(version),
            path: some(path),
            ..InstantiateArgs::default()
        }
    }

    fn validate(args: InstantiateArgs) -> Result<(), ValidationError> {
        let (settings, _) = settings_with(None);
        InstantiateCommand::new(BaseCommand::new(settings), args).validate()
    }

    #[test]
    fn validation_order() {
        assert_eq!(
            validate(args("", "", "")).unwrap_err().message(),
            "chaincode name not specified"
        );
        assert_eq!(
            validate(args("mycc", "", "")).unwrap_err().message(),
            "chaincode version not specified"
        );
        assert_eq!(
            validate(args("mycc", "1.0", "")).unwrap_err().message(),
            "chaincode path not specified"
        );
        assert!(validate(args("mycc", "1.0", "github.com/mycc")).is_ok());
    }

    #[tokio::test]
    async fn run_instantiates_on_context_channel() {
        let (settings, out) = settings_with(Some(foo_config()));
        let (factory, client) = mock_factory();
        let mut instantiate = args("mycc", "1.0", "github.com/mycc");
        instantiate.args = vec!["init".to_string(), "a".to_string()];

        execute(InstantiateCommand::new(mock_base(settings, factory), instantiate))
            .await
            .unwrap();

        let calls = client.instantiate_cc.calls();
        let (channel, request, targets) = &calls[0];
        assert_eq!(channel, "mychannel");
        assert_eq!(request.args, ["init", "a"]);
        assert_eq!(targets.peers, ["peer0.org1.example.com"]);
        assert_eq!(out.contents(), "successfully instantiated chaincode 'mycc'\n");
    }

    #[tokio::test]
    async fn run_wraps_client_error() {
        let (settings, _) = settings_with(Some(foo_config()));
        let (factory, client) = mock_factory();
        client.instantiate_cc.fails("chaincode not installed");

        let err = execute(InstantiateCommand::new(
            mock_base(settings, factory),
            args("mycc", "1.0", "github.com/mycc"),
        ))
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to instantiate chaincode: chaincode not installed"
        );
    }
}
