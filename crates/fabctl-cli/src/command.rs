//! # Command Lifecycle
//!
//! Every leaf command goes through three phases, strictly in order:
//!
//! 1. **complete**: acquire what `run` needs. Network commands build (or
//!    receive) a [`Factory`], derive the resource-management client and
//!    start the [`ShutdownCoordinator`].
//! 2. **validate**: check arguments. Pure, no I/O, first violated rule wins.
//! 3. **run**: one logical operation, one confirmation on success.
//!
//! [`execute`] drives the phases and stops at the first failure. A command
//! value is consumed by `execute`, so it is used exactly once.
//!
//! Leaf commands hold a [`BaseCommand`] (network commands) or a
//! [`LocalCommand`] (configuration-only commands) and delegate `complete`
//! to it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use fabctl_client::{Factory, NetworkFactory, ResourceManagement};
use fabctl_core::{Config, Context, Output, Settings};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{CommandError, ValidationError};
use crate::shutdown::{ShutdownCoordinator, ShutdownSignal};

/// A leaf command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Name used in diagnostics, e.g. `lifecycle commit`.
    fn name(&self) -> &'static str;

    /// Acquire clients and other resources needed by `run`.
    async fn complete(&mut self) -> Result<(), CommandError>;

    /// Check arguments without I/O.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Perform the operation and print its outcome.
    async fn run(&self) -> Result<(), CommandError>;
}

/// Where a command is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Completed,
    Validated,
    Ran,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Completed => "completed",
            Self::Validated => "validated",
            Self::Ran => "ran",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Run `complete`, `validate` and `run` in order, stopping at the first
/// failure.
pub async fn execute<C: Command>(mut command: C) -> Result<(), CommandError> {
    let name = command.name();
    let mut phase = Phase::Created;

    let outcome = async {
        command.complete().await?;
        advance(name, &mut phase, Phase::Completed);
        command.validate()?;
        advance(name, &mut phase, Phase::Validated);
        command.run().await?;
        advance(name, &mut phase, Phase::Ran);
        Ok::<(), CommandError>(())
    }
    .await;

    if let Err(e) = &outcome {
        advance(name, &mut phase, Phase::Failed);
        tracing::debug!(command = name, error = %e, "command failed");
    }
    outcome
}

fn advance(name: &'static str, phase: &mut Phase, next: Phase) {
    tracing::debug!(command = name, from = %phase, to = %next, "phase transition");
    *phase = next;
}

/// State shared by every network-facing command.
pub struct BaseCommand {
    settings: Arc<Settings>,
    factory: Option<Arc<dyn Factory>>,
    resource_management: Option<Arc<dyn ResourceManagement>>,
    shutdown_trigger: Option<oneshot::Receiver<ShutdownSignal>>,
    coordinator: Option<JoinHandle<()>>,
}

impl BaseCommand {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            factory: None,
            resource_management: None,
            shutdown_trigger: None,
            coordinator: None,
        }
    }

    /// Use `factory` instead of building a [`NetworkFactory`].
    pub fn with_factory(mut self, factory: Arc<dyn Factory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Drive the shutdown coordinator from `trigger` instead of process
    /// signals.
    pub fn with_shutdown_trigger(mut self, trigger: oneshot::Receiver<ShutdownSignal>) -> Self {
        self.shutdown_trigger = Some(trigger);
        self
    }

    /// Build the factory if none was injected, derive the client, and start
    /// the shutdown coordinator.
    pub async fn complete(&mut self) -> Result<(), CommandError> {
        let factory = match &self.factory {
            Some(factory) => factory.clone(),
            None => {
                let factory: Arc<dyn Factory> =
                    Arc::new(NetworkFactory::new(self.settings.config.as_ref())?);
                self.factory = Some(factory.clone());
                factory
            }
        };

        self.resource_management = Some(factory.resource_management().await?);

        let coordinator = ShutdownCoordinator::new(
            Some(factory),
            self.settings.shutdown_notices,
            self.settings.streams.out.clone(),
        );
        self.coordinator = Some(match self.shutdown_trigger.take() {
            Some(trigger) => coordinator.spawn_with(async move { trigger.await.ok() }),
            None => coordinator.spawn(),
        });
        Ok(())
    }

    pub fn factory(&self) -> Option<&Arc<dyn Factory>> {
        self.factory.as_ref()
    }

    /// The current context. Fails when no configuration is loaded, the
    /// current context is unset, or it does not resolve.
    pub fn current_context(&self) -> Result<&Context, CommandError> {
        Ok(self.settings.config()?.current_context()?)
    }

    /// The client derived during `complete`.
    pub fn client(&self) -> Result<&dyn ResourceManagement, CommandError> {
        self.resource_management
            .as_deref()
            .ok_or(CommandError::NotCompleted)
    }

    pub fn out(&self) -> &Output {
        &self.settings.streams.out
    }

    /// Write one line to the output stream.
    pub fn print(&self, line: impl fmt::Display) -> Result<(), CommandError> {
        self.out().line(line).map_err(CommandError::Output)
    }

    /// Hand over the coordinator task, if one was started.
    pub fn take_coordinator(&mut self) -> Option<JoinHandle<()>> {
        self.coordinator.take()
    }
}

impl fmt::Debug for BaseCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseCommand")
            .field("settings", &self.settings)
            .field("has_factory", &self.factory.is_some())
            .field("completed", &self.resource_management.is_some())
            .finish_non_exhaustive()
    }
}

/// State shared by commands that only read and write the configuration.
#[derive(Debug)]
pub struct LocalCommand {
    settings: Arc<Settings>,
    config: Option<Config>,
}

impl LocalCommand {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            config: None,
        }
    }

    /// Take a working copy of the loaded configuration.
    pub fn complete(&mut self) -> Result<(), CommandError> {
        self.config = Some(self.settings.config()?.clone());
        Ok(())
    }

    pub fn config(&self) -> Result<&Config, CommandError> {
        self.config.as_ref().ok_or(CommandError::NotCompleted)
    }

    /// Persist `config` to the home directory.
    pub fn save(&self, config: &Config) -> Result<(), CommandError> {
        self.settings.home.save_config(config)?;
        Ok(())
    }

    pub fn print(&self, line: impl fmt::Display) -> Result<(), CommandError> {
        self.settings
            .streams
            .out
            .line(line)
            .map_err(CommandError::Output)
    }
}

/// Fail with `message` when `value` is missing or empty.
pub fn require(value: Option<&str>, message: &str) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_empty() => Ok(()),
        _ => Err(ValidationError::new(message)),
    }
}

/// Fail unless at least one peer was given.
pub fn require_peers(peers: &[String]) -> Result<(), ValidationError> {
    if peers.is_empty() {
        return Err(ValidationError::new("at least one peer must be specified"));
    }
    Ok(())
}

/// Parse a chaincode definition sequence: present, an integer, positive.
pub fn parse_sequence(text: Option<&str>) -> Result<u64, ValidationError> {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return Err(ValidationError::new("sequence not specified")),
    };
    let sequence: i64 = text
        .parse()
        .map_err(|e| ValidationError::new(format!("invalid sequence: {e}")))?;
    u64::try_from(sequence)
        .ok()
        .filter(|&s| s > 0)
        .ok_or_else(|| ValidationError::new("sequence must be greater than 0"))
}

/// `explicit` when given, otherwise the context's defaults.
pub fn peers_or_default(explicit: &[String], context: &Context) -> Vec<String> {
    if explicit.is_empty() {
        context.peers.clone()
    } else {
        explicit.to_vec()
    }
}
