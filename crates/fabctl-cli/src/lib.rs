//! # fabctl-cli: the `fabric` command-line tool
//!
//! Administers channels and chaincode on a permissioned ledger network.
//!
//! ## Subcommands
//!
//! - `fabric channel`: create, join, update, list, config.
//! - `fabric lifecycle`: install, approve, commit, queryinstalled,
//!   querycommitted.
//! - `fabric chaincode`: legacy instantiate.
//! - `fabric context` / `fabric network`: edit the configuration file.
//!
//! ## Execution Model
//!
//! Every leaf command implements [`Command`] and is driven by
//! [`execute`]: `complete`, then `validate`, then `run`, stopping at the
//! first failure. Network commands share a [`BaseCommand`], which derives
//! the resource-management client from a [`Factory`](fabctl_client::Factory)
//! and starts a [`ShutdownCoordinator`] that closes the network session on
//! SIGINT or SIGTERM.

pub mod command;
pub mod commands;
pub mod error;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{execute, BaseCommand, Command, LocalCommand, Phase};
pub use error::{CommandError, ValidationError};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal, SignalListener};
