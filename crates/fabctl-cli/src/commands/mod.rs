//! Leaf commands, grouped by subcommand.
//!
//! `channel`, `lifecycle` and `chaincode` talk to the network through a
//! [`BaseCommand`](crate::command::BaseCommand); `context` and `network`
//! only edit the configuration file.

pub mod chaincode;
pub mod channel;
pub mod context;
pub mod lifecycle;
pub mod network;
