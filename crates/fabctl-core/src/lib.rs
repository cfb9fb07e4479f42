//! # fabctl-core: environment for the fabric CLI
//!
//! Everything a command reads from its surroundings: the home directory,
//! the configuration file (networks, contexts, current context), and the
//! streams it writes results to.
//!
//! ## Crate Policy
//!
//! - No network I/O. This crate only reads and writes the config file.
//! - The configuration is read-only to network commands; only the local
//!   `context`/`network` commands persist changes.

pub mod config;
pub mod error;
pub mod settings;
pub mod streams;

pub use config::{Config, Context, Network, DEFAULT_TIMEOUT_SECS};
pub use error::ConfigError;
pub use settings::{Home, NoticeTarget, Settings, CONFIG_FILE, HOME_ENV};
pub use streams::{Output, SharedBuffer, Streams};
