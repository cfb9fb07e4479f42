//! Signal handler registration, observed through `/proc/self/status`.
//!
//! Kept in its own test binary: tokio never uninstalls a signal handler,
//! so any earlier registration in the process would mask the check.

#![cfg(target_os = "linux")]

use std::sync::Arc;

use fabctl_cli::command::BaseCommand;
use fabctl_client::mock::MockFactory;
use fabctl_core::{Home, Output, SharedBuffer, Settings, Streams};

const SIGINT: u32 = 2;
const SIGTERM: u32 = 15;

/// Whether the process has a handler installed for `signal`.
fn caught(signal: u32) -> bool {
    let status = std::fs::read_to_string("/proc/self/status").unwrap();
    let mask = status
        .lines()
        .find_map(|line| line.strip_prefix("SigCgt:"))
        .unwrap()
        .trim();
    let mask = u64::from_str_radix(mask, 16).unwrap();
    mask & (1 << (signal - 1)) != 0
}

#[tokio::test]
async fn handlers_are_installed_when_complete_returns() {
    let streams = Streams {
        out: Output::new(SharedBuffer::new()),
        err: Output::new(SharedBuffer::new()),
    };
    let settings = Arc::new(Settings::new(Home::new(std::env::temp_dir()), streams));
    let mut base = BaseCommand::new(settings).with_factory(Arc::new(MockFactory::new()));

    assert!(!caught(SIGINT));
    assert!(!caught(SIGTERM));

    base.complete().await.unwrap();

    // Current-thread runtime: the coordinator task has not been polled yet.
    assert!(caught(SIGINT));
    assert!(caught(SIGTERM));

    if let Some(coordinator) = base.take_coordinator() {
        coordinator.abort();
    }
}
