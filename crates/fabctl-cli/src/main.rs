//! # fabric CLI entry point
//!
//! Parses arguments, initializes tracing, loads the configuration and
//! dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fabctl_cli::commands::chaincode::{run_chaincode, ChaincodeArgs};
use fabctl_cli::commands::channel::{run_channel, ChannelArgs};
use fabctl_cli::commands::context::{run_context, ContextArgs};
use fabctl_cli::commands::lifecycle::{run_lifecycle, LifecycleArgs};
use fabctl_cli::commands::network::{run_network, NetworkArgs};
use fabctl_core::{Home, NoticeTarget, Output, Settings, Streams};

/// Channel administration and chaincode lifecycle for permissioned
/// ledger networks.
#[derive(Parser, Debug)]
#[command(name = "fabric", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration directory (defaults to $FABRIC_HOME, then ~/.fabric).
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Where shutdown notices go: `log` or `output`.
    #[arg(long, global = true, default_value_t = NoticeTarget::Log)]
    shutdown_notices: NoticeTarget,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create, join, update and inspect channels.
    Channel(ChannelArgs),

    /// Chaincode lifecycle (install, approve, commit, query).
    Lifecycle(LifecycleArgs),

    /// Legacy chaincode operations.
    Chaincode(ChaincodeArgs),

    /// Manage connection contexts.
    Context(ContextArgs),

    /// Manage networks.
    Network(NetworkArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "fabric CLI starting");

    let streams = Streams::stdio();
    let err = streams.err.clone();
    match run(cli, streams).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&err, &e);
            ExitCode::from(1)
        }
    }
}

/// The one line an operator sees when a command fails.
fn report_failure(err: &Output, e: &anyhow::Error) {
    if let Err(write) = err.line(format_args!("Error: {e}")) {
        tracing::warn!(error = %write, "failed to write error line");
    }
}

async fn run(cli: Cli, streams: Streams) -> anyhow::Result<()> {
    let home = match cli.home {
        Some(path) => Home::new(path),
        None => Home::from_env()?,
    };
    tracing::debug!(home = %home, "resolved home directory");

    let mut settings = Settings::load(home, streams)?;
    settings.shutdown_notices = cli.shutdown_notices;
    let settings = Arc::new(settings);

    match cli.command {
        Commands::Channel(args) => run_channel(args, settings).await?,
        Commands::Lifecycle(args) => run_lifecycle(args, settings).await?,
        Commands::Chaincode(args) => run_chaincode(args, settings).await?,
        Commands::Context(args) => run_context(args, settings).await?,
        Commands::Network(args) => run_network(args, settings).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use fabctl_cli::commands::channel::ChannelCommand;
    use fabctl_cli::commands::lifecycle::LifecycleCommand;
    use fabctl_core::{ConfigError, SharedBuffer};

    #[test]
    fn commit_help_shows_signature() {
        let err = Cli::try_parse_from(["fabric", "lifecycle", "commit", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(err
            .to_string()
            .contains("commit <chaincode-name> <version> <sequence>"));
    }

    #[test]
    fn peers_accept_commas_and_repeats() {
        let cli = Cli::try_parse_from([
            "fabric",
            "lifecycle",
            "commit",
            "mycc",
            "1.0",
            "1",
            "--peer",
            "peer0,peer1",
            "--peer",
            "peer2",
        ])
        .unwrap();
        let Commands::Lifecycle(args) = cli.command else {
            panic!("expected lifecycle");
        };
        let LifecycleCommand::Commit(commit) = args.command else {
            panic!("expected commit");
        };
        assert_eq!(commit.peers, ["peer0", "peer1", "peer2"]);
        assert_eq!(commit.sequence.as_deref(), Some("1"));
    }

    #[test]
    fn negative_sequence_is_positional() {
        let cli = Cli::try_parse_from(["fabric", "lifecycle", "commit", "mycc", "1.0", "-1"]).unwrap();
        let Commands::Lifecycle(args) = cli.command else {
            panic!("expected lifecycle");
        };
        let LifecycleCommand::Commit(commit) = args.command else {
            panic!("expected commit");
        };
        assert_eq!(commit.sequence.as_deref(), Some("-1"));
    }

    #[test]
    fn missing_positionals_still_parse() {
        let cli = Cli::try_parse_from(["fabric", "lifecycle", "commit"]).unwrap();
        let Commands::Lifecycle(args) = cli.command else {
            panic!("expected lifecycle");
        };
        let LifecycleCommand::Commit(commit) = args.command else {
            panic!("expected commit");
        };
        assert!(commit.name.is_none());
    }

    #[test]
    fn query_subcommand_names() {
        let cli = Cli::try_parse_from(["fabric", "lifecycle", "queryinstalled", "--peer", "peer0"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Lifecycle(LifecycleArgs {
                command: LifecycleCommand::QueryInstalled(_)
            })
        ));

        let cli = Cli::try_parse_from(["fabric", "lifecycle", "querycommitted", "mycc"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Lifecycle(LifecycleArgs {
                command: LifecycleCommand::QueryCommitted(_)
            })
        ));
    }

    #[test]
    fn channel_list_parses() {
        let cli = Cli::try_parse_from(["fabric", "channel", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Channel(ChannelArgs {
                command: ChannelCommand::List(_)
            })
        ));
    }

    #[test]
    fn global_flags() {
        let cli = Cli::try_parse_from([
            "fabric",
            "context",
            "list",
            "-vv",
            "--home",
            "/tmp/fabric",
            "--shutdown-notices",
            "output",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/fabric")));
        assert_eq!(cli.shutdown_notices, NoticeTarget::Output);
    }

    #[test]
    fn shutdown_notices_default_to_log() {
        let cli = Cli::try_parse_from(["fabric", "network", "list"]).unwrap();
        assert_eq!(cli.shutdown_notices, NoticeTarget::Log);
    }

    #[test]
    fn failure_is_one_line_on_the_error_stream() {
        let buffer = SharedBuffer::new();
        let err = anyhow::Error::from(ConfigError::CurrentContextNotSet);
        report_failure(&Output::new(buffer.clone()), &err);
        assert_eq!(buffer.contents(), "Error: current context is not set\n");
    }

    #[test]
    fn unknown_notice_target_is_rejected() {
        let err = Cli::try_parse_from(["fabric", "--shutdown-notices", "syslog", "network", "list"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }
}
