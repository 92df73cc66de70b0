//! Command-line configuration.

use crate::commands::{Command, CommandResult};
use clap::Parser;

/// Consistent-hash ring coordinator and node store.
#[derive(Debug, Parser)]
#[command(name = "cli", version, about)]
pub struct CliConfig {
    /// Maximum log level (trace, debug, info, warn, error).
    #[arg(long, env = "RING_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Installs the log subscriber and runs the selected command to completion.
    pub fn run(self) -> CommandResult {
        tracing_subscriber::fmt()
            .with_max_level(self.log_level)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.command.execute())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinator_defaults() {
        let config = CliConfig::try_parse_from(["cli", "coordinator"]).unwrap();
        assert_eq!(config.log_level, tracing::Level::INFO);
        match config.command {
            Command::Coordinator {
                ring_size,
                timeout_ms,
                nodes,
                ..
            } => {
                assert_eq!(ring_size, 1024);
                assert_eq!(timeout_ms, 5000);
                assert!(nodes.is_empty());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_initial_nodes() {
        let config = CliConfig::try_parse_from([
            "cli",
            "--log-level",
            "debug",
            "coordinator",
            "--node",
            "a=http://127.0.0.1:9001",
            "--node",
            "b=http://127.0.0.1:9002",
        ])
        .unwrap();
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        let Command::Coordinator { nodes, .. } = config.command else {
            panic!("expected coordinator");
        };
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].id.as_str(), "b");
        assert_eq!(nodes[1].address, "http://127.0.0.1:9002");
    }

    #[test]
    fn test_parse_node_defaults() {
        let config = CliConfig::try_parse_from(["cli", "node"]).unwrap();
        let Command::Node { slots, .. } = config.command else {
            panic!("expected node");
        };
        assert_eq!(slots, corelib::store::DEFAULT_CAPACITY);
    }

    #[test]
    fn test_rejects_malformed_node_spec() {
        assert!(CliConfig::try_parse_from(["cli", "coordinator", "--node", "nope"]).is_err());
        assert!(CliConfig::try_parse_from(["cli", "coordinator", "--node", "=http://x"]).is_err());
    }

    #[test]
    fn test_parse_join() {
        let config = CliConfig::try_parse_from([
            "cli",
            "join",
            "--coordinator",
            "http://127.0.0.1:8080",
            "--id",
            "n1",
            "--address",
            "http://127.0.0.1:9001",
        ])
        .unwrap();
        assert!(matches!(config.command, Command::Join { .. }));
    }
}
