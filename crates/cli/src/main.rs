//! CLI entry point for the ring coordinator and node stores.

use clap::Parser;
use cli::{CliConfig, CommandResult};

fn main() -> CommandResult {
    let config = CliConfig::parse();
    config.run()
}
