//! Binaries around the consistent-hash ring.
//!
//! Provides:
//! - `node`: HTTP service over one direct-mapped node store
//! - `coordinator`: HTTP service owning the ring and the migration queue
//! - Operator commands to join, leave and inspect a running coordinator

pub mod commands;
pub mod config;
pub mod coordinator;
pub mod node;

pub use commands::{Command, CommandResult, NodeSpec};
pub use config::CliConfig;
