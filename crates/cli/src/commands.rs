//! Subcommands: the two services and the operator commands that drive a
//! running coordinator.

use crate::{coordinator, node};
use clap::Subcommand;
use corelib::ring::DEFAULT_RING_SIZE;
use corelib::store::DEFAULT_CAPACITY;
use corelib::{NodeId, NodeStore};
use reqwest::Url;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use streaming::protocol::AddNodeRequest;
use streaming::{ClusterConfig, HttpNodeClient};
use tokio::net::TcpListener;
use tracing::{info, warn};

pub type CommandResult = anyhow::Result<()>;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve one direct-mapped node store over HTTP.
    Node {
        /// Address to listen on.
        #[arg(long, env = "RING_LISTEN", default_value = "127.0.0.1:9000")]
        listen: SocketAddr,

        /// Number of slots in the store.
        #[arg(long, env = "RING_SLOTS", default_value_t = DEFAULT_CAPACITY)]
        slots: usize,
    },

    /// Serve the ring coordinator over HTTP.
    Coordinator {
        /// Address to listen on.
        #[arg(long, env = "RING_LISTEN", default_value = "127.0.0.1:8080")]
        listen: SocketAddr,

        /// Number of ring positions.
        #[arg(long, env = "RING_SIZE", default_value_t = DEFAULT_RING_SIZE)]
        ring_size: u32,

        /// Timeout for every call to a node, in milliseconds.
        #[arg(long, env = "RING_TIMEOUT_MS", default_value_t = 5000)]
        timeout_ms: u64,

        /// Initial node as `id=address`. Repeatable.
        #[arg(long = "node", env = "RING_NODES", value_delimiter = ',')]
        nodes: Vec<NodeSpec>,
    },

    /// Ask a coordinator to place a node on the ring.
    Join {
        #[arg(long, env = "RING_COORDINATOR")]
        coordinator: String,
        #[arg(long)]
        id: String,
        /// Base URL the coordinator uses to reach the node.
        #[arg(long)]
        address: String,
    },

    /// Ask a coordinator to take a node off the ring.
    Leave {
        #[arg(long, env = "RING_COORDINATOR")]
        coordinator: String,
        #[arg(long)]
        id: String,
    },

    /// Print a coordinator's ring snapshot.
    Inspect {
        #[arg(long, env = "RING_COORDINATOR")]
        coordinator: String,
    },
}

impl Command {
    pub async fn execute(self) -> CommandResult {
        match self {
            Command::Node { listen, slots } => {
                let store = Arc::new(NodeStore::new(slots)?);
                let listener = TcpListener::bind(listen).await?;
                info!(addr = %listener.local_addr()?, slots, "node store listening");
                node::serve(listener, store, shutdown_signal()).await?;
                Ok(())
            }
            Command::Coordinator {
                listen,
                ring_size,
                timeout_ms,
                nodes,
            } => {
                let config = ClusterConfig {
                    ring_size,
                    node_timeout: Duration::from_millis(timeout_ms),
                };
                let client = Arc::new(HttpNodeClient::new(config.node_timeout));
                let cluster = Arc::new(coordinator::build_cluster(client, &config, &nodes)?);
                let listener = TcpListener::bind(listen).await?;
                info!(
                    addr = %listener.local_addr()?,
                    ring_size,
                    nodes = nodes.len(),
                    "coordinator listening"
                );
                coordinator::serve(listener, cluster, shutdown_signal()).await?;
                Ok(())
            }
            Command::Join {
                coordinator,
                id,
                address,
            } => {
                let url = endpoint(&coordinator, &["nodes"])?;
                let request = AddNodeRequest {
                    node_id: NodeId::new(id),
                    address,
                };
                let response = reqwest::Client::new()
                    .post(url)
                    .json(&request)
                    .send()
                    .await?;
                print_response(response).await
            }
            Command::Leave { coordinator, id } => {
                let url = endpoint(&coordinator, &["nodes", &id])?;
                let response = reqwest::Client::new().delete(url).send().await?;
                print_response(response).await
            }
            Command::Inspect { coordinator } => {
                let url = endpoint(&coordinator, &["ring"])?;
                let response = reqwest::Client::new().get(url).send().await?;
                print_response(response).await
            }
        }
    }
}

/// An initial ring member given as `id=address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub id: NodeId,
    pub address: String,
}

impl FromStr for NodeSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((id, address)) if !id.is_empty() && !address.is_empty() => Ok(Self {
                id: NodeId::from(id),
                address: address.to_string(),
            }),
            _ => Err(format!("expected id=address, got {:?}", s)),
        }
    }
}

impl fmt::Display for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.id, self.address)
    }
}

fn endpoint(base: &str, segments: &[&str]) -> anyhow::Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("{} cannot be a base URL", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn print_response(response: reqwest::Response) -> CommandResult {
    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        anyhow::bail!("coordinator answered with status {}", status);
    }
    Ok(())
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("received ctrl-c, shutting down");
}
