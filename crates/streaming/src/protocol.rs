//! Node and coordinator HTTP protocol.
//!
//! Paths and DTOs shared by the node service, the coordinator, and
//! `HttpNodeClient`. Everything is JSON.

use corelib::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use corelib::{Slot, StoreStats};

// --- API Endpoints ---

/// Single items live under `/items/{key}`; `POST /items` writes one and
/// `GET /items` returns the whole inventory.
pub const ENDPOINT_ITEMS: &str = "/items";
/// Batch write used as the migration target. Kept outside `/items/` so
/// every key, `bulk` included, addresses a single item.
pub const ENDPOINT_BULK: &str = "/bulk";
/// Slot count and fill level of a node store.
pub const ENDPOINT_STATS: &str = "/stats";
/// Coordinator membership endpoint (`POST` to join, `DELETE /nodes/{id}` to leave).
pub const ENDPOINT_NODES: &str = "/nodes";
/// Coordinator diagnostics snapshot.
pub const ENDPOINT_RING: &str = "/ring";
/// Coordinator migration counters.
pub const ENDPOINT_MIGRATIONS: &str = "/migrations";
pub const ENDPOINT_HEALTH: &str = "/health";

// --- Data Transfer Objects ---

/// Body of a successful single-item read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueResponse {
    pub value: String,
}

/// Full key/value inventory of a node.
pub type Inventory = HashMap<String, String>;

/// Request to place a node on the ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddNodeRequest {
    pub node_id: NodeId,
    pub address: String,
}

/// Result of placing a node on the ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddNodeResponse {
    pub id: NodeId,
    pub addr: String,
    /// Ring position the node landed on.
    pub key: u32,
}

/// Diagnostic view of one ring entry.
///
/// The optional fields come from querying the node and are omitted when
/// that query fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(rename = "nodeID")]
    pub node_id: NodeId,
    pub addr: String,
    /// Ring position.
    pub key: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Inventory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled: Option<usize>,
}

/// Diagnostic snapshot of the whole ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingInfo {
    pub size: u32,
    pub nodes: Vec<NodeInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Body of every coordinator error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
