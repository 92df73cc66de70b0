//! HTTP service owning the ring.
//!
//! Item requests are forwarded to the owning node; `/nodes` changes
//! membership and returns as soon as the ring is updated, leaving data
//! movement to the cluster's migration worker.

use crate::commands::NodeSpec;
use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use corelib::{NodeId, RingBuilder, RingEntry};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use streaming::protocol::{
    AddNodeRequest, AddNodeResponse, ErrorResponse, HealthResponse, RingInfo, Slot,
    ValueResponse, ENDPOINT_HEALTH, ENDPOINT_ITEMS, ENDPOINT_MIGRATIONS, ENDPOINT_NODES,
    ENDPOINT_RING,
};
use streaming::{Cluster, ClusterConfig, MigrationStats, NodeClient, StreamingError};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Failures surfaced to coordinator callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error(transparent)]
    Node(#[from] StreamingError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownNode(_) => StatusCode::NOT_FOUND,
            ApiError::Node(StreamingError::NoNodes) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Node(StreamingError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Node(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        debug!(%status, error = %self, "request failed");
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds a cluster whose ring starts with `nodes`. No migration runs for
/// them; they are assumed to start empty.
pub fn build_cluster(
    client: Arc<dyn NodeClient>,
    config: &ClusterConfig,
    nodes: &[NodeSpec],
) -> anyhow::Result<Cluster> {
    let ring = nodes
        .iter()
        .fold(RingBuilder::new().with_size(config.ring_size), |b, n| {
            b.add_node(n.address.clone(), n.id.clone())
        })
        .build()?;
    Ok(Cluster::new(ring, client, config))
}

pub fn router(cluster: Arc<Cluster>) -> Router {
    Router::new()
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(ENDPOINT_RING, get(handle_ring))
        .route(ENDPOINT_MIGRATIONS, get(handle_migrations))
        .route(ENDPOINT_ITEMS, post(handle_put))
        .route("/items/:key", get(handle_get).delete(handle_delete))
        .route(ENDPOINT_NODES, post(handle_add_node))
        .route("/nodes/:id", delete(handle_remove_node))
        .layer(Extension(cluster))
}

/// Serves until `shutdown` resolves, then drains pending migrations.
pub async fn serve(
    listener: TcpListener,
    cluster: Arc<Cluster>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(Arc::clone(&cluster)))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!(pending = cluster.migration_stats().pending(), "draining migrations");
    cluster.shutdown().await;
    Ok(())
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn handle_ring(Extension(cluster): Extension<Arc<Cluster>>) -> Json<RingInfo> {
    Json(cluster.info().await)
}

async fn handle_migrations(Extension(cluster): Extension<Arc<Cluster>>) -> Json<MigrationStats> {
    Json(cluster.migration_stats())
}

async fn handle_get(
    Extension(cluster): Extension<Arc<Cluster>>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let address = cluster.route(&key)?;
    match cluster.client().get(&address, &key).await? {
        Some(value) => Ok(Json(ValueResponse { value }).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn handle_put(
    Extension(cluster): Extension<Arc<Cluster>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let slot: Slot = parse_body(&body)?;
    if slot.is_empty() {
        return Err(ApiError::BadRequest("key must not be empty".to_string()));
    }
    let address = cluster.route(&slot.key)?;
    cluster.client().put(&address, &slot.key, &slot.value).await?;
    Ok(StatusCode::OK)
}

async fn handle_delete(
    Extension(cluster): Extension<Arc<Cluster>>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    let address = cluster.route(&key)?;
    cluster.client().delete(&address, &key).await?;
    Ok(StatusCode::OK)
}

async fn handle_add_node(
    Extension(cluster): Extension<Arc<Cluster>>,
    body: Bytes,
) -> Result<Json<AddNodeResponse>, ApiError> {
    let request: AddNodeRequest = parse_body(&body)?;
    if request.node_id.as_str().is_empty() || request.address.is_empty() {
        return Err(ApiError::BadRequest(
            "node_id and address are required".to_string(),
        ));
    }
    let key = cluster.add_node(request.address.clone(), request.node_id.clone());
    Ok(Json(AddNodeResponse {
        id: request.node_id,
        addr: request.address,
        key,
    }))
}

async fn handle_remove_node(
    Extension(cluster): Extension<Arc<Cluster>>,
    Path(id): Path<String>,
) -> Result<Json<RingEntry>, ApiError> {
    let node_id = NodeId::new(id);
    match cluster.remove_node(&node_id) {
        Some(departure) => Ok(Json(departure.removed)),
        None => Err(ApiError::UnknownNode(node_id)),
    }
}
