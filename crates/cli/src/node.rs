//! HTTP service over a single node store.

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use corelib::NodeStore;
use std::future::Future;
use std::sync::Arc;
use streaming::protocol::{
    Inventory, Slot, StoreStats, ValueResponse, ENDPOINT_BULK, ENDPOINT_ITEMS, ENDPOINT_STATS,
};
use tokio::net::TcpListener;
use tracing::debug;

pub fn router(store: Arc<NodeStore>) -> Router {
    Router::new()
        .route(ENDPOINT_ITEMS, get(handle_inventory).post(handle_put))
        .route(ENDPOINT_BULK, post(handle_bulk))
        .route("/items/:key", get(handle_get).delete(handle_delete))
        .route(ENDPOINT_STATS, get(handle_stats))
        .layer(Extension(store))
}

/// Serves `store` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    store: Arc<NodeStore>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn handle_get(
    Extension(store): Extension<Arc<NodeStore>>,
    Path(key): Path<String>,
) -> Response {
    match store.get(&key) {
        Some(value) => Json(ValueResponse { value }).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn handle_put(Extension(store): Extension<Arc<NodeStore>>, body: Bytes) -> StatusCode {
    let slot: Slot = match serde_json::from_slice(&body) {
        Ok(slot) => slot,
        Err(e) => {
            debug!(error = %e, "rejected malformed item");
            return StatusCode::BAD_REQUEST;
        }
    };
    match store.put(slot.key, slot.value) {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            debug!(error = %e, "rejected item");
            StatusCode::BAD_REQUEST
        }
    }
}

async fn handle_delete(
    Extension(store): Extension<Arc<NodeStore>>,
    Path(key): Path<String>,
) -> StatusCode {
    store.delete(&key);
    StatusCode::OK
}

async fn handle_inventory(Extension(store): Extension<Arc<NodeStore>>) -> Json<Inventory> {
    Json(store.all_items())
}

async fn handle_bulk(Extension(store): Extension<Arc<NodeStore>>, body: Bytes) -> StatusCode {
    let items: Vec<Slot> = match serde_json::from_slice(&body) {
        Ok(items) => items,
        Err(e) => {
            debug!(error = %e, "rejected malformed batch");
            return StatusCode::BAD_REQUEST;
        }
    };
    let received = items.len();
    let stored = store.bulk_put(items);
    debug!(received, stored, "bulk write");
    StatusCode::OK
}

async fn handle_stats(Extension(store): Extension<Arc<NodeStore>>) -> Json<StoreStats> {
    Json(store.stats())
}
