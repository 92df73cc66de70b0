//! Client side of the node store's network surface.
//!
//! `NodeClient` is the seam between the coordinator and the storage nodes:
//! routing and migration only ever reach a node store through it, so tests
//! can swap the HTTP transport for in-process stores.

use crate::error::StreamingError;
use crate::protocol::{Inventory, Slot, StoreStats, ValueResponse};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default bound on every node call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Logical operations a node store exposes over the network.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Read one item. `Ok(None)` means the node does not hold `key`.
    async fn get(&self, address: &str, key: &str) -> Result<Option<String>, StreamingError>;

    /// Upsert one item.
    async fn put(&self, address: &str, key: &str, value: &str) -> Result<(), StreamingError>;

    /// Delete one item. Deleting an absent key succeeds.
    async fn delete(&self, address: &str, key: &str) -> Result<(), StreamingError>;

    /// Full key/value inventory.
    async fn fetch_all(&self, address: &str) -> Result<Inventory, StreamingError>;

    /// Write a batch of items in one call.
    async fn bulk_put(&self, address: &str, items: &[Slot]) -> Result<(), StreamingError>;

    /// Slot count and fill level.
    async fn stats(&self, address: &str) -> Result<StoreStats, StreamingError>;
}

/// `NodeClient` over HTTP/JSON, with every request bounded by a timeout.
#[derive(Debug, Clone)]
pub struct HttpNodeClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl Default for HttpNodeClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpNodeClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(
        &self,
        address: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StreamingError> {
        request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| StreamingError::transport(address, e))
    }
}

/// `address` with `segments` appended as percent-encoded path segments.
fn node_url(address: &str, segments: &[&str]) -> Result<Url, StreamingError> {
    let invalid = || StreamingError::InvalidAddress(address.to_string());
    let mut url = Url::parse(address).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn expect_success(
    address: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, StreamingError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(StreamingError::Status {
            address: address.to_string(),
            status: response.status().as_u16(),
        })
    }
}

async fn decode<T: DeserializeOwned>(
    address: &str,
    response: reqwest::Response,
) -> Result<T, StreamingError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| StreamingError::transport(address, e))?;
    serde_json::from_slice(&body).map_err(|source| StreamingError::Decode {
        address: address.to_string(),
        source,
    })
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn get(&self, address: &str, key: &str) -> Result<Option<String>, StreamingError> {
        let url = node_url(address, &["items", key])?;
        let response = self.send(address, self.http.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = expect_success(address, response)?;
        let body: ValueResponse = decode(address, response).await?;
        Ok(Some(body.value))
    }

    async fn put(&self, address: &str, key: &str, value: &str) -> Result<(), StreamingError> {
        let url = node_url(address, &["items"])?;
        let response = self
            .send(address, self.http.post(url).json(&Slot::new(key, value)))
            .await?;
        expect_success(address, response)?;
        Ok(())
    }

    async fn delete(&self, address: &str, key: &str) -> Result<(), StreamingError> {
        let url = node_url(address, &["items", key])?;
        let response = self.send(address, self.http.delete(url)).await?;
        expect_success(address, response)?;
        Ok(())
    }

    async fn fetch_all(&self, address: &str) -> Result<Inventory, StreamingError> {
        let url = node_url(address, &["items"])?;
        let response = self.send(address, self.http.get(url)).await?;
        let response = expect_success(address, response)?;
        decode(address, response).await
    }

    async fn bulk_put(&self, address: &str, items: &[Slot]) -> Result<(), StreamingError> {
        let url = node_url(address, &["bulk"])?;
        let response = self.send(address, self.http.post(url).json(items)).await?;
        expect_success(address, response)?;
        Ok(())
    }

    async fn stats(&self, address: &str) -> Result<StoreStats, StreamingError> {
        let url = node_url(address, &["stats"])?;
        let response = self.send(address, self.http.get(url)).await?;
        let response = expect_success(address, response)?;
        decode(address, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_url_appends_segments() {
        let url = node_url("http://10.0.0.1:8080", &["items", "k1"]).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.1:8080/items/k1");

        let url = node_url("http://10.0.0.1:8080/", &["stats"]).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.1:8080/stats");
    }

    #[test]
    fn test_node_url_encodes_keys() {
        let url = node_url("http://node:8080", &["items", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://node:8080/items/a%20b%2Fc");
    }

    #[test]
    fn test_node_url_rejects_garbage() {
        assert!(matches!(
            node_url("not a url", &["items"]),
            Err(StreamingError::InvalidAddress(_))
        ));
    }
}
