//! Builders for the per-connection key-value routes.
//!
//! Keys are embedded as one percent-encoded path segment, so a key such as
//! `a/b c` travels as `a%2Fb%20c` and round-trips exactly, slashes and all.

use crate::models::{ApiResponse, KVDeleteResponse, KVGetResponse, KVListResponse, KVSetRequest};

use super::client::ApiClient;
use super::encode_body;
use super::errors::ApiError;

pub async fn list_keys(
    client: &ApiClient,
    connection_id: u64,
    prefix: Option<&str>,
) -> Result<ApiResponse<KVListResponse>, ApiError> {
    let mut url = client.endpoint(&["connections", &connection_id.to_string(), "kv"]);
    if let Some(prefix) = prefix {
        url.query_pairs_mut().append_pair("prefix", prefix);
    }
    client.get(url).await
}

pub async fn get_value(
    client: &ApiClient,
    connection_id: u64,
    key: &str,
) -> Result<ApiResponse<KVGetResponse>, ApiError> {
    let url = client.endpoint(&["connections", &connection_id.to_string(), "kv", key]);
    client.get(url).await
}

pub async fn set_value(
    client: &ApiClient,
    connection_id: u64,
    key: &str,
    value: serde_json::Value,
) -> Result<ApiResponse<KVGetResponse>, ApiError> {
    let url = client.endpoint(&["connections", &connection_id.to_string(), "kv", key]);
    let body = encode_body(&KVSetRequest { value })?;
    client.put(url, Some(body)).await
}

pub async fn delete_key(
    client: &ApiClient,
    connection_id: u64,
    key: &str,
) -> Result<ApiResponse<KVDeleteResponse>, ApiError> {
    let url = client.endpoint(&["connections", &connection_id.to_string(), "kv", key]);
    client.delete(url).await
}
