//! Builders for the `/connections` CRUD routes and the connectivity probe.

use crate::models::{
    ApiResponse, Connection, CreateConnectionRequest, TestConnectionResponse,
    UpdateConnectionRequest,
};

use super::client::ApiClient;
use super::encode_body;
use super::errors::ApiError;

pub async fn list(client: &ApiClient) -> Result<ApiResponse<Vec<Connection>>, ApiError> {
    let url = client.endpoint(&["connections"]);
    client.get(url).await
}

pub async fn get(client: &ApiClient, id: u64) -> Result<ApiResponse<Connection>, ApiError> {
    let url = client.endpoint(&["connections", &id.to_string()]);
    client.get(url).await
}

pub async fn create(
    client: &ApiClient,
    request: &CreateConnectionRequest,
) -> Result<ApiResponse<Connection>, ApiError> {
    let url = client.endpoint(&["connections"]);
    client.post(url, Some(encode_body(request)?)).await
}

pub async fn update(
    client: &ApiClient,
    id: u64,
    request: &UpdateConnectionRequest,
) -> Result<ApiResponse<Connection>, ApiError> {
    let url = client.endpoint(&["connections", &id.to_string()]);
    client.put(url, Some(encode_body(request)?)).await
}

pub async fn delete(
    client: &ApiClient,
    id: u64,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let url = client.endpoint(&["connections", &id.to_string()]);
    client.delete(url).await
}

/// Connectivity probe; the registry feeds its result into the status of the
/// matching [`ActiveConnection`](crate::models::ActiveConnection).
pub async fn test(
    client: &ApiClient,
    id: u64,
) -> Result<ApiResponse<TestConnectionResponse>, ApiError> {
    let url = client.endpoint(&["connections", &id.to_string(), "test"]);
    client.post(url, None).await
}
