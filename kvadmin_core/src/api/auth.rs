//! Builders for the `/auth` routes.

use crate::models::{ApiResponse, LoginRequest, LoginResponse, RegisterRequest, User};

use super::client::ApiClient;
use super::encode_body;
use super::errors::ApiError;

pub async fn login(
    client: &ApiClient,
    credentials: &LoginRequest,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let url = client.endpoint(&["auth", "login"]);
    client.post(url, Some(encode_body(credentials)?)).await
}

pub async fn register(
    client: &ApiClient,
    profile: &RegisterRequest,
) -> Result<ApiResponse<User>, ApiError> {
    let url = client.endpoint(&["auth", "register"]);
    client.post(url, Some(encode_body(profile)?)).await
}

pub async fn profile(client: &ApiClient) -> Result<ApiResponse<User>, ApiError> {
    let url = client.endpoint(&["auth", "profile"]);
    client.get(url).await
}

pub async fn logout(client: &ApiClient) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let url = client.endpoint(&["auth", "logout"]);
    client.post(url, None).await
}
