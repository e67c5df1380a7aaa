//! Request plumbing: the authenticated gateway plus thin per-resource
//! builders for the backend's `/api/v1` routes.

pub mod auth;
pub mod backup;
pub mod client;
pub mod connections;
pub mod errors;
pub mod kv;
pub mod transfer;
pub mod transport;

use serde::Serialize;

use self::errors::ApiError;

/// Encodes a request body for the gateway.
pub(crate) fn encode_body<T: Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::Transport(format!("could not encode request body: {e}")))
}
