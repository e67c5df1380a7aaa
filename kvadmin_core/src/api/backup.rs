//! Builders for the per-connection backup routes.

use crate::models::{BackupData, ImportRequest, ImportResponse};

use super::client::ApiClient;
use super::encode_body;
use super::errors::ApiError;

/// Full dump of a backend. The server sends this payload bare (it doubles as
/// a downloadable file), so it bypasses the envelope.
pub async fn export(client: &ApiClient, connection_id: u64) -> Result<BackupData, ApiError> {
    let url = client.endpoint(&["connections", &connection_id.to_string(), "backup", "export"]);
    client.get_raw(url).await
}

/// Imports a previously exported dump. The counters come back flattened into
/// the envelope, hence the raw decoding.
pub async fn import(
    client: &ApiClient,
    connection_id: u64,
    request: &ImportRequest,
) -> Result<ImportResponse, ApiError> {
    let url = client.endpoint(&["connections", &connection_id.to_string(), "backup", "import"]);
    client.post_raw(url, Some(encode_body(request)?)).await
}
