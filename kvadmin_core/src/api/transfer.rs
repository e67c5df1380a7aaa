//! Builder for the cross-connection key transfer route.

use crate::models::{ApiResponse, TransferRequest, TransferResponse};

use super::client::ApiClient;
use super::encode_body;
use super::errors::ApiError;

/// Copies keys from one backend to another. A reply with status
/// `partial_success` still resolves as a success; the per-key failures are in
/// `errors` on the payload.
pub async fn transfer(
    client: &ApiClient,
    request: &TransferRequest,
) -> Result<ApiResponse<TransferResponse>, ApiError> {
    let url = client.endpoint(&["transfer"]);
    client.post(url, Some(encode_body(request)?)).await
}
