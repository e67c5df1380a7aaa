use std::sync::Arc;

use log::{debug, warn};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use tokio::sync::{broadcast, RwLock};

use crate::models::{ApiResponse, ResponseStatus};
use crate::storage::store::ClientStore;

use super::errors::ApiError;
use super::transport::{HttpTransport, TransportRequest, TransportResponse};

/// Broadcast to the UI shell when the gateway tears the session down.
///
/// This replaces an in-transport page redirect: the core never touches
/// presentation, it only announces that the login entry point should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// An authorization failure forced the session to be invalidated.
    Expired,
}

/// The single chokepoint every outbound call passes through.
///
/// Responsibilities, in order: attach the bearer token when one is held, run
/// the call over the [`HttpTransport`], classify the outcome, and unwrap the
/// response envelope. A 401 triggers forced invalidation (token cell and
/// durable session copies cleared, [`SessionEvent::Expired`] broadcast)
/// *before* the failure reaches the caller, no matter which logical operation
/// made the request.
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    base: Url,
    token: RwLock<Option<String>>,
    store: ClientStore,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        store: ClientStore,
    ) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base URL '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Transport(format!(
                "invalid base URL '{base_url}': cannot be used as a base"
            )));
        }
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            transport,
            base,
            token: RwLock::new(None),
            store,
            events,
        })
    }

    /// Subscribe to session lifecycle events (forced invalidation).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    /// Builds an absolute URL from path segments. Each segment is
    /// percent-encoded on its own, so keys containing `/`, whitespace, or
    /// control characters stay a single path segment and round-trip exactly.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new()` rejects cannot-be-a-base URLs, so this branch always runs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::GET, url, None).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::POST, url, body).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::PUT, url, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::DELETE, url, None).await
    }

    /// GET for the few endpoints that reply without the envelope
    /// (the backup export, which doubles as a downloadable file).
    pub async fn get_raw<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.dispatch(Method::GET, url, None).await?;
        decode(&response.body)
    }

    /// POST counterpart of [`get_raw`](Self::get_raw), for responses whose
    /// payload fields sit directly beside the status discriminator.
    pub async fn post_raw<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(Method::POST, url, body).await?;
        decode(&response.body)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = self.dispatch(method, url, body).await?;
        let envelope: ApiResponse<T> = decode(&response.body)?;
        if envelope.status == ResponseStatus::Error {
            // HTTP 200 with an embedded application error is possible and is
            // a failure, never a success.
            let message = if !envelope.message.is_empty() {
                envelope.message
            } else if let Some(detail) = envelope.error {
                detail
            } else {
                "request rejected by the server".to_string()
            };
            return Err(ApiError::Rejected(message));
        }
        Ok(envelope)
    }

    /// Sends the request and classifies the HTTP status. Everything except
    /// 401 propagates to the immediate caller; 401 runs the forced
    /// invalidation sequence first.
    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<TransportResponse, ApiError> {
        let bearer = self.token.read().await.clone();
        debug!("{method} {url}");
        let response = self
            .transport
            .execute(TransportRequest {
                method,
                url,
                bearer,
                body,
            })
            .await?;

        if response.status == 401 {
            let message =
                extract_message(&response.body).unwrap_or_else(|| "unauthorized".to_string());
            self.invalidate_session().await;
            return Err(ApiError::Unauthorized(message));
        }
        if !(200..300).contains(&response.status) {
            return Err(match extract_message(&response.body) {
                Some(message) => ApiError::Rejected(message),
                None => ApiError::Transport(format!(
                    "request failed with HTTP status {}",
                    response.status
                )),
            });
        }
        Ok(response)
    }

    /// Forced invalidation: clear the token cell and the durable session pair,
    /// then tell whoever is listening. Runs before the 401 is surfaced.
    async fn invalidate_session(&self) {
        warn!("authorization failure, invalidating session");
        *self.token.write().await = None;
        if let Err(e) = self.store.clear_session() {
            warn!("could not clear stored session: {e}");
        }
        let _ = self.events.send(SessionEvent::Expired);
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Transport(format!("could not decode response body: {e}")))
}

/// Best-effort extraction of the server's message from an error body.
fn extract_message(body: &[u8]) -> Option<String> {
    let envelope: ApiResponse<serde_json::Value> = serde_json::from_slice(body).ok()?;
    if !envelope.message.is_empty() {
        return Some(envelope.message);
    }
    envelope.error.filter(|detail| !detail.is_empty())
}
