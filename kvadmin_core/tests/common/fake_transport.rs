//! A deterministic in-process stand-in for the gateway's
//! [`kvadmin_core::api::transport::HttpTransport`] seam.
//!
//! *  **From the test's perspective**
//!    * Script what the "server" answers with `push_json` / `push_body` /
//!      `push_failure`, in order.
//!    * Inspect every request the gateway sent via `requests()` /
//!      `last_request()`.
//!
//! *  **Why this exists**: it lets integration tests exercise the *real*
//!    classification, invalidation, and state machinery without a backend
//!    listening on a socket.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use kvadmin_core::api::errors::ApiError;
use kvadmin_core::api::transport::{HttpTransport, TransportRequest, TransportResponse};

pub struct FakeTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, ApiError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script a JSON reply with the given HTTP status.
    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push_body(status, &body.to_string());
    }

    /// Script a reply with an arbitrary body (e.g. a non-JSON 502 page).
    pub fn push_body(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .expect("response queue poisoned")
            .push_back(Ok(TransportResponse {
                status,
                body: body.as_bytes().to_vec(),
            }));
    }

    /// Script a network-level failure (connection refused, timeout, ...).
    pub fn push_failure(&self, message: &str) {
        self.responses
            .lock()
            .expect("response queue poisoned")
            .push_back(Err(ApiError::Transport(message.to_string())));
    }

    /// Every request the gateway sent, in order, kept for assertions.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests()
            .last()
            .cloned()
            .expect("no request was recorded")
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ApiError> {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(request.clone());
        self.responses
            .lock()
            .expect("response queue poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted response left".into())))
    }
}
