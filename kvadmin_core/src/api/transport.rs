use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};

use super::errors::ApiError;

/// One outbound call, already fully described: verb, absolute URL, optional
/// bearer credential, optional JSON body.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

/// What came back, before any envelope interpretation.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The seam between the gateway and the actual network.
///
/// Production uses [`ReqwestTransport`]; integration tests substitute a
/// scripted fake so the real classification and state machinery runs without
/// a server.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ApiError>;
}

/// Real HTTP transport backed by a shared `reqwest` client.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds the client with a 10 second request timeout, matching what the
    /// admin tool has always used.
    pub fn new() -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ApiError> {
        let mut builder = self.http.request(request.method, request.url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(TransportResponse { status, body })
    }
}
