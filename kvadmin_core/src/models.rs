use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminator carried by every response envelope.
///
/// `PartialSuccess` is emitted by the bulk transfer endpoint when some keys
/// failed; it still counts as a non-error outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    PartialSuccess,
    Error,
}

/// The envelope the backend wraps (almost) every response in:
/// `{ "status": "...", "message": "...", "data": ..., "error": "..." }`.
///
/// A 2xx reply whose `status` reads `error` is still a failure; the gateway
/// never hands such an envelope to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Account profile as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A configured remote key-value backend, as stored server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: u64,
    pub name: String,
    /// JSON-array string such as `["localhost:2379"]`; the backend stores the
    /// endpoint list in this form and echoes it back verbatim.
    pub endpoints: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub tls_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_readonly: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    /// Decodes the stored endpoint list; malformed data yields an empty list.
    pub fn endpoint_list(&self) -> Vec<String> {
        serde_json::from_str(&self.endpoints).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConnectionRequest {
    pub name: String,
    pub endpoints: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_readonly: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConnectionRequest {
    pub name: String,
    pub endpoints: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_readonly: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConnectionResponse {
    pub status: ResponseStatus,
    pub message: String,
}

/// Live client-side state of one open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// A [`Connection`] currently opened by this client, annotated with its
/// ephemeral status. Statuses never survive a restart; a connection always
/// re-registers as `connecting`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveConnection {
    #[serde(flatten)]
    pub connection: Connection,
    pub status: ConnectionStatus,
    /// Human-readable detail, present only while `status` is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActiveConnection {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            status: ConnectionStatus::Connecting,
            error: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.connection.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KVListResponse {
    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KVGetResponse {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KVSetRequest {
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KVDeleteResponse {
    pub key: String,
}

/// Full dump of one backend, as produced by the export endpoint. This is the
/// one payload the server sends bare, without the [`ApiResponse`] envelope
/// (it doubles as a downloadable file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupData {
    pub connection_name: String,
    pub connection_id: u64,
    pub export_time: DateTime<Utc>,
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub data: serde_json::Map<String, serde_json::Value>,
    pub overwrite: bool,
}

/// Import result; the server flattens the counters into the envelope itself,
/// so this type carries the discriminator fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: String,
    pub success_count: u64,
    pub error_count: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub source_connection_id: u64,
    pub target_connection_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    pub overwrite: bool,
    #[serde(default)]
    pub key_mapping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub success_count: u64,
    pub error_count: u64,
    pub skipped_count: u64,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub details: Vec<String>,
}
