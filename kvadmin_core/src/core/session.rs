use std::io;
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::RwLock;

use crate::api::auth;
use crate::api::client::ApiClient;
use crate::api::errors::ApiError;
use crate::models::{LoginRequest, RegisterRequest, User};
use crate::storage::store::ClientStore;

use super::registry::ConnectionRegistry;

/// Owns the authenticated identity of the running client: token presence
/// (the token itself lives in the gateway's cell so it can be attached to
/// every request) and the user profile.
///
/// All operations resolve to a value; nothing here panics past its boundary.
/// Overlapping calls are not serialized: the last completed write to
/// token/user wins, which is benign because every operation is idempotent
/// with respect to final state for the same credentials.
pub struct SessionManager {
    client: Arc<ApiClient>,
    registry: ConnectionRegistry,
    store: ClientStore,
    user: RwLock<Option<User>>,
    loading: RwLock<bool>,
    last_error: RwLock<Option<String>>,
}

impl SessionManager {
    pub fn new(client: Arc<ApiClient>, registry: ConnectionRegistry, store: ClientStore) -> Self {
        Self {
            client,
            registry,
            store,
            user: RwLock::new(None),
            loading: RwLock::new(false),
            last_error: RwLock::new(None),
        }
    }

    /// Restores token and user from durable storage at startup. The user is
    /// only restored when a token is present; a cached profile without a
    /// token would violate the session invariant.
    pub async fn initialize(&self) -> io::Result<()> {
        let token = self.store.load_token()?;
        let restored = token.is_some();
        self.client.set_token(token).await;
        if restored {
            *self.user.write().await = self.store.load_user()?;
            info!("restored session from durable storage");
        }
        Ok(())
    }

    /// Authenticates and, on success, atomically installs token and user and
    /// persists both as a pair. On failure the prior session state is left
    /// untouched.
    pub async fn login(&self, credentials: LoginRequest) -> Result<(), ApiError> {
        self.begin().await;
        let result = self.try_login(&credentials).await;
        self.finish(&result).await;
        result
    }

    async fn try_login(&self, credentials: &LoginRequest) -> Result<(), ApiError> {
        let envelope = auth::login(&self.client, credentials).await?;
        let Some(payload) = envelope.data else {
            let message = if envelope.message.is_empty() {
                "login failed".to_string()
            } else {
                envelope.message
            };
            return Err(ApiError::Rejected(message));
        };
        self.client.set_token(Some(payload.token.clone())).await;
        *self.user.write().await = Some(payload.user.clone());
        if let Err(e) = self.store.save_session(&payload.token, &payload.user) {
            warn!("could not persist session: {e}");
        }
        info!("logged in as '{}'", payload.user.username);
        Ok(())
    }

    /// Creates an account. Session state is untouched either way; the user
    /// still has to log in afterwards.
    pub async fn register(&self, profile: RegisterRequest) -> Result<(), ApiError> {
        self.begin().await;
        let result = auth::register(&self.client, &profile).await.map(|_| ());
        self.finish(&result).await;
        result
    }

    /// Ends the session. The remote call is fire-and-forget by policy: the
    /// user's intent to leave the authenticated state outranks confirming
    /// server-side acknowledgment, so its failure is logged and swallowed.
    /// Local state and the durable copies are cleared unconditionally, which
    /// also makes a second logout a harmless no-op.
    pub async fn logout(&self) {
        *self.loading.write().await = true;
        if let Err(e) = auth::logout(&self.client).await {
            warn!("remote logout failed (ignored): {e}");
        }
        self.client.set_token(None).await;
        *self.user.write().await = None;
        if let Err(e) = self.store.clear_session() {
            warn!("could not clear stored session: {e}");
        }
        self.registry.clear_active_connections().await;
        *self.loading.write().await = false;
        info!("session cleared");
    }

    /// Refreshes the cached profile. A no-op without a token. An
    /// unauthorized classification forces a logout before the failure is
    /// surfaced; this is the only automatic logout trigger in this component.
    pub async fn fetch_profile(&self) -> Result<(), ApiError> {
        if self.client.token().await.is_none() {
            return Ok(());
        }
        self.begin().await;
        let result = self.try_fetch_profile().await;
        if matches!(result, Err(ApiError::Unauthorized(_))) {
            self.logout().await;
        }
        self.finish(&result).await;
        result
    }

    async fn try_fetch_profile(&self) -> Result<(), ApiError> {
        let envelope = auth::profile(&self.client).await?;
        if let Some(user) = envelope.data {
            if let Err(e) = self.store.save_user(&user) {
                warn!("could not persist user profile: {e}");
            }
            *self.user.write().await = Some(user);
        }
        Ok(())
    }

    /// Drops the in-memory profile after the gateway already invalidated the
    /// session (token cell and durable copies are cleared by then).
    pub(crate) async fn drop_local_state(&self) {
        *self.user.write().await = None;
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.client.token().await.is_some() && self.user.read().await.is_some()
    }

    pub async fn is_loading(&self) -> bool {
        *self.loading.read().await
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn clear_error(&self) {
        *self.last_error.write().await = None;
    }

    async fn begin(&self) {
        *self.loading.write().await = true;
        *self.last_error.write().await = None;
    }

    async fn finish(&self, result: &Result<(), ApiError>) {
        if let Err(e) = result {
            *self.last_error.write().await = Some(e.to_string());
        }
        *self.loading.write().await = false;
    }
}
