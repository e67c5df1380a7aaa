use std::io;
use std::sync::Arc;

use log::info;
use tokio::sync::broadcast;

use crate::api::client::{ApiClient, SessionEvent};
use crate::api::errors::ApiError;
use crate::api::transport::{HttpTransport, ReqwestTransport};
use crate::storage::store::ClientStore;

use super::registry::ConnectionRegistry;
use super::session::SessionManager;

/// Composition root. Owns the wiring between store, transport, gateway,
/// session manager, and connection registry; the rest of the application
/// receives a handle to this rather than reaching for globals.
///
/// Created once at startup, cloned freely (all parts are shared handles),
/// torn down at process exit.
#[derive(Clone)]
pub struct AppContext {
    client: Arc<ApiClient>,
    session: Arc<SessionManager>,
    registry: ConnectionRegistry,
}

impl AppContext {
    /// Wires the production stack against `base_url`
    /// (e.g. `http://localhost:8080/api/v1`).
    pub fn new(base_url: &str, store: ClientStore) -> Result<Self, ApiError> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Self::with_transport(base_url, store, transport)
    }

    /// Same wiring over an arbitrary transport; tests hand in a scripted
    /// fake here.
    pub fn with_transport(
        base_url: &str,
        store: ClientStore,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ApiError> {
        let client = Arc::new(ApiClient::new(base_url, transport, store.clone())?);
        let registry = ConnectionRegistry::new(store.clone());
        let session = Arc::new(SessionManager::new(
            client.clone(),
            registry.clone(),
            store,
        ));
        let context = Self {
            client,
            session,
            registry,
        };
        context.spawn_expiry_listener();
        Ok(context)
    }

    /// Restores durable state: session first, then the previously open
    /// connections (which all come back as `connecting`).
    pub async fn initialize(&self) -> io::Result<()> {
        self.session.initialize().await?;
        self.registry.restore().await
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// The gateway, for the thin request builders in [`crate::api`].
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Session lifecycle events for the UI shell (show the login screen on
    /// [`SessionEvent::Expired`] instead of the core redirecting anything).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.client.subscribe()
    }

    /// A 401 can come out of any request, not just the session manager's
    /// own; this listener makes sure the in-memory profile and the open
    /// connections go away whenever the gateway invalidates the session.
    fn spawn_expiry_listener(&self) {
        let mut events = self.client.subscribe();
        let session = self.session.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired) => {
                        info!("session expired, dropping local state");
                        session.drop_local_state().await;
                        registry.clear_active_connections().await;
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}
