use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::models::{ActiveConnection, Connection, ConnectionStatus};
use crate::storage::store::ClientStore;

struct RegistryState {
    connections: HashMap<u64, ActiveConnection>,
    current: Option<u64>,
}

/// Tracks the connections opened in this client session and the single
/// "current" one the rest of the application operates against.
///
/// Invariant, enforced inside one critical section per operation: `current`
/// is `None` iff the map is empty, and otherwise names a key present in the
/// map. Statuses are ephemeral; only the plain connection configs are
/// persisted through the store, and everything re-registers as `connecting`.
///
/// Cloning is cheap and shares the underlying state, the same way the rest of
/// the application shares one registry handle per component.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<RegistryState>>,
    store: ClientStore,
}

impl ConnectionRegistry {
    pub fn new(store: ClientStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryState {
                connections: HashMap::new(),
                current: None,
            })),
            store,
        }
    }

    /// Registers (or re-registers) a connection as open, with a fresh
    /// `connecting` status. The first connection opened becomes current.
    pub async fn add_active_connection(&self, connection: Connection) {
        let mut state = self.inner.lock().await;
        let id = connection.id;
        debug!("registering connection {id} as active");
        state.connections.insert(id, ActiveConnection::new(connection));
        if state.current.is_none() {
            state.current = Some(id);
        }
        self.persist(&state);
    }

    /// Drops a connection from the registry. When the current connection is
    /// removed, the lowest remaining id takes over; the tie-break is
    /// deliberate so the fallback never depends on map iteration order.
    pub async fn remove_active_connection(&self, id: u64) {
        let mut state = self.inner.lock().await;
        state.connections.remove(&id);
        if state.current == Some(id) {
            state.current = state.connections.keys().min().copied();
            if let Some(next) = state.current {
                info!("current connection {id} removed, switching to {next}");
            }
        }
        self.persist(&state);
    }

    /// Makes `id` current. A no-op when the id is not registered; the UI can
    /// race a concurrent removal and that is not an error.
    pub async fn set_current_connection(&self, id: u64) {
        let mut state = self.inner.lock().await;
        if state.connections.contains_key(&id) {
            state.current = Some(id);
        } else {
            debug!("ignoring switch to unknown connection {id}");
        }
    }

    /// Updates the live status of a connection. The error detail survives
    /// only while the status is `error`; any transition away clears it.
    /// No-op when the connection was already removed.
    pub async fn update_connection_status(
        &self,
        id: u64,
        status: ConnectionStatus,
        error: Option<String>,
    ) {
        let mut state = self.inner.lock().await;
        if let Some(active) = state.connections.get_mut(&id) {
            active.status = status;
            active.error = match status {
                ConnectionStatus::Error => error,
                _ => None,
            };
        } else {
            debug!("ignoring status update for unknown connection {id}");
        }
    }

    /// The connection the application currently operates against, if any.
    pub async fn get_current_connection(&self) -> Option<ActiveConnection> {
        let state = self.inner.lock().await;
        let id = state.current?;
        state.connections.get(&id).cloned()
    }

    pub async fn current_connection_id(&self) -> Option<u64> {
        self.inner.lock().await.current
    }

    /// Snapshot of every open connection, sorted by id.
    pub async fn active_connections(&self) -> Vec<ActiveConnection> {
        let state = self.inner.lock().await;
        let mut connections: Vec<ActiveConnection> = state.connections.values().cloned().collect();
        connections.sort_by_key(|active| active.id());
        connections
    }

    /// Empties the registry. Connections are scoped to the authenticated
    /// session and must not survive it, so this runs on every logout, forced
    /// or not.
    pub async fn clear_active_connections(&self) {
        let mut state = self.inner.lock().await;
        state.connections.clear();
        state.current = None;
        self.persist(&state);
    }

    /// Re-registers the connections cached by the previous run. Statuses are
    /// not restored; everything comes back as `connecting`.
    pub async fn restore(&self) -> std::io::Result<()> {
        let cached = self.store.load_connections()?;
        for connection in cached {
            self.add_active_connection(connection).await;
        }
        Ok(())
    }

    fn persist(&self, state: &RegistryState) {
        let mut configs: Vec<Connection> = state
            .connections
            .values()
            .map(|active| active.connection.clone())
            .collect();
        configs.sort_by_key(|connection| connection.id);
        if let Err(e) = self.store.save_connections(&configs) {
            warn!("could not persist open connection list: {e}");
        }
    }
}
