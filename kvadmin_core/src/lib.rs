pub mod api;
pub mod core;
pub mod models;
pub mod storage;
pub mod utils;

// re-export ergonomic entry points
pub use crate::api::client::{ApiClient, SessionEvent};
pub use crate::api::errors::ApiError;
pub use crate::core::context::AppContext;
pub use crate::core::registry::ConnectionRegistry;
pub use crate::core::session::SessionManager;
pub use crate::storage::store::ClientStore;
