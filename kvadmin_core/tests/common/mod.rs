// Not every integration test binary uses every helper.
#![allow(dead_code)]

pub mod fake_transport;

use kvadmin_core::models::{Connection, User};
use serde_json::json;

/// Wraps a payload in the backend's success envelope.
pub fn success(data: serde_json::Value) -> serde_json::Value {
    json!({ "status": "success", "message": "OK", "data": data })
}

pub fn user_json(id: u64, username: &str) -> serde_json::Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "role": "admin",
        "is_active": true,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:00:00Z",
    })
}

pub fn user(id: u64, username: &str) -> User {
    serde_json::from_value(user_json(id, username)).expect("valid user fixture")
}

pub fn connection_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "endpoints": "[\"localhost:2379\"]",
        "tls_enabled": false,
        "is_active": true,
        "is_readonly": false,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:00:00Z",
    })
}

pub fn connection(id: u64, name: &str) -> Connection {
    serde_json::from_value(connection_json(id, name)).expect("valid connection fixture")
}
