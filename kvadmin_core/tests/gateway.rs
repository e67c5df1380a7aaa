use std::sync::Arc;
use std::time::Duration;

use kvadmin_core::api::errors::ApiError;
use kvadmin_core::api::{backup, connections, kv, transfer};
use kvadmin_core::models::{
    CreateConnectionRequest, ImportRequest, ResponseStatus, TransferRequest,
    UpdateConnectionRequest,
};
use kvadmin_core::{AppContext, ClientStore, SessionEvent};
use serde_json::json;
use tempfile::TempDir;
use tokio::time::{sleep, timeout, Instant};

mod common;
use common::fake_transport::FakeTransport;
use common::{connection, connection_json, success};

const BASE_URL: &str = "http://backend.test/api/v1";

fn harness() -> (AppContext, Arc<FakeTransport>, ClientStore, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ClientStore::with_dir(dir.path()).expect("store in tempdir");
    let transport = Arc::new(FakeTransport::new());
    let context = AppContext::with_transport(BASE_URL, store.clone(), transport.clone())
        .expect("context wires up");
    (context, transport, store, dir)
}

#[tokio::test]
async fn bearer_credential_is_attached_exactly_when_a_token_is_held() {
    let (context, transport, _store, _dir) = harness();

    transport.push_json(200, success(json!([])));
    connections::list(context.client()).await.expect("listed");
    assert_eq!(transport.last_request().bearer, None);

    context.client().set_token(Some("t1".into())).await;
    transport.push_json(200, success(json!([])));
    connections::list(context.client()).await.expect("listed");
    assert_eq!(transport.last_request().bearer.as_deref(), Some("t1"));
}

#[tokio::test]
async fn http_200_with_an_error_envelope_is_a_failure() {
    let (context, transport, _store, _dir) = harness();
    transport.push_json(
        200,
        json!({ "status": "error", "message": "Key not found or failed to get value" }),
    );

    let err = kv::get_value(context.client(), 1, "missing")
        .await
        .expect_err("embedded application error");

    assert!(matches!(err, ApiError::Rejected(ref m) if m.starts_with("Key not found")));
}

#[tokio::test]
async fn error_envelope_without_a_message_falls_back_to_the_detail_field() {
    let (context, transport, _store, _dir) = harness();
    transport.push_json(
        200,
        json!({ "status": "error", "message": "", "error": "etcdserver: permission denied" }),
    );

    let err = kv::get_value(context.client(), 1, "k")
        .await
        .expect_err("embedded application error");

    assert!(matches!(err, ApiError::Rejected(ref m) if m.contains("permission denied")));
}

#[tokio::test]
async fn non_2xx_with_a_server_message_is_a_business_rejection() {
    let (context, transport, _store, _dir) = harness();
    transport.push_json(
        403,
        json!({ "status": "error", "message": "Connection is read-only, cannot set values" }),
    );

    let err = kv::set_value(context.client(), 1, "k", json!("v"))
        .await
        .expect_err("read-only backend");

    assert!(matches!(err, ApiError::Rejected(ref m) if m.contains("read-only")));
}

#[tokio::test]
async fn non_2xx_without_an_envelope_is_a_transport_failure() {
    let (context, transport, _store, _dir) = harness();
    transport.push_body(502, "Bad Gateway");

    let err = connections::list(context.client())
        .await
        .expect_err("no envelope to interpret");

    assert!(matches!(err, ApiError::Transport(ref m) if m.contains("502")));
}

#[tokio::test]
async fn undecodable_success_body_is_a_transport_failure() {
    let (context, transport, _store, _dir) = harness();
    transport.push_body(200, "not json at all");

    let err = connections::list(context.client())
        .await
        .expect_err("body must decode");

    assert!(matches!(err, ApiError::Transport(ref m) if m.contains("decode")));
}

#[tokio::test]
async fn a_401_from_any_operation_tears_the_whole_session_down() {
    let (context, transport, store, _dir) = harness();
    context.client().set_token(Some("t1".into())).await;
    store
        .save_session("t1", &common::user(1, "alice"))
        .expect("seeded session");
    context
        .registry()
        .add_active_connection(connection(4, "prod"))
        .await;
    let mut events = context.subscribe();

    // Not a session-manager call: a plain key listing hits the 401.
    transport.push_json(401, json!({ "status": "error", "message": "Invalid token" }));
    let err = kv::list_keys(context.client(), 4, None)
        .await
        .expect_err("unauthorized");

    assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid token"));
    assert_eq!(context.client().token().await, None);
    assert_eq!(store.load_token().expect("readable"), None);
    assert_eq!(store.load_user().expect("readable"), None);

    let event = timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("event must arrive")
        .expect("channel open");
    assert!(matches!(event, SessionEvent::Expired));

    // The expiry listener clears the registry; give it a moment.
    let deadline = Instant::now() + Duration::from_secs(1);
    while !context.registry().active_connections().await.is_empty() {
        assert!(Instant::now() < deadline, "registry was never cleared");
        sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(context.registry().current_connection_id().await, None);
}

#[tokio::test]
async fn kv_keys_travel_as_a_single_percent_encoded_path_segment() {
    let (context, transport, _store, _dir) = harness();

    transport.push_json(200, success(json!({ "key": "a/b c", "value": 1 })));
    kv::get_value(context.client(), 7, "a/b c")
        .await
        .expect("value fetched");
    assert_eq!(
        transport.last_request().url.path(),
        "/api/v1/connections/7/kv/a%2Fb%20c"
    );

    transport.push_json(200, success(json!({ "key": "a/b c", "value": 1 })));
    kv::set_value(context.client(), 7, "a/b c", json!(1))
        .await
        .expect("value written");
    assert_eq!(
        transport.last_request().url.path(),
        "/api/v1/connections/7/kv/a%2Fb%20c"
    );

    transport.push_json(200, success(json!({ "key": "a/b c" })));
    let deleted = kv::delete_key(context.client(), 7, "a/b c")
        .await
        .expect("key deleted");
    assert_eq!(
        transport.last_request().url.path(),
        "/api/v1/connections/7/kv/a%2Fb%20c"
    );

    // The echoed key decodes back to the original form.
    assert_eq!(deleted.data.expect("payload").key, "a/b c");
}

#[tokio::test]
async fn key_listing_sends_the_prefix_as_a_query_pair() {
    let (context, transport, _store, _dir) = harness();
    transport.push_json(200, success(json!({ "keys": ["app/a", "app/b"] })));

    let envelope = kv::list_keys(context.client(), 7, Some("app/"))
        .await
        .expect("keys listed");

    let request = transport.last_request();
    assert_eq!(request.url.path(), "/api/v1/connections/7/kv");
    assert_eq!(request.url.query(), Some("prefix=app%2F"));
    assert_eq!(envelope.data.expect("payload").keys.len(), 2);
}

#[tokio::test]
async fn backup_export_decodes_the_bare_payload() {
    let (context, transport, _store, _dir) = harness();
    transport.push_json(
        200,
        json!({
            "connection_name": "prod",
            "connection_id": 7,
            "export_time": "2024-05-01T10:00:00Z",
            "data": { "app/a": "1" },
        }),
    );

    let dump = backup::export(context.client(), 7)
        .await
        .expect("export succeeds");

    assert_eq!(
        transport.last_request().url.path(),
        "/api/v1/connections/7/backup/export"
    );
    assert_eq!(dump.connection_name, "prod");
    assert_eq!(dump.data.len(), 1);
}

#[tokio::test]
async fn backup_import_reads_the_flattened_counters() {
    let (context, transport, _store, _dir) = harness();
    transport.push_json(
        200,
        json!({
            "status": "success",
            "message": "Import completed",
            "success_count": 3,
            "error_count": 0,
        }),
    );

    let mut data = serde_json::Map::new();
    data.insert("app/a".into(), json!("1"));
    let outcome = backup::import(
        context.client(),
        7,
        &ImportRequest {
            data,
            overwrite: false,
        },
    )
    .await
    .expect("import succeeds");

    assert_eq!(
        transport.last_request().url.path(),
        "/api/v1/connections/7/backup/import"
    );
    assert_eq!(outcome.status, ResponseStatus::Success);
    assert_eq!(outcome.success_count, 3);
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn partial_transfer_success_is_not_an_error() {
    let (context, transport, _store, _dir) = harness();
    transport.push_json(
        200,
        json!({
            "status": "partial_success",
            "message": "Transfer completed with some errors",
            "data": {
                "success_count": 2,
                "error_count": 1,
                "skipped_count": 0,
                "errors": ["Failed to set key app/c: timeout"],
            },
        }),
    );

    let envelope = transfer::transfer(
        context.client(),
        &TransferRequest {
            source_connection_id: 1,
            target_connection_id: 2,
            keys: None,
            prefix: Some("app/".into()),
            overwrite: true,
            key_mapping: false,
            source_prefix: None,
            target_prefix: None,
        },
    )
    .await
    .expect("partial success is still a success");

    assert_eq!(envelope.status, ResponseStatus::PartialSuccess);
    let payload = envelope.data.expect("payload");
    assert_eq!(payload.error_count, 1);
}

#[tokio::test]
async fn connection_writes_send_the_endpoint_list_as_an_array() {
    let (context, transport, _store, _dir) = harness();

    transport.push_json(200, success(connection_json(3, "prod")));
    connections::create(
        context.client(),
        &CreateConnectionRequest {
            name: "prod".into(),
            endpoints: vec!["localhost:2379".into(), "localhost:22379".into()],
            username: None,
            password: None,
            description: Some("primary cluster".into()),
            is_readonly: Some(false),
        },
    )
    .await
    .expect("created");

    let request = transport.last_request();
    assert_eq!(request.url.path(), "/api/v1/connections");
    assert_eq!(request.method, reqwest::Method::POST);
    let body = request.body.expect("create body");
    assert_eq!(body["endpoints"], json!(["localhost:2379", "localhost:22379"]));
    // Absent optionals stay off the wire entirely.
    assert!(body.get("username").is_none());

    transport.push_json(200, success(connection_json(3, "prod")));
    connections::update(
        context.client(),
        3,
        &UpdateConnectionRequest {
            name: "prod".into(),
            endpoints: vec!["localhost:2379".into()],
            username: None,
            password: None,
            description: None,
            is_readonly: Some(true),
        },
    )
    .await
    .expect("updated");

    let request = transport.last_request();
    assert_eq!(request.url.path(), "/api/v1/connections/3");
    assert_eq!(request.method, reqwest::Method::PUT);
}

#[tokio::test]
async fn connection_crud_builders_hit_the_expected_routes() {
    let (context, transport, _store, _dir) = harness();

    transport.push_json(200, success(connection_json(3, "prod")));
    connections::get(context.client(), 3).await.expect("got");
    assert_eq!(transport.last_request().url.path(), "/api/v1/connections/3");

    transport.push_json(200, success(json!({ "status": "success", "message": "ok" })));
    connections::test(context.client(), 3).await.expect("probed");
    let request = transport.last_request();
    assert_eq!(request.url.path(), "/api/v1/connections/3/test");
    assert_eq!(request.method, reqwest::Method::POST);

    transport.push_json(200, success(json!(null)));
    connections::delete(context.client(), 3).await.expect("deleted");
    let request = transport.last_request();
    assert_eq!(request.url.path(), "/api/v1/connections/3");
    assert_eq!(request.method, reqwest::Method::DELETE);
}
