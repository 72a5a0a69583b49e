#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use common::FakeTransport;
use docgate_gateway::remote::{
    DocumentClient, Endpoint, HttpMethod, RawResponse, RequestPipeline, ResponseCache,
    TransportError,
};

fn pipeline(transport: Arc<FakeTransport>) -> RequestPipeline {
    pipeline_with_cache(transport).0
}

fn pipeline_with_cache(transport: Arc<FakeTransport>) -> (RequestPipeline, Arc<ResponseCache>) {
    let cache = Arc::new(ResponseCache::new(Duration::from_secs(300), 100));
    (RequestPipeline::new(transport, None, Some(cache.clone())), cache)
}

#[tokio::test]
async fn cached_read_skips_the_network() {
    let t = FakeTransport::new(r#"{"data": {"name": "ITEM-001"}}"#);
    let p = pipeline(t.clone());

    let first = p
        .execute(HttpMethod::Get, Endpoint::document("Item", "ITEM-001"), None, true)
        .await
        .unwrap();
    let second = p
        .execute(HttpMethod::Get, Endpoint::document("Item", "ITEM-001"), None, true)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(t.call_count(), 1);
}

/// Records each event's fields as (name, debug-rendered value) pairs.
#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<Vec<(String, String)>>>>);

struct Fields(Vec<(String, String)>);

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
}

impl<S: tracing::Subscriber> Layer<S> for EventLog {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = Fields(Vec::new());
        event.record(&mut fields);
        self.0.lock().unwrap().push(fields.0);
    }
}

#[tokio::test]
async fn cache_hits_are_logged_with_elapsed_time() {
    let log = EventLog::default();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(log.clone()));

    let t = FakeTransport::new(r#"{"data": []}"#);
    let p = pipeline(t.clone());
    for _ in 0..2 {
        p.execute(HttpMethod::Get, Endpoint::resource("Item"), None, true)
            .await
            .unwrap();
    }
    assert_eq!(t.call_count(), 1);

    let events = log.0.lock().unwrap().clone();
    let has = |fields: &Vec<(String, String)>, name: &str| fields.iter().any(|(n, _)| n == name);
    let message = |fields: &Vec<(String, String)>| {
        fields
            .iter()
            .find(|(n, _)| n == "message")
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };

    let hit = events
        .iter()
        .find(|f| message(f) == "cache hit")
        .expect("cache hit event");
    assert!(has(hit, "elapsed_ms"));
    assert!(has(hit, "endpoint"));

    let call = events
        .iter()
        .find(|f| message(f) == "remote call")
        .expect("remote call event");
    assert!(has(call, "elapsed_ms"));
    assert!(has(call, "status"));
}

#[tokio::test]
async fn opted_out_reads_always_hit_the_network() {
    let t = FakeTransport::new(r#"{"message": "ok"}"#);
    let (p, cache) = pipeline_with_cache(t.clone());
    for _ in 0..2 {
        p.execute(HttpMethod::Get, Endpoint::method("ping"), None, false)
            .await
            .unwrap();
    }
    assert_eq!(t.call_count(), 2);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn writes_are_never_cached() {
    let t = FakeTransport::new(r#"{"data": {}}"#);
    let (p, cache) = pipeline_with_cache(t.clone());
    let body = json!({ "item_code": "X" });
    for _ in 0..2 {
        p.execute(HttpMethod::Post, Endpoint::resource("Item"), Some(body.clone()), true)
            .await
            .unwrap();
    }
    assert_eq!(t.call_count(), 2);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn non_success_status_is_a_remote_error() {
    let t = FakeTransport::new("{}");
    t.push(Ok(RawResponse {
        status: 404,
        body: r#"{"exc_type": "DoesNotExistError"}"#.into(),
    }));
    let (p, cache) = pipeline_with_cache(t.clone());

    let err = p
        .execute(HttpMethod::Get, Endpoint::document("Item", "missing"), None, true)
        .await
        .expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "REMOTE_ERROR");
    assert!(err.to_string().starts_with("HTTP 404:"));
    assert!(err.to_string().contains("DoesNotExistError"));

    // failures are not cached
    assert!(cache.is_empty());
}

#[tokio::test]
async fn transport_failure_is_request_failed() {
    let t = FakeTransport::new("{}");
    t.push(Err(TransportError::Timeout("deadline exceeded".into())));
    let p = pipeline(t.clone());

    let err = p
        .execute(HttpMethod::Get, Endpoint::resource("Item"), None, true)
        .await
        .expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "REQUEST_FAILED");
    assert!(err.to_string().contains("deadline exceeded"));
    assert_eq!(t.call_count(), 1);
}

#[tokio::test]
async fn malformed_body_is_request_failed() {
    let t = FakeTransport::new("<html>gateway error</html>");
    let p = pipeline(t);
    let err = p
        .execute(HttpMethod::Get, Endpoint::resource("Item"), None, true)
        .await
        .expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "REQUEST_FAILED");
    assert!(err.to_string().contains("malformed response body"));
}

#[tokio::test]
async fn empty_body_reads_as_null() {
    let t = FakeTransport::new("");
    let p = pipeline(t);
    let v = p
        .execute(HttpMethod::Delete, Endpoint::document("Item", "X"), None, false)
        .await
        .unwrap();
    assert!(v.is_null());
}

#[tokio::test]
async fn client_builds_resource_requests() {
    let t = FakeTransport::new(r#"{"data": []}"#);
    let client = DocumentClient::new(pipeline(t.clone()));

    client
        .list("Sales Invoice", Some(&json!({ "status": "Paid" })), Some(&["name".to_string()]), 5)
        .await
        .unwrap();
    client.search("Item", "bolt", 10).await.unwrap();
    client.linked("Sales Order", "SO-1", "Delivery Note").await.unwrap();
    client.meta("Item").await.unwrap();

    let calls = t.calls();
    assert_eq!(calls.len(), 4);

    assert_eq!(calls[0].method, HttpMethod::Get);
    assert_eq!(calls[0].endpoint.to_string(), "/api/resource/Sales Invoice");
    assert_eq!(
        calls[0].payload,
        Some(json!({ "limit_page_length": 5, "filters": { "status": "Paid" }, "fields": ["name"] }))
    );

    assert_eq!(
        calls[1].payload,
        Some(json!({ "limit_page_length": 10, "filters": [["name", "like", "%bolt%"]] }))
    );

    assert_eq!(calls[2].endpoint.to_string(), "/api/resource/Delivery Note");
    assert_eq!(
        calls[2].payload,
        Some(json!({ "limit_page_length": 50, "filters": { "sales_order": "SO-1" } }))
    );

    assert_eq!(calls[3].endpoint.to_string(), "/api/resource/DocType/Item");
}

#[tokio::test]
async fn connection_probe_reports_failures_as_false() {
    let t = FakeTransport::new(r#"{"message": "Administrator"}"#);
    let client = DocumentClient::new(pipeline(t.clone()));
    assert!(client.test_connection().await);

    t.push(Ok(RawResponse {
        status: 401,
        body: "unauthorized".into(),
    }));
    assert!(!client.test_connection().await);
    assert_eq!(
        t.calls()[0].endpoint.to_string(),
        "/api/method/frappe.auth.get_logged_user"
    );
}
