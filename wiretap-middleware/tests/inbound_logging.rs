//! Integration tests for the server-side logging middleware.
//!
//! Drives a real axum `Router` through `tower::ServiceExt::oneshot` and reads
//! the emitted records back from a `MemorySink`.

use axum::body::{Body, Bytes, to_bytes};
use axum::http::{Method, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use tower::ServiceExt; // .oneshot()
use wiretap_core::error::WiretapError;
use wiretap_core::policy::{LoggingPolicy, Verbosity};
use wiretap_core::record::{Direction, HttpLogRecord, Origin};
use wiretap_middleware::with_http_logging;
use wiretap_observability::{HttpLogger, LogFormatter, MemorySink};

// ── Helpers ───────────────────────────────────────────────────

fn logger(verbosity: Verbosity) -> (HttpLogger, Arc<MemorySink>) {
    let policy = LoggingPolicy::builder()
        .verbosity(verbosity)
        .exclude(Method::GET, "/health/**")
        .build()
        .unwrap();
    let sink = Arc::new(MemorySink::new());
    (HttpLogger::new(policy).with_sink(sink.clone()), sink)
}

fn app(logger: HttpLogger) -> Router {
    let router = Router::new()
        .route("/api/hello", get(|| async { "hello" }))
        .route("/health/live", get(|| async { "ok" }))
        .route(
            "/oauth/token",
            post(|_credentials: String| async {
                Json(json!({"access_token": "xyz", "user": "bob"}))
            }),
        )
        .route("/echo", post(|body: Bytes| async move { body }))
        .route("/ignore", post(|| async { StatusCode::NO_CONTENT }))
        .route("/stream", get(streaming))
        .route("/cached", get(|| async { (StatusCode::NOT_MODIFIED, "stale") }));
    with_http_logging(router, logger)
}

async fn streaming() -> Body {
    let chunks = vec!["chunk-1,", "chunk-2,", "chunk-3"];
    Body::from_stream(stream::iter(
        chunks.into_iter().map(|c| Ok::<_, Infallible>(Bytes::from(c))),
    ))
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, body)
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("authorization", "Bearer secret")
        .header("accept", "text/plain")
        .body(Body::empty())
        .unwrap()
}

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn header<'a>(record: &'a HttpLogRecord, name: &str) -> Option<&'a Vec<String>> {
    record
        .headers()?
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

// ── Record shape & ordering ───────────────────────────────────

#[tokio::test]
async fn test_request_then_response_record() {
    let (logger, sink) = logger(Verbosity::Full);
    let (status, body) = call(app(logger), get_req("/api/hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"hello");

    let records = sink.records();
    assert_eq!(records.len(), 2);

    let request = &records[0];
    assert_eq!(request.direction(), Direction::Request);
    assert_eq!(request.origin(), Origin::Server);
    assert_eq!(request.method(), &Method::GET);
    assert_eq!(request.uri(), "/api/hello");
    assert_eq!(request.status_code(), None);
    assert_eq!(request.duration_ms(), None);

    let response = &records[1];
    assert_eq!(response.direction(), Direction::Response);
    assert_eq!(response.status_code(), Some(200));
    assert!(response.duration_ms().is_some());
    assert_eq!(response.body(), "hello");
}

#[tokio::test]
async fn test_rendered_records_are_pretty_json() {
    let (logger, sink) = logger(Verbosity::Full);
    call(app(logger), get_req("/api/hello")).await;

    let rendered = sink.rendered();
    let response: Value = serde_json::from_str(&rendered[1]).unwrap();
    assert_eq!(response["origin"], "server");
    assert_eq!(response["direction"], "response");
    assert_eq!(response["path"], "/api/hello");
    assert_eq!(response["statusCode"], 200);
    assert!(response["duration"].as_str().unwrap().ends_with("ms"));
    assert!(rendered[1].contains('\n'));
}

// ── Verbosity gating ──────────────────────────────────────────

#[tokio::test]
async fn test_none_emits_nothing() {
    let (logger, sink) = logger(Verbosity::None);
    let app = app(logger);
    call(app.clone(), get_req("/api/hello")).await;
    call(app, json_post("/echo", r#"{"a":1}"#)).await;
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_basic_omits_headers_and_body() {
    let (logger, sink) = logger(Verbosity::Basic);
    let (_, body) = call(app(logger), json_post("/echo", r#"{"a":1}"#)).await;
    assert_eq!(&body[..], br#"{"a":1}"#);

    let records = sink.records();
    assert_eq!(records.len(), 2);
    for record in &records {
        assert!(record.headers().is_none());
        assert_eq!(record.body(), "");
    }
}

#[tokio::test]
async fn test_headers_level_masks_authorization() {
    let (logger, sink) = logger(Verbosity::Headers);
    call(app(logger), get_req("/api/hello")).await;

    let records = sink.records();
    let request = &records[0];
    assert_eq!(header(request, "authorization").unwrap(), &vec!["******".to_string()]);
    assert_eq!(header(request, "accept").unwrap(), &vec!["text/plain".to_string()]);
    assert_eq!(request.body(), "");
    assert!(records[1].headers().is_some());
    assert_eq!(records[1].body(), "");
}

// ── Exclusion ─────────────────────────────────────────────────

#[tokio::test]
async fn test_excluded_route_passes_through_unlogged() {
    let (logger, sink) = logger(Verbosity::Full);
    let (status, body) = call(app(logger), get_req("/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
    assert!(sink.is_empty());
}

// ── Redaction ─────────────────────────────────────────────────

#[tokio::test]
async fn test_access_token_is_masked_in_both_bodies() {
    let (logger, sink) = logger(Verbosity::Full);
    let (_, body) = call(
        app(logger),
        json_post("/oauth/token", r#"{"access_token":"xyz","user":"bob"}"#),
    )
    .await;

    // The client still receives the real token.
    let delivered: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(delivered["access_token"], "xyz");

    let records = sink.records();
    assert_eq!(records[0].body(), r#"{"access_token":"******","user":"bob"}"#);
    assert_eq!(records[1].body(), r#"{"access_token":"******","user":"bob"}"#);
}

#[tokio::test]
async fn test_query_token_is_masked_in_uri() {
    let (logger, sink) = logger(Verbosity::Basic);
    call(app(logger), get_req("/api/hello?access_token=abc&lang=en")).await;
    let records = sink.records();
    assert_eq!(records[0].uri(), "/api/hello?access_token=******&lang=en");
    assert_eq!(records[1].uri(), "/api/hello?access_token=******&lang=en");
}

// ── Streaming bodies ──────────────────────────────────────────

#[tokio::test]
async fn test_streamed_response_is_delivered_and_captured() {
    let (logger, sink) = logger(Verbosity::Full);
    let (_, body) = call(app(logger), get_req("/stream")).await;
    assert_eq!(&body[..], b"chunk-1,chunk-2,chunk-3");

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].body(), "chunk-1,chunk-2,chunk-3");
}

#[tokio::test]
async fn test_streamed_request_is_captured_before_response() {
    let (logger, sink) = logger(Verbosity::Full);
    let chunks = vec!["part-a|", "part-b|", "part-c"];
    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .body(Body::from_stream(stream::iter(
            chunks.into_iter().map(|c| Ok::<_, Infallible>(Bytes::from(c))),
        )))
        .unwrap();

    let (_, body) = call(app(logger), request).await;
    assert_eq!(&body[..], b"part-a|part-b|part-c");

    let records = sink.records();
    assert_eq!(records[0].direction(), Direction::Request);
    assert_eq!(records[0].body(), "part-a|part-b|part-c");
    assert_eq!(records[1].direction(), Direction::Response);
}

#[tokio::test]
async fn test_unread_request_body_is_logged_empty_before_response() {
    let (logger, sink) = logger(Verbosity::Full);
    let (status, _) = call(app(logger), json_post("/ignore", r#"{"never":"read"}"#)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].direction(), Direction::Request);
    assert_eq!(records[0].body(), "");
    assert_eq!(records[1].status_code(), Some(204));
    assert_eq!(records[1].body(), "");
}

// ── Responses without a body on the wire ──────────────────────

#[tokio::test]
async fn test_head_request_logs_response_at_header_time() {
    let (logger, sink) = logger(Verbosity::Full);
    let request = Request::builder()
        .method(Method::HEAD)
        .uri("/api/hello")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(app(logger), request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].direction(), Direction::Request);
    assert_eq!(records[0].method(), &Method::HEAD);
    assert_eq!(records[1].direction(), Direction::Response);
    assert_eq!(records[1].status_code(), Some(200));
    assert_eq!(records[1].body(), "");
}

#[tokio::test]
async fn test_not_modified_logs_response_without_body() {
    let (logger, sink) = logger(Verbosity::Full);
    call(app(logger), get_req("/cached")).await;

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].status_code(), Some(304));
    assert_eq!(records[1].body(), "");
}

// ── Best-effort emission ──────────────────────────────────────

struct BrokenFormatter;

impl LogFormatter for BrokenFormatter {
    fn format(&self, _: &HttpLogRecord) -> Result<String, WiretapError> {
        Err(WiretapError::Config("formatter unavailable".into()))
    }
}

#[tokio::test]
async fn test_formatter_failure_does_not_affect_response() {
    let (logger, sink) = logger(Verbosity::Full);
    let logger = logger.with_formatter(Arc::new(BrokenFormatter));
    let (status, body) = call(app(logger), json_post("/echo", "payload")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"payload");
    assert!(sink.is_empty());
}
