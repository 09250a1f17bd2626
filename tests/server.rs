//! In-process HTTP API tests: requests go straight to the router.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use konspekt::config::Config;
use konspekt::engine::build_engine;
use konspekt::server::build_router;

fn test_app(tmp: &TempDir) -> Router {
    let mut config = Config::default();
    config.index.dir = tmp.path().join("db");
    config.embedding.provider = "hash".to_string();
    config.embedding.dims = Some(64);
    config.retrieval.k = 2;
    let engine = build_engine(&config).unwrap();
    build_router(config, engine)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload(filename: &str, bytes: &'static [u8]) -> Request<Body> {
    Request::post(format!("/ingest?filename={}", filename))
        .body(Body::from(bytes))
        .unwrap()
}

#[tokio::test]
async fn health_reports_version() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);
    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn upload_then_query() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);

    let (status, report) = send(
        &app,
        upload(
            "geo.txt",
            b"The capital of France is Paris.\x0cThe Danube flows through Vienna.",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", report);
    assert_eq!(report["source"], "geo.txt");
    assert_eq!(report["pages"], 2);
    assert_eq!(report["fragments_added"], 2);
    assert_eq!(report["index_size"], 2);

    let (status, body) = send(
        &app,
        post_json("/query", json!({ "question": "What is the capital of France?", "k": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["fragment"]["page"], 1);
    assert_eq!(results[0]["fragment"]["source"], "geo.txt");
    assert!(body["answer"]
        .as_str()
        .unwrap()
        .contains("--- Source 1 (page 1, geo.txt) ---"));
}

#[tokio::test]
async fn query_uses_default_k() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);
    send(&app, upload("notes.txt", b"one\x0ctwo\x0cthree")).await;

    let (status, body) = send(&app, post_json("/query", json!({ "question": "two" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn query_on_empty_index() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);
    let (status, body) = send(&app, post_json("/query", json!({ "question": "anything" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["results"].as_array().unwrap().is_empty());
    assert_eq!(body["answer"], "No information found for your question.");
}

#[tokio::test]
async fn zero_k_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);
    let (status, body) = send(&app, post_json("/query", json!({ "question": "x", "k": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_config");
    assert!(body["error"]["message"].as_str().unwrap().contains("k must be >= 1"));
}

#[tokio::test]
async fn unsupported_upload_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);
    let (status, body) = send(&app, upload("sheet.xlsx", b"PK")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "source_unreadable");
}

#[tokio::test]
async fn missing_filename_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);
    let req = Request::post("/ingest").body(Body::from("hello")).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_config");
}

#[tokio::test]
async fn filename_without_file_part_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);
    let (status, body) = send(&app, upload("..", b"hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_config");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("invalid filename"), "{}", message);
    assert!(!message.contains("missing"));

    // A path keeps only its last component.
    let (status, report) = send(&app, upload("notes%2Fbio.txt", b"Cells divide.")).await;
    assert_eq!(status, StatusCode::OK, "{}", report);
    assert_eq!(report["source"], "bio.txt");
}

#[tokio::test]
async fn corrupt_pdf_upload_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);
    let (status, body) = send(&app, upload("broken.pdf", b"not a pdf")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "source_unreadable");

    let (_, stats) = send(&app, Request::get("/stats").body(Body::empty()).unwrap()).await;
    assert_eq!(stats["fragments"], 0);
}

#[tokio::test]
async fn stats_and_clear() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp);
    send(&app, upload("bio.md", b"Ribosomes build proteins.")).await;

    let (status, stats) = send(&app, Request::get("/stats").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["fragments"], 1);
    assert_eq!(stats["dims"], 64);
    assert_eq!(stats["sources"][0]["source"], "bio.md");

    let (status, body) = send(&app, Request::post("/clear").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fragments"], 0);
    assert!(!tmp.path().join("db").exists());

    let (_, stats) = send(&app, Request::get("/stats").body(Body::empty()).unwrap()).await;
    assert_eq!(stats["fragments"], 0);
}
