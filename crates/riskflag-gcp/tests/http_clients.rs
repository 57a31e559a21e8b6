//! Integration tests for the Vertex AI and Cloud Storage clients against a
//! local HTTP server.

use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Json, Router};
use riskflag_gcp::{
    GcpError, GcsClient, GcsObject, GenerationRequest, StorageConfig, TextGenerator,
    VertexClient, VertexConfig,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn vertex_app(captured: Captured, reply: Value, status: StatusCode) -> Router {
    Router::new().fallback(move |uri: Uri, headers: HeaderMap, Json(body): Json<Value>| {
        let captured = captured.clone();
        let reply = reply.clone();
        async move {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            captured
                .requests
                .lock()
                .unwrap()
                .push((uri.path().to_string(), auth, body));
            (status, Json(reply)).into_response()
        }
    })
}

fn vertex_config(endpoint: &str) -> VertexConfig {
    VertexConfig::new("audit-proj", "us-central1", "gemini-2.0-flash")
        .with_token("ya29.test")
        .with_endpoint(endpoint)
}

/// Test: generateContent request carries prompt, system instruction, temperature and token
#[tokio::test]
async fn test_vertex_generate_round_trip() {
    let captured = Captured::default();
    let reply = json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": "Subject: [URGENT] A1\n"}]}}]
    });
    let endpoint = spawn(vertex_app(captured.clone(), reply, StatusCode::OK)).await;

    let client = VertexClient::new(vertex_config(&endpoint)).expect("client");
    let request = GenerationRequest::new("gemini-2.0-flash", "Data: Audit_ID: A1")
        .with_system_instruction("You are a Senior Compliance Communication Agent.")
        .with_temperature(0.2);

    let text = client.generate(&request).await.expect("generate failed");
    assert_eq!(text, "Subject: [URGENT] A1\n");

    let requests = captured.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (path, auth, body) = &requests[0];
    assert_eq!(
        path,
        "/v1/projects/audit-proj/locations/us-central1/publishers/google/models/gemini-2.0-flash:generateContent"
    );
    assert_eq!(auth.as_deref(), Some("Bearer ya29.test"));
    assert_eq!(body["contents"][0]["parts"][0]["text"], "Data: Audit_ID: A1");
    assert_eq!(
        body["systemInstruction"]["parts"][0]["text"],
        "You are a Senior Compliance Communication Agent."
    );
}

/// Test: non-2xx answers surface as Status errors with the body
#[tokio::test]
async fn test_vertex_error_status() {
    let captured = Captured::default();
    let reply = json!({"error": {"code": 403, "message": "Permission denied"}});
    let endpoint = spawn(vertex_app(captured, reply, StatusCode::FORBIDDEN)).await;

    let client = VertexClient::new(vertex_config(&endpoint)).expect("client");
    let err = client
        .generate(&GenerationRequest::new("gemini-2.0-flash", "p"))
        .await
        .unwrap_err();

    match err {
        GcpError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("Permission denied"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Test: a 200 with no candidates is a malformed response
#[tokio::test]
async fn test_vertex_missing_candidates() {
    let captured = Captured::default();
    let endpoint = spawn(vertex_app(captured, json!({"candidates": []}), StatusCode::OK)).await;

    let client = VertexClient::new(vertex_config(&endpoint)).expect("client");
    let err = client
        .generate(&GenerationRequest::new("gemini-2.0-flash", "p"))
        .await
        .unwrap_err();
    assert!(matches!(err, GcpError::MalformedResponse(_)));
}

/// Test: nothing listening yields a connection error, not a panic
#[tokio::test]
async fn test_vertex_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = VertexClient::new(vertex_config(&format!("http://{addr}"))).expect("client");
    let err = client
        .generate(&GenerationRequest::new("gemini-2.0-flash", "p"))
        .await
        .unwrap_err();
    assert!(matches!(err, GcpError::Connection(_) | GcpError::Http(_)));
}

/// Test: object download hits the media URL and returns the body
#[tokio::test]
async fn test_gcs_download_text() {
    let seen = Arc::new(Mutex::new(None::<String>));
    let seen_handler = seen.clone();
    let app = Router::new().fallback(move |uri: Uri| {
        let seen = seen_handler.clone();
        async move {
            *seen.lock().unwrap() = Some(uri.to_string());
            "Audit_ID,Risk_Score,Status\nA1,95,Fail\n"
        }
    });
    let endpoint = spawn(app).await;

    let client = GcsClient::new(StorageConfig::from_lookup(|_| None).with_endpoint(&endpoint))
        .expect("client");
    let body = client
        .download_text(&GcsObject::new("mqmr-weekly-audits", "test_audit.csv"))
        .await
        .expect("download failed");

    assert!(body.starts_with("Audit_ID,Risk_Score,Status"));
    assert_eq!(
        seen.lock().unwrap().as_deref(),
        Some("/storage/v1/b/mqmr-weekly-audits/o/test_audit.csv?alt=media")
    );
}

/// Test: missing objects surface the HTTP status
#[tokio::test]
async fn test_gcs_not_found() {
    let app = Router::new().fallback(|| async { (StatusCode::NOT_FOUND, "No such object") });
    let endpoint = spawn(app).await;

    let client = GcsClient::new(StorageConfig::from_lookup(|_| None).with_endpoint(&endpoint))
        .expect("client");
    let err = client
        .download_text(&GcsObject::new("b", "missing.csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, GcpError::Status { status: 404, .. }));
}
