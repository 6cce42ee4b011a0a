use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use doccle_sync_core::config::IngestionConfig;
use doccle_sync_core::contract::Ingestor;
use doccle_sync_core::error::ConfigError;
use doccle_sync_core::uploader::{post_document_url, PaperlessClient};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

const PDF: &[u8] = b"%PDF-1.5\n%%EOF\n";

/// One received upload: authorization header, field name, file name, bytes.
type Upload = (String, String, String, Vec<u8>);

#[derive(Default)]
struct Received {
    uploads: Mutex<Vec<Upload>>,
}

async fn spawn_paperless(status: StatusCode) -> (String, Arc<Received>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let received = Arc::new(Received::default());

    let app = Router::new()
        .route(
            "/api/documents/post_document/",
            post(
                move |State(rec): State<Arc<Received>>,
                      headers: HeaderMap,
                      mut multipart: Multipart| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    while let Ok(Some(field)) = multipart.next_field().await {
                        let name = field.name().unwrap_or_default().to_string();
                        let file_name = field.file_name().unwrap_or_default().to_string();
                        let bytes = field.bytes().await.unwrap_or_default().to_vec();
                        rec.uploads
                            .lock()
                            .unwrap()
                            .push((auth.clone(), name, file_name, bytes));
                    }
                    (status, "\"task-id\"")
                },
            ),
        )
        .with_state(received.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base, received)
}

fn client(base_url: String) -> PaperlessClient {
    PaperlessClient::new(&IngestionConfig {
        base_url,
        token: "abc123".into(),
        timeout: Duration::from_secs(5),
    })
    .expect("client should build")
}

#[tokio::test]
async fn test_ingest_posts_multipart_document_with_token() {
    let (base, received) = spawn_paperless(StatusCode::OK).await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("Invoice_1_2024-03-01.PDF");
    std::fs::write(&path, PDF).unwrap();

    client(format!("{base}/"))
        .ingest(&path)
        .await
        .expect("upload should succeed");

    let uploads = received.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    let (auth, field, file_name, bytes) = &uploads[0];
    assert_eq!(auth, "Token abc123");
    assert_eq!(field, "document");
    assert_eq!(file_name, "Invoice_1_2024-03-01.PDF");
    assert_eq!(bytes.as_slice(), PDF);
}

#[tokio::test]
async fn test_ingest_accepts_any_2xx() {
    let (base, _received) = spawn_paperless(StatusCode::ACCEPTED).await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.pdf");
    std::fs::write(&path, PDF).unwrap();

    assert!(client(base).ingest(&path).await.is_ok());
}

#[tokio::test]
async fn test_ingest_rejection_carries_status_and_body() {
    let (base, _received) = spawn_paperless(StatusCode::BAD_REQUEST).await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.pdf");
    std::fs::write(&path, PDF).unwrap();

    let err = client(base).ingest(&path).await.unwrap_err();
    assert!(err.message.contains("400"), "got: {}", err.message);
    assert!(err.message.contains("task-id"), "got: {}", err.message);
}

#[tokio::test]
async fn test_ingest_missing_file_is_an_ingestion_error() {
    let (base, received) = spawn_paperless(StatusCode::OK).await;
    let dir = tempdir().unwrap();

    let err = client(base)
        .ingest(&dir.path().join("nope.pdf"))
        .await
        .unwrap_err();

    assert!(err.message.starts_with("File not found"), "got: {}", err.message);
    assert!(received.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ingest_transport_error_is_an_ingestion_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.pdf");
    std::fs::write(&path, PDF).unwrap();

    let err = client("http://127.0.0.1:1".into())
        .ingest(&path)
        .await
        .unwrap_err();
    assert!(err.message.contains("Error posting document to Paperless"));
}

#[test]
fn test_client_fails_fast_without_url_or_token() {
    let missing_url = PaperlessClient::new(&IngestionConfig {
        base_url: "".into(),
        token: "abc".into(),
        timeout: Duration::from_secs(1),
    });
    assert!(matches!(missing_url, Err(ConfigError::Missing("PAPERLESS_URL"))));

    let missing_token = PaperlessClient::new(&IngestionConfig {
        base_url: "https://paperless.test".into(),
        token: " ".into(),
        timeout: Duration::from_secs(1),
    });
    assert!(matches!(missing_token, Err(ConfigError::Missing("PAPERLESS_TOKEN"))));
}

#[test]
fn test_post_url_strips_trailing_slashes() {
    assert_eq!(
        post_document_url("https://paperless.test//"),
        "https://paperless.test/api/documents/post_document/"
    );
    assert_eq!(
        post_document_url("https://paperless.test/sub"),
        "https://paperless.test/sub/api/documents/post_document/"
    );
}
