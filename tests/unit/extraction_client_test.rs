//! Unit tests for the extraction client: URL validation, status mapping,
//! and end-to-end calls against a throwaway local HTTP server.

use std::time::Duration;

use reqwest::StatusCode;
use rstest::rstest;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use readlater::services::extraction_client::{error_for_status, validate_url, Extractor, HttpExtractor};
use readlater::types::errors::ExtractionError;

#[rstest]
#[case("https://example.com/post")]
#[case("  http://example.com  ")]
#[case("https://sub.example.org/a?b=c#d")]
fn test_valid_urls(#[case] input: &str) {
    assert!(validate_url(input).is_ok());
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("example.com")]
#[case("ftp://example.com/file")]
#[case("javascript:alert(1)")]
#[case("file:///etc/passwd")]
fn test_invalid_urls(#[case] input: &str) {
    assert!(matches!(validate_url(input), Err(ExtractionError::InvalidUrl(_))));
}

#[rstest]
#[case(StatusCode::BAD_REQUEST, "invalid")]
#[case(StatusCode::NOT_FOUND, "none")]
#[case(StatusCode::UNPROCESSABLE_ENTITY, "none")]
#[case(StatusCode::BAD_GATEWAY, "fetch")]
#[case(StatusCode::GATEWAY_TIMEOUT, "fetch")]
#[case(StatusCode::SERVICE_UNAVAILABLE, "fetch")]
#[case(StatusCode::INTERNAL_SERVER_ERROR, "unexpected")]
fn test_status_mapping(#[case] status: StatusCode, #[case] kind: &str) {
    let err = error_for_status(status, "detail".to_string());
    let actual = match err {
        ExtractionError::InvalidUrl(_) => "invalid",
        ExtractionError::NoContent => "none",
        ExtractionError::FetchFailed(_) => "fetch",
        ExtractionError::Unexpected(_) => "unexpected",
    };
    assert_eq!(actual, kind);
}

/// Serves exactly one request with the given status and body, returning the
/// endpoint URL and a handle resolving to the raw request body.
async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let request_body = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break String::new();
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let headers = text[..split].to_ascii_lowercase();
                let length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= split + 4 + length {
                    break text[split + 4..split + 4 + length].to_string();
                }
            }
        };
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request_body
    });
    (format!("http://{}/api/extract", addr), handle)
}

#[tokio::test]
async fn test_extract_success_posts_url() {
    let (endpoint, server) = serve_once(
        "200 OK",
        r##"{"title":"Hello","author":"Ada","siteName":"Example","content":"# Hello\n\nworld"}"##,
    )
    .await;
    let extractor = HttpExtractor::new(&endpoint, Duration::from_secs(5)).unwrap();

    let article = extractor.extract("https://example.com/post").await.unwrap();
    assert_eq!(article.title, "Hello");
    assert_eq!(article.site_name.as_deref(), Some("Example"));
    assert_eq!(article.content, "# Hello\n\nworld");

    let sent: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
    assert_eq!(sent["url"], "https://example.com/post");
}

#[tokio::test]
async fn test_extract_empty_content_is_no_content() {
    let (endpoint, _server) = serve_once("200 OK", r#"{"title":"Blank","content":"   "}"#).await;
    let extractor = HttpExtractor::new(&endpoint, Duration::from_secs(5)).unwrap();
    assert!(matches!(
        extractor.extract("https://example.com").await,
        Err(ExtractionError::NoContent)
    ));
}

#[tokio::test]
async fn test_extract_error_status_carries_detail() {
    let (endpoint, _server) = serve_once("502 Bad Gateway", r#"{"error":"upstream timed out"}"#).await;
    let extractor = HttpExtractor::new(&endpoint, Duration::from_secs(5)).unwrap();
    match extractor.extract("https://example.com").await {
        Err(ExtractionError::FetchFailed(detail)) => assert_eq!(detail, "upstream timed out"),
        other => panic!("expected FetchFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_extract_malformed_body_is_unexpected() {
    let (endpoint, _server) = serve_once("200 OK", "<html>oops</html>").await;
    let extractor = HttpExtractor::new(&endpoint, Duration::from_secs(5)).unwrap();
    assert!(matches!(
        extractor.extract("https://example.com").await,
        Err(ExtractionError::Unexpected(_))
    ));
}

/// Invalid input never reaches the network.
#[tokio::test]
async fn test_extract_invalid_url_short_circuits() {
    let extractor = HttpExtractor::new("http://127.0.0.1:9/unused", Duration::from_secs(1)).unwrap();
    assert!(matches!(
        extractor.extract("not a url").await,
        Err(ExtractionError::InvalidUrl(_))
    ));
}

/// Nothing listening: a connection failure.
#[tokio::test]
async fn test_extract_unreachable_endpoint_is_fetch_failed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let extractor = HttpExtractor::new(&format!("http://{}/x", addr), Duration::from_secs(2)).unwrap();
    assert!(matches!(
        extractor.extract("https://example.com").await,
        Err(ExtractionError::FetchFailed(_))
    ));
}
