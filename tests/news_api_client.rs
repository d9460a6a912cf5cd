// tests/news_api_client.rs
//
// NewsApiClient against an in-process fake of `v2/top-headlines`.
// Each case is keyed by the `sources` query parameter.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use headline_sync::remote::{HeadlineSource, NewsApiClient};
use headline_sync::FetchError;
use serde_json::json;
use tokio::net::TcpListener;

async fn fake_top_headlines(Query(q): Query<HashMap<String, String>>) -> Response {
    let source = q.get("sources").cloned().unwrap_or_default();
    let key = q.get("apiKey").cloned().unwrap_or_default();
    if key != "k" {
        return (
            StatusCode::UNAUTHORIZED,
            json!({"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."})
                .to_string(),
        )
            .into_response();
    }
    match source.as_str() {
        "bbc-news" => json!({
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": "bbc-news", "name": "BBC News"},
                "author": null,
                "title": "Test Title",
                "description": null,
                "url": "https://test.com",
                "urlToImage": null,
                "publishedAt": "2024-01-01T12:00:00Z",
                "content": null
            }]
        })
        .to_string()
        .into_response(),
        "envelope" => json!({"status":"error","code":"sourceDoesNotExist","message":"nope"})
            .to_string()
            .into_response(),
        "garbage" => "<<html>>".into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "{}".into_response()
        }
        _ => (StatusCode::NOT_FOUND, "").into_response(),
    }
}

async fn spawn_fake() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route("/v2/top-headlines", get(fake_top_headlines));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/")
}

fn client(base: &str, timeout_ms: u64) -> NewsApiClient {
    NewsApiClient::new(
        base,
        Duration::from_millis(500),
        Duration::from_millis(timeout_ms),
    )
    .expect("client")
}

#[tokio::test]
async fn ok_response_is_decoded() {
    let base = spawn_fake().await;
    let resp = client(&base, 2_000)
        .top_headlines("bbc-news", "k")
        .await
        .expect("ok");
    assert_eq!(resp.total_results, 1);
    assert_eq!(resp.articles[0].title, "Test Title");
    assert_eq!(resp.articles[0].source.id.as_deref(), Some("bbc-news"));
}

#[tokio::test]
async fn http_404_is_protocol_error() {
    let base = spawn_fake().await;
    let err = client(&base, 2_000)
        .top_headlines("missing", "k")
        .await
        .unwrap_err();
    match err {
        FetchError::Protocol { status, reason } => {
            assert_eq!(status, Some(404));
            assert!(reason.starts_with("HTTP 404"), "{reason}");
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[tokio::test]
async fn bad_key_carries_api_message() {
    let base = spawn_fake().await;
    let err = client(&base, 2_000)
        .top_headlines("bbc-news", "wrong")
        .await
        .unwrap_err();
    match err {
        FetchError::Protocol { status, reason } => {
            assert_eq!(status, Some(401));
            assert!(reason.contains("apiKeyInvalid"), "{reason}");
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_envelope_with_200_is_protocol_error() {
    let base = spawn_fake().await;
    let err = client(&base, 2_000)
        .top_headlines("envelope", "k")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Protocol { .. }), "{err:?}");
}

#[tokio::test]
async fn undecodable_body_is_unexpected() {
    let base = spawn_fake().await;
    let err = client(&base, 2_000)
        .top_headlines("garbage", "k")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Unexpected(_)), "{err:?}");
}

#[tokio::test]
async fn timeout_is_connectivity() {
    let base = spawn_fake().await;
    let err = client(&base, 200)
        .top_headlines("slow", "k")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Connectivity(_)), "{err:?}");
}

#[tokio::test]
async fn refused_connection_is_connectivity_and_hides_key() {
    // Grab a free port, then close it so nothing is listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = client(&format!("http://{addr}/"), 2_000)
        .top_headlines("bbc-news", "super-secret")
        .await
        .unwrap_err();
    match err {
        FetchError::Connectivity(msg) => assert!(!msg.contains("super-secret"), "{msg}"),
        other => panic!("expected connectivity error, got {other:?}"),
    }
}
