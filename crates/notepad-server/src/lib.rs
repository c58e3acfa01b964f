//! Axum backend for the streaming notepad.
//!
//! Serves `GET /api/streaming/notepad`, which streams a text file as
//! Server-Sent Events, and `GET /health`.

pub mod config;
pub mod error;
pub mod notepad;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::ServeConfig;
pub use error::ApiError;

/// Path of the notepad stream endpoint.
pub const NOTEPAD_ROUTE: &str = "/api/streaming/notepad";

/// Builds the application router.
pub fn create_router(config: ServeConfig) -> Router {
    Router::new()
        .route(NOTEPAD_ROUTE, get(notepad::stream_notepad))
        .route("/health", get(|| async { "OK" }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(config))
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    config: ServeConfig,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, root = %config.root.display(), "notepad server listening");
    axum::serve(listener, create_router(config))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Binds `config.bind` and serves until `shutdown` resolves.
pub async fn serve<F>(config: ServeConfig, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(config.bind).await?;
    serve_with_shutdown(listener, config, shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn fixture(contents: &str) -> (tempfile::TempDir, ServeConfig) {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("data")).expect("data dir");
        std::fs::write(dir.path().join("data/notepad.txt"), contents).expect("write fixture");
        let config = ServeConfig::default().root(dir.path());
        (dir, config)
    }

    async fn get_body(config: ServeConfig, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = create_router(config)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (status, _, body) = get_body(ServeConfig::default(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn streams_meta_chunks_and_done() {
        let (_dir, config) = fixture("abcdef");
        let (status, content_type, body) =
            get_body(config, "/api/streaming/notepad?chunk_size=4&delay_ms=0").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/event-stream"));
        let meta_at = body.find("event: meta").expect("meta");
        let first_at = body.find("data: abcd\n").expect("first chunk");
        let second_at = body.find("data: ef\n").expect("second chunk");
        let done_at = body.find("event: done").expect("done");
        assert!(meta_at < first_at && first_at < second_at && second_at < done_at);
        assert!(body.contains("notepad.txt"));
        assert_eq!(body.matches("event: chunk").count(), 2);
    }

    #[tokio::test]
    async fn multiline_chunks_use_one_data_line_per_line() {
        let (_dir, config) = fixture("one\r\ntwo\n");
        let (_, _, body) =
            get_body(config, "/api/streaming/notepad?chunk_size=100&delay_ms=0").await;
        assert!(body.contains("data: one\ndata: two\n"));
        assert!(!body.contains('\r'));
    }

    #[tokio::test]
    async fn carriage_return_in_file_name_is_escaped_in_meta() {
        let (dir, config) = fixture("x");
        std::fs::write(dir.path().join("a\rb.txt"), "body").expect("write fixture");
        let (status, _, body) =
            get_body(config, "/api/streaming/notepad?path=a%0Db.txt&delay_ms=0").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("a\\rb.txt"));
        assert!(!body.contains('\r'));
        assert!(body.contains("data: body\n"));
        assert!(body.contains("event: done"));
    }

    #[tokio::test]
    async fn missing_file_is_404_with_detail() {
        let (_dir, config) = fixture("x");
        let (status, _, body) = get_body(config, "/api/streaming/notepad?path=nope.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(json["detail"].as_str().unwrap().starts_with("File not found: "));
    }

    #[tokio::test]
    async fn invalid_chunk_size_is_422() {
        let (_dir, config) = fixture("x");
        let (status, _, body) = get_body(config, "/api/streaming/notepad?chunk_size=0").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("chunk_size"));
    }

    #[tokio::test]
    async fn directory_path_is_not_a_file() {
        let (_dir, config) = fixture("x");
        let (status, _, _) = get_body(config, "/api/streaming/notepad?path=data").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
