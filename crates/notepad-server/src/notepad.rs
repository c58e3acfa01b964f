//! `GET /api/streaming/notepad`: streams a text file as SSE events.
//!
//! The stream is one `meta` event carrying the resolved file path, one
//! `chunk` event per `chunk_size` characters with `delay_ms` between them,
//! and a final `done` event with an empty payload.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt as _};
use serde::Deserialize;
use tracing::info;

use crate::config::{MAX_CHUNK_SIZE, MAX_DELAY_MS, ServeConfig};
use crate::error::ApiError;

/// Raw query string; numbers are parsed by hand so bad input maps to 422.
#[derive(Debug, Default, Deserialize)]
pub struct NotepadQuery {
    pub path: Option<String>,
    pub chunk_size: Option<String>,
    pub delay_ms: Option<String>,
}

/// Validated request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotepadParams {
    pub path: PathBuf,
    pub chunk_size: usize,
    pub delay: Duration,
}

fn parse_bounded<T>(name: &str, raw: Option<&str>, default: T, min: T, max: T) -> Result<T, ApiError>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display + Copy,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: T = raw.trim().parse().map_err(|_| {
        ApiError::InvalidParam(format!("{name} must be an integer, got {raw:?}"))
    })?;
    if value < min || value > max {
        return Err(ApiError::InvalidParam(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(value)
}

impl NotepadQuery {
    /// Applies defaults and bounds, and resolves the path against `config.root`.
    pub fn resolve(&self, config: &ServeConfig) -> Result<NotepadParams, ApiError> {
        let chunk_size = parse_bounded(
            "chunk_size",
            self.chunk_size.as_deref(),
            config.default_chunk_size,
            1,
            MAX_CHUNK_SIZE,
        )?;
        let delay_ms = parse_bounded(
            "delay_ms",
            self.delay_ms.as_deref(),
            config.default_delay_ms,
            0,
            MAX_DELAY_MS,
        )?;
        let raw_path = self
            .path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(&config.default_path);
        Ok(NotepadParams {
            path: resolve_path(&config.root, raw_path),
            chunk_size,
            delay: Duration::from_millis(delay_ms),
        })
    }
}

fn resolve_path(root: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    std::path::absolute(&joined).unwrap_or(joined)
}

/// Normalizes line endings to `\n`; SSE data fields cannot carry `\r`.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Escapes line breaks in a single-line payload such as a file path.
pub fn escape_line_breaks(value: &str) -> String {
    value.replace('\r', "\\r").replace('\n', "\\n")
}

/// Splits `text` into pieces of at most `chunk_size` characters.
pub fn split_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == chunk_size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn notepad_events(
    meta: String,
    chunks: Vec<String>,
    delay: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    let head = stream::once(async move { Event::default().event("meta").data(meta) });
    let body = stream::iter(chunks.into_iter().enumerate()).then(move |(index, chunk)| async move {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Event::default().event("chunk").data(chunk)
    });
    let tail = stream::once(async { Event::default().event("done").data("") });
    head.chain(body).chain(tail).map(Ok)
}

/// Handler for `GET /api/streaming/notepad`.
pub async fn stream_notepad(
    State(config): State<Arc<ServeConfig>>,
    Query(query): Query<NotepadQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static>, ApiError> {
    let params = query.resolve(&config)?;
    let shown = params.path.display().to_string();

    match tokio::fs::metadata(&params.path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(ApiError::NotFound(shown)),
    }
    let bytes = tokio::fs::read(&params.path)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to read {shown}: {e}")))?;
    let text = normalize_newlines(&String::from_utf8_lossy(&bytes));
    let chunks = split_chunks(&text, params.chunk_size);
    info!(
        path = %shown,
        chunks = chunks.len(),
        chunk_size = params.chunk_size,
        delay_ms = params.delay.as_millis() as u64,
        "streaming notepad"
    );

    Ok(Sse::new(notepad_events(escape_line_breaks(&shown), chunks, params.delay))
        .keep_alive(KeepAlive::new().interval(config.keep_alive)))
}
