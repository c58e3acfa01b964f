use std::collections::VecDeque;
use std::pin::Pin;

use futures::StreamExt as _;
use futures::stream;
use reqwest::Url;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::{StreamError, TransportError};
use crate::transport::{SseDecoder, SseFrame};

/// Frames read from one open connection.
///
/// The stream ends when the server closes the body.
pub type FrameStream =
    Pin<Box<dyn futures::Stream<Item = Result<SseFrame, TransportError>> + Send + 'static>>;

type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

/// Opens server-push connections.
///
/// The subscription task calls `connect` once per attempt, passing the last
/// event id seen so the server can resume.
#[async_trait::async_trait]
pub trait StreamTransport: Send + Sync {
    async fn connect(
        &self,
        url: &Url,
        last_event_id: Option<&str>,
    ) -> Result<FrameStream, TransportError>;
}

/// `StreamTransport` over HTTP using `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| StreamError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl StreamTransport for HttpTransport {
    async fn connect(
        &self,
        url: &Url,
        last_event_id: Option<&str>,
    ) -> Result<FrameStream, TransportError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = last_event_id {
            request = request.header("Last-Event-ID", id);
        }
        debug!(%url, last_event_id, "opening event stream");

        let response = request.send().await.map_err(TransportError::request)?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("text/event-stream") {
            return Err(TransportError::ContentType(content_type));
        }

        let bytes_stream: ByteStream = Box::pin(response.bytes_stream());
        Ok(Box::pin(frame_stream(bytes_stream)))
    }
}

fn frame_stream(
    bytes_stream: ByteStream,
) -> impl futures::Stream<Item = Result<SseFrame, TransportError>> + Send {
    struct State {
        bytes_stream: ByteStream,
        decoder: SseDecoder,
        pending: VecDeque<SseFrame>,
        done: bool,
    }

    stream::try_unfold(
        State {
            bytes_stream,
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(frame) = state.pending.pop_front() {
                    return Ok(Some((frame, state)));
                }
                if state.done {
                    return Ok(None);
                }

                match state.bytes_stream.next().await {
                    Some(Ok(chunk)) => {
                        state.pending.extend(state.decoder.push_chunk(&chunk));
                    }
                    Some(Err(e)) => return Err(TransportError::read(e)),
                    None => {
                        if state.decoder.pending_len() > 0 {
                            debug!(
                                bytes = state.decoder.pending_len(),
                                "discarding incomplete trailing frame"
                            );
                        }
                        state.done = true;
                    }
                }
            }
        },
    )
}
