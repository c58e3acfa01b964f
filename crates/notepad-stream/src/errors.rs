use std::fmt;

/// Errors returned by the public API before a stream is running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// The endpoint URL could not be built from the base URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Writing a rendered frame failed.
    #[error("render error: {0}")]
    Render(String),
}

/// Failure of a single connection attempt or of an open connection.
///
/// `Status` and `ContentType` are fatal: the transport gives up instead of
/// reconnecting. Everything else is transient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent (DNS, refused, connect timeout).
    #[error("request failed: {0}")]
    Request(String),
    /// The server answered with something other than `200 OK`.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// The server answered without a `text/event-stream` content type.
    #[error("unexpected content type: {0}")]
    ContentType(String),
    /// Reading the response body failed mid-stream.
    #[error("stream read failed: {0}")]
    Read(String),
    /// The server closed the stream before sending `done`.
    #[error("stream ended before done")]
    Ended,
}

impl TransportError {
    /// Returns true when the transport must not reconnect after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::ContentType(_))
    }

    pub(crate) fn request(err: impl fmt::Display) -> Self {
        Self::Request(err.to_string())
    }

    pub(crate) fn read(err: impl fmt::Display) -> Self {
        Self::Read(err.to_string())
    }
}

/// Opaque error signal handed to `on_error`.
///
/// Carries a human-readable message and nothing else; connection drops and
/// malformed streams are indistinguishable to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSignal {
    message: String,
}

impl ErrorSignal {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message describing what went wrong.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ErrorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<&TransportError> for ErrorSignal {
    fn from(value: &TransportError) -> Self {
        Self::new(value.to_string())
    }
}
