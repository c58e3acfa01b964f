use std::fmt;

use crate::event::StreamEvent;

/// Display status of a subscription.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Streaming,
    Done,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Streaming => "streaming",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// `Done` and `Error` end the subscription's state machine.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UI state owned by the display component.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StreamState {
    /// Description of the data source; empty until `meta` arrives.
    pub meta: String,
    /// Accumulated chunks.
    pub text: String,
    pub status: Status,
}

/// Applies one event and returns the next state.
///
/// Once the status is terminal every further event is ignored, so a
/// reconnect after `error` cannot resume or duplicate a finished stream.
pub fn reduce(mut state: StreamState, event: StreamEvent) -> StreamState {
    if state.status.is_terminal() {
        return state;
    }
    match event {
        StreamEvent::Meta(meta) => state.meta = meta,
        StreamEvent::Chunk(chunk) => {
            state.status = Status::Streaming;
            state.text.push_str(&chunk);
        }
        StreamEvent::Done(_) => state.status = Status::Done,
        StreamEvent::Error(_) => state.status = Status::Error,
    }
    state
}
