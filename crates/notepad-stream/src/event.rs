use crate::errors::ErrorSignal;
use crate::transport::SseFrame;

/// Events a subscription delivers, in server order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// Description of the data source; expected once at stream start.
    Meta(String),
    /// Fragment of the file to append.
    Chunk(String),
    /// Successful end of stream. Nothing follows it.
    Done(String),
    /// Transport-level failure.
    Error(ErrorSignal),
}

impl StreamEvent {
    /// Maps a decoded frame onto one of the three named events.
    ///
    /// Frames with another event name, or without a data field, are not
    /// dispatched.
    pub fn from_frame(frame: SseFrame) -> Option<Self> {
        let data = frame.data?;
        match frame.event.as_deref()? {
            "meta" => Some(Self::Meta(data)),
            "chunk" => Some(Self::Chunk(data)),
            "done" => Some(Self::Done(data)),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}
