use tokio::sync::mpsc;

use crate::errors::ErrorSignal;
use crate::event::StreamEvent;

type TextHandler = Box<dyn FnMut(String) + Send + 'static>;
type ErrorHandler = Box<dyn FnMut(ErrorSignal) + Send + 'static>;

/// Callback table for a subscription.
///
/// Every handler is optional; events without a handler are dropped.
/// Handlers run on the subscription task, one at a time, in server order.
#[derive(Default)]
pub struct StreamHandlers {
    on_meta: Option<TextHandler>,
    on_chunk: Option<TextHandler>,
    on_done: Option<TextHandler>,
    on_error: Option<ErrorHandler>,
}

impl StreamHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler table that forwards every event into `tx`.
    ///
    /// Send failures (receiver gone) are ignored.
    pub fn forwarding(tx: mpsc::UnboundedSender<StreamEvent>) -> Self {
        let meta_tx = tx.clone();
        let chunk_tx = tx.clone();
        let done_tx = tx.clone();
        Self::new()
            .on_meta(move |data| {
                let _ = meta_tx.send(StreamEvent::Meta(data));
            })
            .on_chunk(move |data| {
                let _ = chunk_tx.send(StreamEvent::Chunk(data));
            })
            .on_done(move |data| {
                let _ = done_tx.send(StreamEvent::Done(data));
            })
            .on_error(move |signal| {
                let _ = tx.send(StreamEvent::Error(signal));
            })
    }

    pub fn on_meta(mut self, handler: impl FnMut(String) + Send + 'static) -> Self {
        self.on_meta = Some(Box::new(handler));
        self
    }

    pub fn on_chunk(mut self, handler: impl FnMut(String) + Send + 'static) -> Self {
        self.on_chunk = Some(Box::new(handler));
        self
    }

    pub fn on_done(mut self, handler: impl FnMut(String) + Send + 'static) -> Self {
        self.on_done = Some(Box::new(handler));
        self
    }

    pub fn on_error(mut self, handler: impl FnMut(ErrorSignal) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    pub(crate) fn dispatch(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Meta(data) => {
                if let Some(handler) = self.on_meta.as_mut() {
                    handler(data);
                }
            }
            StreamEvent::Chunk(data) => {
                if let Some(handler) = self.on_chunk.as_mut() {
                    handler(data);
                }
            }
            StreamEvent::Done(data) => {
                if let Some(handler) = self.on_done.as_mut() {
                    handler(data);
                }
            }
            StreamEvent::Error(signal) => {
                if let Some(handler) = self.on_error.as_mut() {
                    handler(signal);
                }
            }
        }
    }
}
