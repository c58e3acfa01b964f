use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::StreamError;
use crate::event::StreamEvent;
use crate::handlers::StreamHandlers;
use crate::options::StreamOptions;
use crate::state::{Status, StreamState, reduce};
use crate::subscription::{CancelHandle, Subscriber, Subscription};

/// Heading rendered above the stream output.
pub const HEADING: &str = "Streaming Notepad";

const CONNECTING_PLACEHOLDER: &str = "(connecting...)";
const WAITING_PLACEHOLDER: &str = "(waiting for stream...)";

/// Self-contained block that streams `data/notepad.txt` and renders it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotepadStream {
    options: StreamOptions,
}

impl Default for NotepadStream {
    fn default() -> Self {
        Self::new()
    }
}

impl NotepadStream {
    pub fn new() -> Self {
        Self {
            options: StreamOptions::default()
                .path("data/notepad.txt")
                .chunk_size(256)
                .delay_ms(10),
        }
    }

    /// Same component with a different option set.
    pub fn with_options(options: StreamOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Opens the component's single subscription.
    pub fn mount(self, subscriber: &Subscriber) -> Result<MountedNotepad, StreamError> {
        let (subscription, events) = open(subscriber, &self.options)?;
        Ok(MountedNotepad {
            subscriber: subscriber.clone(),
            options: self.options,
            state: StreamState::default(),
            events,
            subscription: Some(subscription),
        })
    }
}

fn open(
    subscriber: &Subscriber,
    options: &StreamOptions,
) -> Result<(Subscription, mpsc::UnboundedReceiver<StreamEvent>), StreamError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = subscriber.subscribe(StreamHandlers::forwarding(tx), options)?;
    Ok((subscription, rx))
}

/// A mounted display component owning one live subscription.
///
/// The subscription is cancelled exactly once, by [`MountedNotepad::unmount`]
/// or on drop, whichever comes first.
pub struct MountedNotepad {
    subscriber: Subscriber,
    options: StreamOptions,
    state: StreamState,
    events: mpsc::UnboundedReceiver<StreamEvent>,
    subscription: Option<Subscription>,
}

impl MountedNotepad {
    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        self.subscription.as_ref().map(Subscription::cancel_handle)
    }

    /// Waits for the next event and applies it.
    ///
    /// Returns `None` once the subscription has stopped delivering events.
    pub async fn next_update(&mut self) -> Option<&StreamState> {
        let event = self.events.recv().await?;
        self.apply(event);
        Some(&self.state)
    }

    /// Applies every event that is already queued without waiting.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, event: StreamEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
    }

    /// Re-subscribes when `options` differ from the current set.
    ///
    /// The old subscription is cancelled before the new one opens, and the
    /// state starts over. Returns whether a new subscription was opened. If
    /// opening fails the component is left unsubscribed.
    pub fn set_options(&mut self, options: StreamOptions) -> Result<bool, StreamError> {
        if options == self.options {
            return Ok(false);
        }
        self.release();
        self.state = StreamState::default();
        let (_, closed) = mpsc::unbounded_channel();
        self.events = closed;

        let (subscription, events) = open(&self.subscriber, &options)?;
        debug!(?options, "notepad options changed, resubscribed");
        self.subscription = Some(subscription);
        self.options = options;
        self.events = events;
        Ok(true)
    }

    /// Tears the component down, cancelling its subscription.
    ///
    /// Returns whether the cancellation closed a still-open connection.
    pub fn unmount(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        match self.subscription.take() {
            Some(subscription) => subscription.cancel(),
            None => false,
        }
    }

    pub fn render(&self) -> String {
        render_state(&self.state)
    }
}

impl Drop for MountedNotepad {
    fn drop(&mut self) {
        self.release();
    }
}

/// Renders a state as a text block.
pub fn render_state(state: &StreamState) -> String {
    let source = if state.meta.is_empty() {
        CONNECTING_PLACEHOLDER
    } else {
        state.meta.as_str()
    };
    let body = if !state.text.is_empty() {
        state.text.as_str()
    } else if state.status == Status::Idle {
        WAITING_PLACEHOLDER
    } else {
        ""
    };
    format!(
        "{HEADING}\nsource: {source}\nstatus: {}\n{}\n{body}\n{}\n",
        state.status,
        "-".repeat(40),
        "-".repeat(40)
    )
}
