//! Common imports for mounting the notepad and driving subscriptions.
pub use crate::{
    CancelHandle, ClientConfig, ErrorSignal, HostPage, MountedNotepad, NotepadStream, Panel,
    StaticPanel, Status, StreamError, StreamEvent, StreamHandlers, StreamOptions, StreamState,
    Subscriber, Subscription,
};
