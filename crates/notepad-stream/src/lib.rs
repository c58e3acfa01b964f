//! Client side of the streaming notepad: an SSE subscription helper, a
//! reducer over its events, and a text-rendered display component.
//!
//! # Mounting the display
//!
//! ```no_run
//! use notepad_stream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), StreamError> {
//! let subscriber = Subscriber::new(ClientConfig::new("http://127.0.0.1:8000"))?;
//! let mut notepad = NotepadStream::new().mount(&subscriber)?;
//!
//! while let Some(state) = notepad.next_update().await {
//!     if state.status.is_terminal() {
//!         break;
//!     }
//! }
//! println!("{}", notepad.render());
//! notepad.unmount();
//! # Ok(())
//! # }
//! ```
//!
//! # Raw callbacks
//!
//! ```no_run
//! use notepad_stream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), StreamError> {
//! let subscription = notepad_stream::subscribe(
//!     StreamHandlers::new()
//!         .on_chunk(|text| print!("{text}"))
//!         .on_error(|signal| eprintln!("stream error: {signal}")),
//!     &StreamOptions::default().chunk_size(64),
//! )?;
//! subscription.wait_closed().await;
//! # Ok(())
//! # }
//! ```

/// Client configuration.
pub mod config;
/// Display component and its rendering.
pub mod display;
/// Public error types.
pub mod errors;
/// Event variants delivered by a subscription.
pub mod event;
/// Callback table for subscriptions.
pub mod handlers;
/// Logging setup.
pub mod observability;
/// Query options for the stream endpoint.
pub mod options;
/// Host page layout.
pub mod page;
/// Common imports for typical usage.
pub mod prelude;
/// Connection transport contract and the HTTP implementation.
pub mod source;
/// UI state and its reducer.
pub mod state;
/// Subscription lifecycle: subscribe, dispatch, reconnect, cancel.
pub mod subscription;
/// SSE frame decoding.
pub mod transport;

pub use config::{ClientConfig, NOTEPAD_ENDPOINT};
pub use display::{MountedNotepad, NotepadStream, render_state};
pub use errors::{ErrorSignal, StreamError, TransportError};
pub use event::StreamEvent;
pub use handlers::StreamHandlers;
pub use options::StreamOptions;
pub use page::{HostPage, Panel, StaticPanel};
pub use source::{FrameStream, HttpTransport, StreamTransport};
pub use state::{Status, StreamState, reduce};
pub use subscription::{CancelHandle, ReadyState, Subscriber, Subscription, subscribe};
pub use transport::{SseDecoder, SseFrame};
