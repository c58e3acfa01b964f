use std::io::Write;

use tracing::info;

use crate::display::MountedNotepad;
use crate::errors::StreamError;
use crate::state::Status;

/// Page title.
pub const TITLE: &str = "Search Demo";

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// A block of the host page that renders itself as text.
pub trait Panel: Send {
    fn render(&self) -> String;
}

impl Panel for MountedNotepad {
    fn render(&self) -> String {
        MountedNotepad::render(self)
    }
}

/// Fixed text block, used where a feature lives outside this crate.
#[derive(Clone, Debug)]
pub struct StaticPanel {
    heading: String,
    body: String,
}

impl StaticPanel {
    pub fn new(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
        }
    }
}

impl Panel for StaticPanel {
    fn render(&self) -> String {
        format!("{}\n{}\n", self.heading, self.body)
    }
}

/// Layout that stacks the search panel and the streaming notepad.
pub struct HostPage {
    search: Box<dyn Panel>,
    notepad: MountedNotepad,
    clear_screen: bool,
}

impl HostPage {
    pub fn new(search: impl Panel + 'static, notepad: MountedNotepad) -> Self {
        Self {
            search: Box::new(search),
            notepad,
            clear_screen: true,
        }
    }

    /// Whether each frame starts by clearing the terminal (default on).
    pub fn clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn notepad(&self) -> &MountedNotepad {
        &self.notepad
    }

    pub fn render(&self) -> String {
        format!(
            "{TITLE}\n{}\n\n{}\n{}",
            "=".repeat(TITLE.len()),
            self.search.render(),
            self.notepad.render()
        )
    }

    fn write_frame<W: Write>(&self, out: &mut W) -> Result<(), StreamError> {
        let mut frame = String::new();
        if self.clear_screen {
            frame.push_str(CLEAR_SCREEN);
        }
        frame.push_str(&self.render());
        out.write_all(frame.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| StreamError::Render(e.to_string()))
    }

    /// Renders once, then re-renders after every update until the stream
    /// reaches a terminal status or stops delivering events.
    ///
    /// Returns the last status. The subscription stays mounted; drop the page
    /// or call [`HostPage::close`] to release it.
    pub async fn run<W: Write>(&mut self, out: &mut W) -> Result<Status, StreamError> {
        self.write_frame(out)?;
        loop {
            let Some(state) = self.notepad.next_update().await else {
                break;
            };
            let status = state.status;
            self.notepad.drain_pending();
            self.write_frame(out)?;
            if status.is_terminal() || self.notepad.state().status.is_terminal() {
                break;
            }
        }
        let status = self.notepad.state().status;
        info!(%status, bytes = self.notepad.state().text.len(), "notepad stream settled");
        Ok(status)
    }

    /// Unmounts the notepad, cancelling its subscription.
    pub fn close(self) -> bool {
        self.notepad.unmount()
    }
}
