use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the notepad server.
#[derive(Clone, Debug)]
pub struct ServeConfig {
    /// Address to bind.
    pub bind: SocketAddr,
    /// Directory that relative `path` parameters resolve against.
    pub root: PathBuf,
    /// File streamed when the request names none.
    pub default_path: String,
    pub default_chunk_size: usize,
    pub default_delay_ms: u64,
    /// Interval between keep-alive comments on idle streams.
    pub keep_alive: Duration,
}

/// Largest accepted `chunk_size`.
pub const MAX_CHUNK_SIZE: usize = 8192;
/// Largest accepted `delay_ms`.
pub const MAX_DELAY_MS: u64 = 5000;

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            root: PathBuf::from("."),
            default_path: "data/notepad.txt".to_string(),
            default_chunk_size: 256,
            default_delay_ms: 25,
            keep_alive: Duration::from_secs(15),
        }
    }
}

impl ServeConfig {
    pub fn bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}
