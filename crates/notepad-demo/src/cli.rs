use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "notepad-demo")]
#[command(version, about = "Stream a text file over SSE into a terminal notepad", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Subscribe to a notepad stream and render the demo page
    Watch(WatchArgs),
    /// Run the notepad SSE server
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Base URL of the notepad server
    #[arg(long, env = "NOTEPAD_BASE_URL", default_value = "http://127.0.0.1:8000")]
    pub base_url: String,

    /// File to stream, relative to the server root
    #[arg(long, default_value = "data/notepad.txt")]
    pub path: String,

    /// Characters per chunk
    #[arg(long, default_value_t = 256)]
    pub chunk_size: u32,

    /// Milliseconds between chunks
    #[arg(long, default_value_t = 10)]
    pub delay_ms: u64,

    /// Append frames instead of redrawing the screen
    #[arg(long)]
    pub no_clear: bool,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "NOTEPAD_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Directory that relative file paths resolve against
    #[arg(long, env = "NOTEPAD_ROOT", default_value = ".")]
    pub root: PathBuf,
}
