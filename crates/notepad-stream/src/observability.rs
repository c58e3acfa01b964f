use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

const ENABLED_VAR: &str = "NOTEPAD_OBSERVABILITY_ENABLED";
const LEVEL_VAR: &str = "NOTEPAD_LOG_LEVEL";
const JSON_PATH_VAR: &str = "NOTEPAD_JSON_LOG_PATH";
const DEFAULT_JSON_FILE: &str = "notepad.logs.jsonl";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Compact human-readable lines on stderr. Stdout is left to the page.
    Console,
    /// One JSON object per line, appended to a file.
    JsonFile { dir: PathBuf, file_name: String },
}

impl LogSink {
    fn json(path: &Path) -> Self {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_JSON_FILE)
            .to_string();
        Self::JsonFile { dir, file_name }
    }
}

/// Logging settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub enabled: bool,
    /// Filter directive, e.g. `info` or `notepad_stream=debug`.
    pub filter: String,
    pub sink: LogSink,
}

impl LogConfig {
    /// Reads `NOTEPAD_OBSERVABILITY_ENABLED`, `NOTEPAD_LOG_LEVEL`, `RUST_LOG`
    /// and `NOTEPAD_JSON_LOG_PATH`, falling back to `default_level`.
    pub fn from_env(default_level: &str) -> Self {
        Self::resolve(default_level, |key| std::env::var(key).ok())
    }

    fn resolve(default_level: &str, var: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = var(ENABLED_VAR)
            .map(|v| parse_bool(&v).unwrap_or(true))
            .unwrap_or(true);
        let filter = [var(LEVEL_VAR), var("RUST_LOG")]
            .into_iter()
            .flatten()
            .find(|f| EnvFilter::try_new(f).is_ok())
            .unwrap_or_else(|| default_level.to_string());
        let sink = match var(JSON_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            Some(path) => LogSink::json(Path::new(&path)),
            None => LogSink::Console,
        };
        Self {
            enabled,
            filter,
            sink,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

/// Installs the global subscriber once per process; later calls are no-ops.
///
/// See [`LogConfig::from_env`] for the variables consulted.
pub fn init_observability(default_level: &str) {
    init_with_config(LogConfig::from_env(default_level));
}

/// Installs the global subscriber from an explicit config, once per process.
///
/// Returns false when logging was already initialized and `config` was ignored.
pub fn init_with_config(config: LogConfig) -> bool {
    let mut applied = false;
    INIT.get_or_init(|| {
        applied = true;
        install(config);
    });
    applied
}

fn install(config: LogConfig) {
    if !config.enabled {
        return;
    }
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    match config.sink {
        LogSink::Console => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init();
        }
        LogSink::JsonFile { dir, file_name } => {
            let _ = std::fs::create_dir_all(&dir);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(false)
                .with_writer(tracing_appender::rolling::never(dir, file_name));
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init();
        }
    }
}
