//! Tracing subscriber setup shared by the binaries.
//!
//! `TICKERBOARD_LOG` sets the filter (falling back to `RUST_LOG`, then
//! `info`). `TICKERBOARD_LOG_FORMAT` picks `plain` or `json` output.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TICKERBOARD_LOG";
pub const LOG_FORMAT_ENV: &str = "TICKERBOARD_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Plain,
        }
    }

    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

/// Filter directive from the environment, `info` when unset.
pub fn filter_directive(own: Option<String>, rust_log: Option<String>) -> String {
    own.filter(|value| !value.trim().is_empty())
        .or(rust_log.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| "info".to_string())
}

fn env_filter() -> EnvFilter {
    EnvFilter::new(filter_directive(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    ))
}

/// Log to stderr. A second call is a no-op.
pub fn init() {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_target(false);

    let _ = match LogFormat::from_env() {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Plain => builder.try_init(),
    };
}

/// Log to a file, appending. Used when the terminal belongs to the UI.
pub fn init_file(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file: File = OpenOptions::new().create(true).append(true).open(path)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false);

    let _ = match LogFormat::from_env() {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Plain => builder.try_init(),
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_variable_wins() {
        assert_eq!(
            filter_directive(Some("debug".into()), Some("warn".into())),
            "debug"
        );
    }

    #[test]
    fn falls_back_to_rust_log_then_info() {
        assert_eq!(filter_directive(Some("  ".into()), Some("warn".into())), "warn");
        assert_eq!(filter_directive(None, None), "info");
    }

    #[test]
    fn format_names() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("plain"), LogFormat::Plain);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Plain);
    }
}
