//! Logging and tracing initialization.
//!
//! A plain configured level applies to the workspace crates only;
//! third-party crates (the GStreamer bindings in particular are chatty
//! at `info`) stay at `warn`. `RUST_LOG` overrides the configuration
//! entirely.

use std::fs::File;
use std::sync::Mutex;

use crate::config::LoggingConfig;

/// Targets the configured level is scoped to.
const WORKSPACE_TARGETS: [&str; 6] = [
    "layercast",
    "layercast_common",
    "layercast_scene",
    "layercast_compositor",
    "layercast_gesture",
    "layercast_capture",
];

/// Expand a configured level into a filter directive string.
///
/// A value containing `=` or `,` is already a directive set and passes
/// through untouched; a bare level gets scoped to the workspace crates.
fn scoped_directives(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let mut directives = String::from("warn");
    for target in WORKSPACE_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Initialize the tracing subscriber with the given configuration.
///
/// Repeated calls are no-ops; the first subscriber wins. When the
/// configured log file cannot be opened, logging falls back to stdout.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(scoped_directives(&config.level)));

    let log_file = config.file.as_ref().and_then(|path| {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Cannot create log directory {}: {e}", parent.display());
                return None;
            }
        }
        match File::create(path) {
            Ok(file) => Some(Mutex::new(file)),
            Err(e) => {
                eprintln!("Cannot open log file {}: {e}", path.display());
                None
            }
        }
    });

    match (log_file, config.json) {
        (Some(file), true) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(file)
                .with_ansi(false)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        (Some(file), false) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        (None, true) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        (None, false) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_is_scoped_to_workspace_crates() {
        let directives = scoped_directives("debug");
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("layercast_capture=debug"));
        assert!(directives.contains("layercast_scene=debug"));
    }

    #[test]
    fn explicit_directives_pass_through() {
        assert_eq!(
            scoped_directives("info,layercast_capture=trace"),
            "info,layercast_capture=trace"
        );
        assert_eq!(scoped_directives("gst=debug"), "gst=debug");
    }
}
