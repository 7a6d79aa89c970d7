#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! The layout crates log through the re-exported `tracing` macros. Hosts that
//! do not install their own subscriber can enable the `tracing-json` feature
//! and call [`init_json_logging`] (production) or [`init_logging`] (human
//! readable) once at startup.
//!
//! The filter is read from the `REPLAY_LOG` environment variable using
//! `EnvFilter` directive syntax (`replay_layout=debug,warn`) and defaults to
//! `warn`.

pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "REPLAY_LOG";

/// Filter used when [`LOG_ENV_VAR`] is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[cfg(feature = "tracing-json")]
fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install a global JSON subscriber.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter())
        .with_current_span(true)
        .try_init()
        .is_ok()
}

/// Install a global human-readable subscriber writing to stderr.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
