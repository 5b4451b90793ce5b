//! Structured, leveled logging setup. Every phase transition, hydration step,
//! hook invocation and error is expected to log through `tracing`; this module
//! only owns global subscriber initialization. Redaction of secret-shaped
//! values is layered on top by `sdp-redaction` at the call site that owns the
//! global subscriber (the CLI entry point), not here.

use tracing_subscriber::EnvFilter;

/// Output format for the process-wide log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Initialize the global `tracing` subscriber. Honors `RUST_LOG` via
/// [`EnvFilter`], defaulting to `info` when unset. Safe to call once per
/// process; a second call is a no-op (the underlying `try_init` swallows
/// the "already set" error).
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match format {
        LogFormat::Pretty => subscriber.try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    };
    if let Err(e) = result {
        tracing::debug!("logging subscriber already initialized: {e}");
    }
}
