//! Diagnostic channel bootstrap.
//!
//! Every event is written to stderr. Stdout is reserved for the payload the
//! calling process parses.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `filter` falls back to `default_level`
/// when absent or unparsable. Calling this twice is harmless.
pub fn init(filter: Option<&str>, default_level: &str) {
    let env_filter = filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
