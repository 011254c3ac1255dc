//! Tracing subscriber setup.
//!
//! Only the binary calls [`init`]; the library never installs a subscriber.
//! Output goes to stderr so stdout stays machine-readable.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log format written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Default filter directive for a level.
#[must_use]
pub fn default_directive(level: &str) -> String {
    format!("warn,heartbeat_rs={level}")
}

/// Installs the global subscriber.
///
/// Priority: `RUST_LOG` > `level`. A second call is a no-op.
pub fn init(level: &str, format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .ok(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok(),
    };
}
