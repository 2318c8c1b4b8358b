//! Tracing subscriber setup.

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "filedrive=debug,tower_http=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Install the global subscriber: compact console output, or one JSON object per line
/// when `json` is set (`LOG_FORMAT=json`). Logs go to stderr so stdout stays free for
/// command output.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_telemetry(json: bool) {
    let result = if json {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        let console_fmt = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .event_format(
                Format::default()
                    .compact()
                    .with_target(false)
                    .without_time(),
            );
        tracing_subscriber::registry()
            .with(env_filter())
            .with(console_fmt)
            .try_init()
    };

    if result.is_ok() {
        tracing::info!(json, "Tracing initialized");
    }
}
