/*!
 * Structured Tracing
 * Subscriber bootstrap for the queue's `tracing` events
 *
 * The library itself only emits events (consumer parked, resumed,
 * cancelled; duplicate rejected; watcher fired). Applications and tests
 * that want to see them call [`init_tracing`] once at startup.
 */

use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable selecting JSON output (`1` or `true`)
pub const TRACE_JSON_ENV: &str = "DEDUPQ_TRACE_JSON";

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - DEDUPQ_TRACE_JSON: Enable JSON output (default: false)
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(TRACE_JSON_ENV)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        // JSON output for production/parsing
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
            .is_ok()
    } else {
        // Human-readable output for development
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::info!(json = use_json, "structured tracing initialized");
    }
    installed
}
