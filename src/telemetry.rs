// src/telemetry.rs
use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// One-time metrics registration (so series carry descriptions once a recorder exists).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("gateway_requests_total", "Gateway round trips, by operation.");
        describe_counter!("gateway_errors_total", "Failed gateway round trips, by operation.");
        describe_histogram!("gateway_request_ms", "Gateway round trip time in milliseconds.");
        describe_counter!(
            "term_mutations_total",
            "Successful term mutations (create/update/delete)."
        );
        describe_counter!("manual_runs_total", "Settled manual runs, by outcome.");
        describe_counter!(
            "manual_runs_busy_total",
            "Manual runs rejected because another run was in flight."
        );
    });
}

/// Install a global tracing subscriber for the binaries.
///
/// Filter comes from `RUST_LOG` (default `x_monitor=info,warn`); set
/// `X_MONITOR_LOG_JSON=1` for JSON lines. Calling it twice is a no-op.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("x_monitor=info,warn"));

    let json = std::env::var("X_MONITOR_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact().with_target(false)).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
