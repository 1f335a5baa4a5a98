use std::net::SocketAddr;

use crate::model::Stats;
use crate::sql::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total queries executed. Labels: command, status.
pub const QUERIES_TOTAL: &str = "pixelwall_queries_total";

/// Histogram: query latency in seconds. Labels: command.
pub const QUERY_DURATION_SECONDS: &str = "pixelwall_query_duration_seconds";

/// Counter: reservation attempts. Labels: mode (auto/explicit), outcome.
pub const RESERVATIONS_TOTAL: &str = "pixelwall_reservations_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "pixelwall_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "pixelwall_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "pixelwall_connections_rejected_total";

/// Counter: startup/auth failures.
pub const AUTH_FAILURES_TOTAL: &str = "pixelwall_auth_failures_total";

/// Histogram: time spent waiting for the wall write lock, in seconds.
pub const LOCK_WAIT_SECONDS: &str = "pixelwall_lock_wait_seconds";

/// Counter: writers that gave up waiting for the wall write lock.
pub const LOCK_TIMEOUTS_TOTAL: &str = "pixelwall_lock_timeouts_total";

/// Counter: WAL appends retried after a failure.
pub const COMMIT_RETRIES_TOTAL: &str = "pixelwall_commit_retries_total";

/// Gauge: units of area covered by active ads.
pub const OCCUPIED_PIXELS: &str = "pixelwall_occupied_pixels";

/// Gauge: number of active ads.
pub const ACTIVE_ADS: &str = "pixelwall_active_ads";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "pixelwall_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "pixelwall_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

pub fn record_occupancy(stats: &Stats) {
    metrics::gauge!(OCCUPIED_PIXELS).set(stats.occupied_pixels as f64);
    metrics::gauge!(ACTIVE_ADS).set(stats.total_ads as f64);
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::InsertAd { .. } => "insert_ad",
        Command::UpdateAd { .. } => "update_ad",
        Command::DeleteAd { .. } => "delete_ad",
        Command::SelectAds { .. } => "select_ads",
        Command::SelectAvailability { .. } => "select_availability",
        Command::SelectPosition { .. } => "select_position",
        Command::SelectStats => "select_stats",
    }
}
