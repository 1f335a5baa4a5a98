use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::{Engine, EngineError};

/// How often the compactor checks the WAL growth.
pub const COMPACT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Background task that rewrites the WAL once it has grown by `threshold` appends.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut interval = tokio::time::interval(COMPACT_CHECK_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = compact_if_due(&engine, threshold).await {
            warn!("WAL compaction failed: {e}");
        }
    }
}

/// Compact when at least `threshold` appends happened since the last compaction.
/// Returns the number of events written, or `None` when nothing was due.
pub async fn compact_if_due(engine: &Engine, threshold: u64) -> Result<Option<usize>, EngineError> {
    let appends = engine.log_appends_since_compact().await?;
    if appends < threshold {
        debug!("compaction not due ({appends}/{threshold} appends)");
        return Ok(None);
    }
    let written = engine.compact_log().await?;
    info!("compacted WAL: {appends} appends folded into {written} events");
    Ok(Some(written))
}
