//! Reservation service: the single-writer scope around the wall.
//!
//! Writers hold the owned write guard across load, decide and commit, so two
//! reservations can never both see the same free space.

mod conflict;
mod error;
mod log;
mod mutations;
mod queries;

pub use error::EngineError;
pub use log::{EventLog, WalLog};
pub use queries::Availability;

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::{error, info, warn};

use crate::alloc;
use crate::limits::{COMMIT_BACKOFF_MS, MAX_COMMIT_RETRIES};
use crate::model::*;
use crate::observability::{self, COMMIT_RETRIES_TOTAL, LOCK_TIMEOUTS_TOTAL, LOCK_WAIT_SECONDS};

pub type SharedWallState = Arc<RwLock<WallState>>;

pub struct Engine {
    state: SharedWallState,
    log: Arc<dyn EventLog>,
    lock_timeout: Option<Duration>,
    /// Set when an append failed for good and the log could not be rewritten
    /// afterwards. Writers are refused until a rewrite succeeds.
    poisoned: Arc<AtomicBool>,
}

impl Engine {
    /// Open the WAL at `wal_path`, rebuild the wall from it and start the writer.
    pub fn open(wal_path: &Path) -> io::Result<Self> {
        let (log, events) = WalLog::open(wal_path)?;
        Ok(Self::with_log(Arc::new(log), &events))
    }

    /// Build an engine over any log, replaying `events` into a fresh wall.
    pub fn with_log(log: Arc<dyn EventLog>, events: &[Event]) -> Self {
        let mut wall = WallState::new();
        for event in events {
            wall.apply(event);
        }
        observability::record_occupancy(&alloc::aggregate(wall.ads()));
        Self {
            state: Arc::new(RwLock::new(wall)),
            log,
            lock_timeout: None,
            poisoned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Writers that wait longer than `timeout` for the write scope fail with `Timeout`.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    async fn acquire_write(&self) -> Result<OwnedRwLockWriteGuard<WallState>, EngineError> {
        let start = Instant::now();
        let lock = self.state.clone().write_owned();
        let guard = match self.lock_timeout {
            Some(timeout) => tokio::time::timeout(timeout, lock).await.map_err(|_| {
                metrics::counter!(LOCK_TIMEOUTS_TOTAL).increment(1);
                EngineError::Timeout
            })?,
            None => lock.await,
        };
        metrics::histogram!(LOCK_WAIT_SECONDS).record(start.elapsed().as_secs_f64());

        if self.poisoned.load(Ordering::SeqCst) && !reconcile(self.log.as_ref(), &guard, &self.poisoned).await {
            return Err(EngineError::StoreUnavailable("event log awaiting rewrite after a failed append".into()));
        }
        Ok(guard)
    }

    /// Make `event` durable, then apply it. Runs on its own task holding the
    /// write guard, so a caller dropped mid-commit cannot split the log from
    /// the in-memory wall. Hands the guard back for reading the result.
    ///
    /// An append that fails for good may still have reached the log, so the
    /// log is rewritten from the wall before the guard is released.
    async fn commit(
        &self,
        mut guard: OwnedRwLockWriteGuard<WallState>,
        event: Event,
    ) -> Result<OwnedRwLockWriteGuard<WallState>, EngineError> {
        let log = self.log.clone();
        let poisoned = self.poisoned.clone();
        tokio::spawn(async move {
            if let Err(e) = append_with_retry(log.as_ref(), &event).await {
                reconcile(log.as_ref(), &guard, &poisoned).await;
                return Err(e);
            }
            guard.apply(&event);
            observability::record_occupancy(&alloc::aggregate(guard.active_ads()));
            Ok(guard)
        })
        .await
        .map_err(|e| EngineError::StoreUnavailable(format!("commit task failed: {e}")))?
    }
}

/// Rewrite the log from `wall`, dropping anything a failed append left
/// behind. Returns whether the log is trustworthy again.
async fn reconcile(log: &dyn EventLog, wall: &WallState, poisoned: &AtomicBool) -> bool {
    match log.compact(mutations::snapshot_events(wall)).await {
        Ok(()) => {
            poisoned.store(false, Ordering::SeqCst);
            info!("event log rewritten from {} ads", wall.ads().count());
            true
        }
        Err(e) => {
            poisoned.store(true, Ordering::SeqCst);
            error!("event log rewrite failed, refusing writes: {e}");
            false
        }
    }
}

async fn append_with_retry(log: &dyn EventLog, event: &Event) -> Result<(), EngineError> {
    let mut attempt: u32 = 0;
    loop {
        match log.append(event).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < MAX_COMMIT_RETRIES => {
                let backoff = COMMIT_BACKOFF_MS[(attempt as usize).min(COMMIT_BACKOFF_MS.len() - 1)];
                warn!(
                    "WAL append for ad {} failed (attempt {}): {e}; retrying in {backoff}ms",
                    event.ad_id(),
                    attempt + 1
                );
                metrics::counter!(COMMIT_RETRIES_TOTAL).increment(1);
                tokio::time::sleep(Duration::from_millis(backoff)).await;
                attempt += 1;
            }
            Err(e) => return Err(EngineError::StoreUnavailable(e.to_string())),
        }
    }
}
