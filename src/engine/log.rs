use std::io;
use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::model::Event;
use crate::observability::{WAL_FLUSH_BATCH_SIZE, WAL_FLUSH_DURATION_SECONDS};
use crate::wal::Wal;

/// Durable, ordered record of committed wall events.
///
/// `append` returning `Ok` means the event survives a restart. The engine
/// only applies an event to memory after that.
#[async_trait]
pub trait EventLog: Send + Sync + 'static {
    async fn append(&self, event: &Event) -> io::Result<()>;

    /// Replace the whole log with `events`.
    async fn compact(&self, events: Vec<Event>) -> io::Result<()>;

    async fn appends_since_compact(&self) -> io::Result<u64>;
}

// ── Group-commit WAL channel ─────────────────────────────

enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

type Pending = (Event, oneshot::Sender<io::Result<()>>);

/// `EventLog` backed by a file WAL owned by a background writer task.
pub struct WalLog {
    tx: mpsc::Sender<WalCommand>,
}

impl WalLog {
    /// Replay the WAL at `path`, cut any torn tail, and start the writer task.
    /// Must be called inside a tokio runtime.
    pub fn open(path: &Path) -> io::Result<(Self, Vec<Event>)> {
        let replay = Wal::replay(path)?;
        let wal = Wal::open(path, replay.valid_len)?;
        info!(
            "replayed {} events from {} ({} bytes)",
            replay.events.len(),
            path.display(),
            replay.valid_len
        );
        let (tx, rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, rx));
        Ok((Self { tx }, replay.events))
    }

    async fn request<T>(&self, cmd: WalCommand, rx: oneshot::Receiver<T>) -> io::Result<T> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "WAL writer shut down"))?;
        rx.await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "WAL writer dropped response"))
    }
}

#[async_trait]
impl EventLog for WalLog {
    async fn append(&self, event: &Event) -> io::Result<()> {
        let (response, rx) = oneshot::channel();
        let cmd = WalCommand::Append {
            event: event.clone(),
            response,
        };
        self.request(cmd, rx).await?
    }

    async fn compact(&self, events: Vec<Event>) -> io::Result<()> {
        let (response, rx) = oneshot::channel();
        self.request(WalCommand::Compact { events, response }, rx).await?
    }

    async fn appends_since_compact(&self) -> io::Result<u64> {
        let (response, rx) = oneshot::channel();
        self.request(WalCommand::AppendsSinceCompact { response }, rx).await
    }
}

/// Owns the WAL and batches appends for group commit.
///
/// `Engine` appends while holding the wall write guard, so its batches are
/// always one event long. Batching only kicks in when several tasks append
/// through one `WalLog` directly.
///
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let (event, response) = match cmd {
            WalCommand::Append { event, response } => (event, response),
            other => {
                handle_non_append(&mut wal, other);
                continue;
            }
        };
        let mut batch: Vec<Pending> = vec![(event, response)];
        let mut deferred = None;

        loop {
            match rx.try_recv() {
                Ok(WalCommand::Append { event, response }) => batch.push((event, response)),
                Ok(other) => {
                    // Compaction must see every append that was queued ahead of it.
                    deferred = Some(other);
                    break;
                }
                Err(_) => break,
            }
        }

        flush_and_respond(&mut wal, &mut batch);
        if let Some(other) = deferred {
            handle_non_append(&mut wal, other);
        }
    }
    debug!("WAL writer stopped");
}

fn flush_and_respond(wal: &mut Wal, batch: &mut Vec<Pending>) {
    metrics::histogram!(WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(WAL_FLUSH_DURATION_SECONDS).record(flush_start.elapsed().as_secs_f64());
    for (_, tx) in batch.drain(..) {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn flush_batch(wal: &mut Wal, batch: &[Pending]) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Flush even after an append error so half-buffered bytes don't ride
    // along with the next batch.
    let flush_err = wal.flush_sync().err();
    match (append_err, flush_err) {
        (Some(e), _) | (None, Some(e)) => Err(e),
        (None, None) => Ok(()),
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            if result.is_ok() {
                info!("compacted WAL to {} events", events.len());
            }
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { event, response } => {
            let mut batch = vec![(event, response)];
            flush_and_respond(wal, &mut batch);
        }
    }
}
