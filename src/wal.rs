use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::model::Event;

/// Largest payload a record may carry. Validated ads encode to a few KiB;
/// a longer length prefix can only come from a damaged file.
pub const MAX_RECORD_LEN: usize = 1 << 20;

/// Encode a single event as `[len][bincode][crc32]`. Returns bytes written.
fn encode_event(writer: &mut impl Write, event: &Event) -> io::Result<u64> {
    let payload =
        bincode::serialize(event).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if payload.len() > MAX_RECORD_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "event too large for WAL"));
    }
    let len = payload.len() as u32;
    let crc = crc32fast::hash(&payload);
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.write_all(&crc.to_le_bytes())?;
    Ok(8 + payload.len() as u64)
}

/// Result of reading a WAL from disk.
#[derive(Debug, Default)]
pub struct Replay {
    pub events: Vec<Event>,
    /// Byte offset just past the last intact record.
    pub valid_len: u64,
    /// File size on disk. Larger than `valid_len` when the tail is torn or corrupt.
    pub file_len: u64,
}

/// Append-only write-ahead log of wall events.
///
/// Format per entry: `[u32 le: len][bincode: Event][u32 le: crc32 of payload]`.
/// A torn or corrupt tail is cut off at open so that new appends are never
/// stranded behind unreadable bytes.
pub struct Wal {
    writer: BufWriter<File>,
    path: PathBuf,
    appends_since_compact: u64,
}

impl Wal {
    /// Open (or create) the WAL at `path`, truncating to `valid_len` first
    /// when the file is longer than that.
    pub fn open(path: &Path, valid_len: u64) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let file_len = file.metadata()?.len();
        if file_len > valid_len {
            warn!(
                "truncating WAL {} from {file_len} to {valid_len} bytes (torn tail)",
                path.display()
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            appends_since_compact: 0,
        })
    }

    /// Append a single event and fsync. Used by tests only; the engine
    /// batches through `append_buffered` + `flush_sync`.
    #[cfg(test)]
    pub fn append(&mut self, event: &Event) -> io::Result<()> {
        self.append_buffered(event)?;
        self.flush_sync()
    }

    /// Buffer one event without flushing. `flush_sync` makes the batch durable.
    pub fn append_buffered(&mut self, event: &Event) -> io::Result<()> {
        encode_event(&mut self.writer, event)?;
        self.appends_since_compact += 1;
        Ok(())
    }

    /// Flush the BufWriter and fsync the underlying file.
    pub fn flush_sync(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write compacted events to a temp file and fsync. Slow; the live WAL is untouched.
    pub fn write_compact_file(path: &Path, events: &[Event]) -> io::Result<()> {
        let tmp_path = path.with_extension("wal.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        for event in events {
            encode_event(&mut writer, event)?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Rename the temp file over the WAL and reopen it for appends. Anything
    /// still buffered from a failed flush belongs to the replaced file.
    pub fn swap_compact_file(&mut self) -> io::Result<()> {
        let tmp_path = self.path.with_extension("wal.tmp");
        fs::rename(&tmp_path, &self.path)?;
        let file = OpenOptions::new().append(true).open(&self.path)?;
        self.writer = BufWriter::new(file);
        self.appends_since_compact = 0;
        Ok(())
    }

    #[cfg(test)]
    pub fn compact(&mut self, events: &[Event]) -> io::Result<()> {
        Self::write_compact_file(&self.path, events)?;
        self.swap_compact_file()
    }

    pub fn appends_since_compact(&self) -> u64 {
        self.appends_since_compact
    }

    /// Read every intact event. Stops at the first short or corrupt record.
    pub fn replay(path: &Path) -> io::Result<Replay> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Replay::default()),
            Err(e) => return Err(e),
        };
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let mut replay = Replay {
            file_len,
            ..Replay::default()
        };

        while let Some((event, size)) = read_record(&mut reader)? {
            replay.events.push(event);
            replay.valid_len += size;
        }
        Ok(replay)
    }
}

/// One record, or `None` at EOF or at the first damaged record.
fn read_record(reader: &mut impl Read) -> io::Result<Option<(Event, u64)>> {
    let mut len_buf = [0u8; 4];
    if !read_full(reader, &mut len_buf)? {
        return Ok(None);
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_RECORD_LEN {
        return Ok(None);
    }

    let mut payload = vec![0u8; len];
    if !read_full(reader, &mut payload)? {
        return Ok(None);
    }

    let mut crc_buf = [0u8; 4];
    if !read_full(reader, &mut crc_buf)? {
        return Ok(None);
    }
    if u32::from_le_bytes(crc_buf) != crc32fast::hash(&payload) {
        return Ok(None);
    }

    match bincode::deserialize::<Event>(&payload) {
        Ok(event) => Ok(Some((event, 8 + len as u64))),
        Err(_) => Ok(None),
    }
}

/// `read_exact` that reports a clean or torn EOF as `false`.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;
    use ulid::Ulid;

    fn tmp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("pixelwall_test_wal");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = fs::remove_file(&path);
        path
    }

    fn created(x: i32) -> Event {
        Event::AdCreated {
            id: Ulid::new(),
            rect: Rect::new(x, 0, 10, 10),
            price: 100,
            business_name: "Acme".into(),
            description: Some("widgets".into()),
            image_url: "https://acme.test/a.png".into(),
            target_url: "https://acme.test".into(),
            alt: None,
            at: 1_700_000_000_000,
        }
    }

    #[test]
    fn append_and_replay() {
        let path = tmp_path("append_and_replay.wal");
        let first = created(0);
        let events = vec![
            first.clone(),
            Event::AdRemoved { id: first.ad_id(), at: 1_700_000_000_500 },
        ];

        {
            let mut wal = Wal::open(&path, 0).unwrap();
            for e in &events {
                wal.append(e).unwrap();
            }
        }

        let replay = Wal::replay(&path).unwrap();
        assert_eq!(replay.events, events);
        assert_eq!(replay.valid_len, replay.file_len);
    }

    #[test]
    fn replay_nonexistent_file() {
        let path = tmp_path("nonexistent.wal");
        let replay = Wal::replay(&path).unwrap();
        assert!(replay.events.is_empty());
        assert_eq!(replay.file_len, 0);
    }

    #[test]
    fn torn_tail_is_reported_and_truncated_on_open() {
        let path = tmp_path("torn_tail.wal");
        let event = created(0);
        {
            let mut wal = Wal::open(&path, 0).unwrap();
            wal.append(&event).unwrap();
        }
        {
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(&[0xAB; 6]).unwrap();
        }

        let replay = Wal::replay(&path).unwrap();
        assert_eq!(replay.events, vec![event.clone()]);
        assert_eq!(replay.file_len, replay.valid_len + 6);

        // Appending after a truncating open must keep the new record readable.
        let later = created(10);
        {
            let mut wal = Wal::open(&path, replay.valid_len).unwrap();
            wal.append(&later).unwrap();
        }
        let replay = Wal::replay(&path).unwrap();
        assert_eq!(replay.events, vec![event, later]);
        assert_eq!(replay.valid_len, replay.file_len);
    }

    #[test]
    fn replay_stops_at_bad_crc() {
        let path = tmp_path("corrupt_crc.wal");
        let good = created(0);
        {
            let mut wal = Wal::open(&path, 0).unwrap();
            wal.append(&good).unwrap();
        }
        {
            let payload = bincode::serialize(&created(10)).unwrap();
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(&(payload.len() as u32).to_le_bytes()).unwrap();
            f.write_all(&payload).unwrap();
            f.write_all(&0xDEADBEEFu32.to_le_bytes()).unwrap();
        }

        let replay = Wal::replay(&path).unwrap();
        assert_eq!(replay.events, vec![good]);
        assert!(replay.file_len > replay.valid_len);
    }

    #[test]
    fn oversized_length_prefix_is_a_damaged_tail() {
        let path = tmp_path("oversized_len.wal");
        let good = created(0);
        {
            let mut wal = Wal::open(&path, 0).unwrap();
            wal.append(&good).unwrap();
        }
        {
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(&u32::MAX.to_le_bytes()).unwrap();
            f.write_all(&[0u8; 32]).unwrap();
        }

        let replay = Wal::replay(&path).unwrap();
        assert_eq!(replay.events, vec![good.clone()]);
        assert_eq!(replay.file_len, replay.valid_len + 36);

        // Reopening drops the damaged tail so later appends replay.
        let later = created(10);
        {
            let mut wal = Wal::open(&path, replay.valid_len).unwrap();
            wal.append(&later).unwrap();
        }
        assert_eq!(Wal::replay(&path).unwrap().events, vec![good, later]);
    }

    #[test]
    fn oversized_event_is_refused() {
        let path = tmp_path("oversized_event.wal");
        let mut event = created(0);
        if let Event::AdCreated { description, .. } = &mut event {
            *description = Some("x".repeat(MAX_RECORD_LEN));
        }
        let mut wal = Wal::open(&path, 0).unwrap();
        let err = wal.append(&event).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn compact_then_append() {
        let path = tmp_path("compact_append.wal");
        let keep = created(0);
        let churn: Vec<Event> = (1..20).map(|i| created(i * 10)).collect();
        let later = created(500);

        {
            let mut wal = Wal::open(&path, 0).unwrap();
            wal.append(&keep).unwrap();
            for e in &churn {
                wal.append(e).unwrap();
            }
            assert_eq!(wal.appends_since_compact(), 20);
            let before = fs::metadata(&path).unwrap().len();

            wal.compact(std::slice::from_ref(&keep)).unwrap();
            assert_eq!(wal.appends_since_compact(), 0);
            assert!(fs::metadata(&path).unwrap().len() < before);

            wal.append(&later).unwrap();
        }

        let replay = Wal::replay(&path).unwrap();
        assert_eq!(replay.events, vec![keep, later]);
    }

    #[test]
    fn buffered_appends_are_durable_after_flush() {
        let path = tmp_path("buffered_flush.wal");
        let events: Vec<Event> = (0..5).map(|i| created(i * 10)).collect();
        {
            let mut wal = Wal::open(&path, 0).unwrap();
            for e in &events {
                wal.append_buffered(e).unwrap();
            }
            wal.flush_sync().unwrap();
        }
        assert_eq!(Wal::replay(&path).unwrap().events, events);
    }
}
