//! Packet writer that ties together packet parsing, the interval index and
//! the splice store.

use std::path::Path;

use interval::{IndexError, Interval, IntervalIndex};
use packet::Packet;
use splice::{SpliceError, SpliceStore};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("packet id {0} already stored")]
    DuplicateIdentifier(u16),
    #[error("io failure: {0}")]
    Io(#[from] SpliceError),
}

impl From<IndexError> for WriteError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DuplicateIdentifier { id } => WriteError::DuplicateIdentifier(id),
        }
    }
}

/// What happened to a packet handed to [`PacketWriter::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Header-only or truncated packet; nothing was written.
    Dropped,
    /// Payload spliced in at `offset`.
    Stored { id: u16, offset: u64, len: u64 },
}

/// Writes packet payloads into one backing file, ordered by packet id.
///
/// # Write Path
///
/// 1. Parse the header; undersized packets are dropped.
/// 2. Locate the id in the index (read-only). Duplicates fail here, before
///    any byte is written.
/// 3. Splice the payload into the file at the run boundary the index reports.
/// 4. Commit the id to the index.
///
/// The index lives only in memory, so a writer always starts from an empty
/// backing file.
#[derive(Debug)]
pub struct PacketWriter {
    index: IntervalIndex,
    store: SpliceStore,
}

impl PacketWriter {
    /// Creates a writer over `path`.
    ///
    /// A file already at `path` is removed: without the index that produced
    /// it, its identifier boundaries are unknown.
    ///
    /// If `sync` is `true`, every splice is followed by `fsync`.
    pub fn create<P: AsRef<Path>>(path: P, sync: bool) -> Result<Self, WriteError> {
        let store = SpliceStore::new(path, sync);
        if store.reset()? {
            warn!(path = %store.path().display(), "writer.removed_stale_file");
        }
        Ok(Self {
            index: IntervalIndex::new(),
            store,
        })
    }

    /// Handles one raw packet.
    pub fn write(&mut self, raw: &[u8]) -> Result<WriteOutcome, WriteError> {
        let Some(packet) = Packet::parse(raw) else {
            debug!(len = raw.len(), "writer.drop_undersized");
            return Ok(WriteOutcome::Dropped);
        };

        let k = self.index.locate(packet.id)?;
        let offset = self.index.insertion_offset(k);
        let len = packet.payload.len() as u64;

        self.store
            .insert_payload(offset, packet.payload, self.index.total_len())?;
        self.index.commit(packet.id, len, k);

        debug!(
            id = packet.id,
            offset,
            len,
            intervals = self.index.len(),
            "writer.commit"
        );
        Ok(WriteOutcome::Stored {
            id: packet.id,
            offset,
            len,
        })
    }

    /// The live interval index.
    pub fn index(&self) -> &IntervalIndex {
        &self.index
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Full contents of the backing file.
    pub fn contents(&self) -> Result<Vec<u8>, WriteError> {
        Ok(self.store.read_all()?)
    }

    /// Bytes of the run holding `id`, or `None` if `id` is not stored.
    ///
    /// Runs are the finest granularity the index keeps, so the returned
    /// bytes cover every identifier merged with `id`.
    pub fn read_run(&self, id: u16) -> Result<Option<(Interval, Vec<u8>)>, WriteError> {
        match self.index.run_containing(id) {
            Some((run, range)) => Ok(Some((run, self.store.read_range(range)?))),
            None => Ok(None),
        }
    }
}
