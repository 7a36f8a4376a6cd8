use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::copy::copy_range;
use crate::SpliceError;

/// Inserts payloads into the backing file at arbitrary offsets.
///
/// The store holds only the path and the sync flag. Every call opens the
/// file, does its work, and drops the handle before returning, so nothing is
/// held open between insertions.
#[derive(Debug, Clone)]
pub struct SpliceStore {
    path: PathBuf,
    sync: bool,
}

impl SpliceStore {
    /// Creates a store over `path`. The file is not touched until the first
    /// insertion.
    ///
    /// If `sync` is `true`, every successful insertion ends with `sync_all`.
    pub fn new<P: AsRef<Path>>(path: P, sync: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sync,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the backing file, returning `true` if one existed.
    pub fn reset(&self) -> Result<bool, SpliceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Inserts `payload` at `offset`, shifting the bytes in
    /// `offset..current_len` right by `payload.len()`.
    ///
    /// `current_len` is the length the caller expects the backing file to
    /// have. On success the file holds the old `0..offset`, then `payload`,
    /// then the old `offset..current_len`.
    ///
    /// # Errors
    ///
    /// - [`SpliceError::OffsetOutOfRange`] if `offset > current_len`.
    /// - [`SpliceError::LengthMismatch`] if the file on disk is not
    ///   `current_len` bytes long.
    /// - [`SpliceError::Io`] on any I/O failure, including spool creation.
    ///
    /// The first two are detected before any write. An I/O failure while
    /// writing triggers a rollback to the original content.
    pub fn insert_payload(
        &self,
        offset: u64,
        payload: &[u8],
        current_len: u64,
    ) -> Result<(), SpliceError> {
        if offset > current_len {
            return Err(SpliceError::OffsetOutOfRange {
                offset,
                len: current_len,
            });
        }

        let mut file = match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return self.create_with(payload, current_len);
            }
            Err(e) => return Err(e.into()),
        };

        let actual = file.metadata()?.len();
        if actual != current_len {
            return Err(SpliceError::LengthMismatch {
                expected: current_len,
                actual,
            });
        }

        let tail_len = current_len - offset;
        let mut spool = tempfile::tempfile()?;
        splice_or_restore(&mut file, &mut spool, offset, payload, current_len, self.sync)
            .map_err(|err| {
                warn!(
                    path = %self.path.display(),
                    offset,
                    tail_len,
                    error = %err,
                    "splice.write_failed"
                );
                err
            })?;

        debug!(
            path = %self.path.display(),
            offset,
            payload_len = payload.len(),
            tail_len,
            "splice.insert"
        );
        Ok(())
    }

    /// Initialization path: the backing file does not exist yet.
    fn create_with(&self, payload: &[u8], current_len: u64) -> Result<(), SpliceError> {
        if current_len != 0 {
            return Err(SpliceError::LengthMismatch {
                expected: current_len,
                actual: 0,
            });
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)?;
        let written = fill_new(&mut file, payload, self.sync);
        drop(file);
        if let Err(err) = written {
            self.discard_new_file(&err);
            return Err(err.into());
        }

        debug!(
            path = %self.path.display(),
            payload_len = payload.len(),
            "splice.create"
        );
        Ok(())
    }

    /// Removes a file this store just created but failed to fill, so the
    /// path is back to absent.
    fn discard_new_file(&self, cause: &io::Error) {
        warn!(path = %self.path.display(), error = %cause, "splice.create_failed");
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "splice.discard_failed");
        }
    }
}

/// File operations a splice needs beyond `Read + Write + Seek`.
trait Backing: Read + Write + Seek {
    fn sync(&mut self) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl Backing for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Spools the tail of `file`, splices `payload` in at `offset`, and on any
/// failure after the spool is complete puts the original bytes back.
///
/// Flush and the optional sync belong to the guarded phase: an `Ok` means the
/// new layout is fully written, an `Err` means the file is back at
/// `current_len` bytes of original content (unless the rollback itself
/// failed, which is logged).
fn splice_or_restore<B, S>(
    file: &mut B,
    spool: &mut S,
    offset: u64,
    payload: &[u8],
    current_len: u64,
    sync: bool,
) -> io::Result<()>
where
    B: Backing,
    S: Read + Write + Seek,
{
    let tail_len = current_len - offset;
    copy_range(file, spool, offset, 0, tail_len)?;

    let err = match splice_in(file, spool, offset, payload, tail_len, sync) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    if let Err(rollback) = restore(file, spool, offset, tail_len, current_len) {
        warn!(error = %rollback, "splice.rollback_failed");
    }
    Err(err)
}

/// Writes `payload` at `offset` and the spooled tail right after it.
fn splice_in<B, S>(
    file: &mut B,
    spool: &mut S,
    offset: u64,
    payload: &[u8],
    tail_len: u64,
    sync: bool,
) -> io::Result<()>
where
    B: Backing,
    S: Read + Seek,
{
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(payload)?;
    copy_range(spool, file, 0, offset + payload.len() as u64, tail_len)?;
    file.flush()?;
    if sync {
        file.sync()?;
    }
    Ok(())
}

/// Puts the spooled tail back at `offset` and trims anything written past
/// the original length.
fn restore<B, S>(
    file: &mut B,
    spool: &mut S,
    offset: u64,
    tail_len: u64,
    original_len: u64,
) -> io::Result<()>
where
    B: Backing,
    S: Read + Seek,
{
    copy_range(spool, file, 0, offset, tail_len)?;
    file.truncate(original_len)?;
    file.flush()
}

/// Writes the first payload into a freshly created file.
fn fill_new<B: Backing>(file: &mut B, payload: &[u8], sync: bool) -> io::Result<()> {
    file.write_all(payload)?;
    file.flush()?;
    if sync {
        file.sync()?;
    }
    Ok(())
}
