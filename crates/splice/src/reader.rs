use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::Range;

use crate::{SpliceError, SpliceStore};

impl SpliceStore {
    /// Current length of the backing file, or 0 if it does not exist yet.
    pub fn len(&self) -> Result<u64, SpliceError> {
        match fs::metadata(self.path()) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns `true` if the backing file is absent or empty.
    pub fn is_empty(&self) -> Result<bool, SpliceError> {
        Ok(self.len()? == 0)
    }

    /// Reads the whole backing file. An absent file reads as empty.
    pub fn read_all(&self) -> Result<Vec<u8>, SpliceError> {
        match fs::read(self.path()) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the bytes in `range`.
    ///
    /// Like the SSTable reader this opens the file per call and closes it on
    /// return.
    ///
    /// # Errors
    ///
    /// Returns [`SpliceError::OffsetOutOfRange`] if `range.end` is past the
    /// end of the file or the range is reversed.
    pub fn read_range(&self, range: Range<u64>) -> Result<Vec<u8>, SpliceError> {
        let len = self.len()?;
        if range.end > len || range.start > range.end {
            return Err(SpliceError::OffsetOutOfRange {
                offset: range.end.max(range.start),
                len,
            });
        }
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let mut f = File::open(self.path())?;
        f.seek(SeekFrom::Start(range.start))?;
        let mut buf = vec![0u8; (range.end - range.start) as usize];
        f.read_exact(&mut buf)?;
        Ok(buf)
    }
}
