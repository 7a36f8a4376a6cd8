//! # Splice — in-place insertion into a flat file
//!
//! Inserts a payload at an arbitrary byte offset of the backing file while
//! preserving every byte that was already stored after that offset.
//!
//! ## Splice steps
//!
//! ```text
//!  before:  [ head: 0..offset ][ tail: offset..len ]
//!
//!  1. spool   tail ──────────────────────► anonymous temp file
//!  2. write   [ head ][ payload ]
//!  3. restore [ head ][ payload ][ tail ] ◄── spool
//! ```
//!
//! The spool is created per call with [`tempfile::tempfile`], so it has no
//! name on disk and is removed when its handle drops. Copies run in
//! [`CHUNK_SIZE`] pieces, so memory use does not depend on the tail length.
//!
//! Nothing touches the backing file until the tail is safely spooled. If the
//! write phase fails, the spooled tail is copied back and the file truncated
//! to its previous length before the error is returned.
//!
//! A missing backing file is the initialization case: it is created and the
//! payload written at offset 0.

mod copy;
mod reader;
mod store;

use std::io;

use thiserror::Error;

pub use copy::{copy_range, CHUNK_SIZE};
pub use store::SpliceStore;

#[derive(Debug, Error)]
pub enum SpliceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("offset {offset} is past the end of the file ({len} bytes)")]
    OffsetOutOfRange { offset: u64, len: u64 },
    #[error("backing file is {actual} bytes, expected {expected}")]
    LengthMismatch { expected: u64, actual: u64 },
}
