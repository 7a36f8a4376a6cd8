//! Chunked copy between two seekable streams.

use std::io::{Read, Result as IoResult, Seek, SeekFrom, Write};

/// Size of the buffer used for every copy pass.
pub const CHUNK_SIZE: usize = 4096;

/// Copies exactly `len` bytes from `src` at `src_offset` to `dst` at
/// `dst_offset`.
///
/// Full chunks are moved first, then the remainder; nothing past
/// `src_offset + len` is read. A source shorter than requested fails with
/// [`std::io::ErrorKind::UnexpectedEof`].
pub fn copy_range<R, W>(
    src: &mut R,
    dst: &mut W,
    src_offset: u64,
    dst_offset: u64,
    len: u64,
) -> IoResult<()>
where
    R: Read + Seek,
    W: Write + Seek,
{
    src.seek(SeekFrom::Start(src_offset))?;
    dst.seek(SeekFrom::Start(dst_offset))?;

    let mut buf = [0u8; CHUNK_SIZE];
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(CHUNK_SIZE as u64) as usize;
        src.read_exact(&mut buf[..n])?;
        dst.write_all(&buf[..n])?;
        remaining -= n as u64;
    }
    Ok(())
}
