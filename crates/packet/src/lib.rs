//! Fixed-header packet layout.
//!
//! ```text
//! [0..2]   ignored
//! [2..4]   identifier (u16 BE)
//! [4..12]  ignored
//! [12..]   payload
//! ```
//!
//! A buffer of `HEADER_LEN` bytes or fewer carries no payload and is dropped.

use byteorder::{BigEndian, ByteOrder};

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 12;

/// Byte offset of the big-endian identifier inside the header.
pub const ID_OFFSET: usize = 2;

/// Filler used for the ignored header bytes by [`encode_packet`].
const FILLER: u8 = b'z';

/// A parsed packet borrowing its payload from the raw buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    pub id: u16,
    pub payload: &'a [u8],
}

impl<'a> Packet<'a> {
    /// Parses a raw packet. Returns `None` for header-only or truncated
    /// buffers (`len <= HEADER_LEN`).
    pub fn parse(raw: &'a [u8]) -> Option<Self> {
        if raw.len() <= HEADER_LEN {
            return None;
        }
        let id = BigEndian::read_u16(&raw[ID_OFFSET..ID_OFFSET + 2]);
        Some(Self {
            id,
            payload: &raw[HEADER_LEN..],
        })
    }
}

/// Builds a raw packet for `id` carrying `payload`. Ignored header bytes are
/// filled with `b'z'`.
pub fn encode_packet(id: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.resize(HEADER_LEN, FILLER);
    BigEndian::write_u16(&mut buf[ID_OFFSET..ID_OFFSET + 2], id);
    buf.extend_from_slice(payload);
    buf
}
