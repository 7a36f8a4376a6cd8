//! Packet ordering front end: the [`writer::PacketWriter`] orchestrator and the
//! shuffled-arrival demonstration used by the `packetsort` binary.

pub mod demo;
pub mod writer;

pub use writer::{PacketWriter, WriteError, WriteOutcome};
