//! The shuffled-arrival demonstration: twenty packets `a`..`t` written in
//! random order must come out as one sorted concatenation.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use packet::encode_packet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::writer::PacketWriter;

/// `(id, payload)` pairs of the demonstration set, ascending by id.
pub const SCENARIO: &[(u16, &[u8])] = &[
    (0x61, b"aaa"),
    (0x62, b"bb"),
    (0x63, b"ccc"),
    (0x64, b"dddd"),
    (0x65, b"eeeeee"),
    (0x66, b"fffff"),
    (0x67, b"gggggggggg"),
    (0x68, b"h"),
    (0x69, b"iiiiiiiiiiiiiii"),
    (0x6A, b"jjjj"),
    (0x6B, b"kkkkkk"),
    (0x6C, b"lll"),
    (0x6D, b"mm"),
    (0x6E, b"nnnn"),
    (0x6F, b"oooooo"),
    (0x70, b"ppp"),
    (0x71, b"qqqqq"),
    (0x72, b"r"),
    (0x73, b"sssssssssssssssssssssss"),
    (0x74, b"ttt"),
];

/// Raw packets for [`SCENARIO`], in id order.
pub fn scenario_packets() -> Vec<Vec<u8>> {
    SCENARIO
        .iter()
        .map(|(id, payload)| encode_packet(*id, payload))
        .collect()
}

/// Returns the scenario packets in a random order. The same `seed` always
/// gives the same order; `None` draws from the OS.
pub fn shuffled_packets(seed: Option<u64>) -> Vec<Vec<u8>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut packets = scenario_packets();
    packets.shuffle(&mut rng);
    packets
}

/// Writes the shuffled scenario to `out`, echoing each packet to `echo` as it
/// arrives, and returns the final file contents.
pub fn run<W: Write>(
    out: &Path,
    seed: Option<u64>,
    sync: bool,
    echo: &mut W,
) -> Result<Vec<u8>> {
    let mut writer = PacketWriter::create(out, sync)?;

    for raw in shuffled_packets(seed) {
        writeln!(echo, "{}", String::from_utf8_lossy(&raw))?;
        writer.write(&raw)?;
    }

    info!(
        path = %out.display(),
        packets = SCENARIO.len(),
        intervals = writer.index().len(),
        bytes = writer.index().total_len(),
        "demo.done"
    );
    Ok(writer.contents()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use packet::Packet;
    use tempfile::tempdir;

    /// Ids of the packets in the order they were shuffled.
    fn arrival_ids(packets: &[Vec<u8>]) -> Vec<u16> {
        packets
            .iter()
            .filter_map(|raw| Packet::parse(raw).map(|p| p.id))
            .collect()
    }

    fn expected_contents() -> Vec<u8> {
        SCENARIO.iter().flat_map(|(_, p)| p.iter().copied()).collect()
    }

    #[test]
    fn scenario_ids_are_ascending_and_distinct() {
        let ids: Vec<u16> = SCENARIO.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, (0x61..=0x74).collect::<Vec<u16>>());
    }

    #[test]
    fn seeded_shuffle_is_reproducible_permutation() {
        let a = arrival_ids(&shuffled_packets(Some(7)));
        let b = arrival_ids(&shuffled_packets(Some(7)));
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0x61..=0x74).collect::<Vec<u16>>());
    }

    #[test]
    fn demo_produces_sorted_concatenation() -> Result<()> {
        let dir = tempdir()?;
        for seed in [0u64, 1, 2, 99, 12345] {
            let out = dir.path().join(format!("results-{seed}.dat"));
            let mut echo = Vec::new();
            let contents = run(&out, Some(seed), false, &mut echo)?;

            assert_eq!(contents, expected_contents());
            assert_eq!(String::from_utf8(echo)?.lines().count(), SCENARIO.len());
        }
        Ok(())
    }

    #[test]
    fn rerun_over_same_path_starts_fresh() -> Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("results.dat");
        run(&out, Some(3), false, &mut std::io::sink())?;
        let contents = run(&out, Some(4), false, &mut std::io::sink())?;
        assert_eq!(contents, expected_contents());
        Ok(())
    }
}
