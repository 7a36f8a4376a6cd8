use cli::demo::scenario_packets;
use cli::PacketWriter;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use packet::encode_packet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tempfile::tempdir;

const N: u16 = 1_000;
const VAL_SIZE: usize = 100;

fn shuffled_packets(seed: u64) -> Vec<Vec<u8>> {
    let mut packets: Vec<Vec<u8>> = (0..N)
        .map(|id| encode_packet(id, &vec![b'x'; VAL_SIZE]))
        .collect();
    packets.shuffle(&mut StdRng::seed_from_u64(seed));
    packets
}

fn writer_sorted_arrival(c: &mut Criterion) {
    c.bench_function("writer_sorted_arrival_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let writer = PacketWriter::create(dir.path().join("out.dat"), false).unwrap();
                let packets: Vec<_> = (0..N)
                    .map(|id| encode_packet(id, &vec![b'x'; VAL_SIZE]))
                    .collect();
                (dir, writer, packets)
            },
            |(_dir, mut writer, packets)| {
                for p in &packets {
                    writer.write(p).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn writer_shuffled_arrival(c: &mut Criterion) {
    c.bench_function("writer_shuffled_arrival_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let writer = PacketWriter::create(dir.path().join("out.dat"), false).unwrap();
                (dir, writer, shuffled_packets(42))
            },
            |(_dir, mut writer, packets)| {
                for p in &packets {
                    writer.write(p).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn writer_demo_scenario(c: &mut Criterion) {
    c.bench_function("writer_demo_scenario_reversed", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let writer = PacketWriter::create(dir.path().join("out.dat"), false).unwrap();
                let mut packets = scenario_packets();
                packets.reverse();
                (dir, writer, packets)
            },
            |(_dir, mut writer, packets)| {
                for p in &packets {
                    writer.write(p).unwrap();
                }
                criterion::black_box(writer.contents().unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    writer_sorted_arrival,
    writer_shuffled_arrival,
    writer_demo_scenario,
);
criterion_main!(benches);
