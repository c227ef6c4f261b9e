//! Performance benchmarks for AgentCodec.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pinlink_core::PinId;
use pinlink_protocol::{AgentCodec, Command, Reply};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

fn pin(n: u16) -> PinId {
    PinId::new(n).unwrap()
}

/// Benchmark encoding a pin command.
fn bench_encode_set_voltage(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(1));

    let command = Command::SetVoltage(pin(16), true);

    group.bench_function("encode_set_voltage", |b| {
        b.iter(|| {
            let mut codec = AgentCodec::new();
            let mut buffer = BytesMut::new();
            codec.encode(black_box(command), &mut buffer).unwrap();
            black_box(buffer);
        });
    });

    group.finish();
}

/// Benchmark decoding a boolean reply and interpreting it.
fn bench_decode_bool(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(1));

    let command = Command::ReadVoltage(pin(3));

    group.bench_function("decode_bool_reply", |b| {
        b.iter(|| {
            let mut codec = AgentCodec::new();
            let mut buffer = BytesMut::from(&b"True;\n"[..]);
            let reply = codec.decode(&mut buffer).unwrap().unwrap();
            black_box(reply.as_bool(&command).unwrap());
        });
    });

    group.finish();
}

/// Benchmark parsing pin lists of growing length.
fn bench_pin_list_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("pin_list");

    for count in [10u16, 40, 200] {
        let text = (1..=count)
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",");

        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &text, |b, text| {
            b.iter(|| {
                let reply = Reply::new(black_box(text));
                black_box(reply.as_pin_set(&Command::ReadPinsList).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_set_voltage,
    bench_decode_bool,
    bench_pin_list_sizes
);
criterion_main!(benches);
