//! Criterion benchmarks for the ClipCast frame codec.
//!
//! Measures encode and decode latency across representative payload sizes so
//! per-frame overhead stays negligible next to network transfer time.
//!
//! Run with:
//! ```bash
//! cargo bench --package clipcast-core --bench codec_bench
//! ```

use clipcast_core::{decode_frame, encode_frame, FrameType};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Payload sizes covering a hotkey snippet up to a large captured document.
const PAYLOAD_SIZES: [usize; 5] = [16, 512, 4 * 1024, 64 * 1024, 1024 * 1024];

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");
    for size in PAYLOAD_SIZES {
        let payload = vec![0x61u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| {
                encode_frame(black_box(FrameType::CapturedText), black_box(payload))
                    .expect("encode must succeed")
            })
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    for size in PAYLOAD_SIZES {
        let bytes = encode_frame(FrameType::TextForPaste, &vec![0x61u8; size])
            .expect("encode must succeed");
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| decode_frame(black_box(bytes)).expect("decode must succeed"))
        });
    }
    group.finish();
}

/// Benchmarks a full encode+decode round-trip on a typical clipboard snippet.
fn bench_roundtrip_typical_text(c: &mut Criterion) {
    let payload = "The quick brown fox jumps over the lazy dog. ".repeat(8);

    c.bench_function("roundtrip_typical_text", |b| {
        b.iter(|| {
            let bytes = encode_frame(
                black_box(FrameType::TextForPaste),
                black_box(payload.as_bytes()),
            )
            .expect("encode must succeed");
            black_box(decode_frame(black_box(&bytes)).expect("decode must succeed"));
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_roundtrip_typical_text);
criterion_main!(benches);
