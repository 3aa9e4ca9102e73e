//! Criterion benchmarks for the Mediabox line codec.
//!
//! Run with:
//! ```bash
//! cargo bench --package mediabox-core --bench line_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mediabox_core::{decode_command, encode_command, CommandRequest, LineDecoder};

fn bench_encode(c: &mut Criterion) {
    let longest = "X".repeat(1024);
    let mut group = c.benchmark_group("encode_command");
    for text in ["PLAY", "SEEK 01:23:45", longest.as_str()] {
        let cmd = CommandRequest::new(text).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(text.len()), &cmd, |b, cmd| {
            b.iter(|| encode_command(black_box(cmd)))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let wire = encode_command(&CommandRequest::new("SEEK 01:23:45").unwrap());
    c.bench_function("decode_command", |b| {
        b.iter(|| decode_command(black_box(&wire)).unwrap())
    });
}

fn bench_stream(c: &mut Criterion) {
    let mut wire = Vec::new();
    for _ in 0..100 {
        wire.extend(encode_command(&CommandRequest::new("VOLUME+").unwrap()));
    }
    c.bench_function("line_decoder_100_lines", |b| {
        b.iter(|| {
            let mut decoder = LineDecoder::new();
            decoder.push(black_box(&wire))
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_stream);
criterion_main!(benches);
