use criterion::{black_box, criterion_group, criterion_main, Criterion};

use erebus::fingerprint::Fingerprint;
use erebus::ranges::expand_cidr;

fn bench_range_expansion(c: &mut Criterion) {
    c.bench_function("expand /24", |b| {
        b.iter(|| expand_cidr(black_box("10.0.0.0/24"), 65536).unwrap())
    });

    c.bench_function("expand /16", |b| {
        b.iter(|| expand_cidr(black_box("10.0.0.0/16"), 70000).unwrap())
    });
}

fn bench_fingerprint_extraction(c: &mut Criterion) {
    let body = format!(
        "<html><head><title>Benchmark Page</title></head><body>{}</body></html>",
        "x".repeat(64 * 1024)
    );
    let bytes = body.into_bytes();

    c.bench_function("fingerprint 64k body", |b| {
        b.iter(|| Fingerprint::from_bytes(black_box(&bytes)))
    });
}

criterion_group!(benches, bench_range_expansion, bench_fingerprint_extraction);
criterion_main!(benches);
