use criterion::{criterion_group, criterion_main};


criterion_group!(
    benches,
    send_bench::bench_send_latency,
    send_bench::bench_send_and_drain,
    reorder_bench::bench_reorder_drain,
);
criterion_main!(benches);
