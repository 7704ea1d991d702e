use criterion::{criterion_group, criterion_main};


criterion_group!(
    benches,
    mqtt::bench_remaining_length,
    mqtt::bench_build_connect,
    mqtt::bench_build_publish,
    mqtt::bench_decode_stream,
    mqtt::bench_client_publish
);
criterion_main!(benches);
