use criterion::{
    BenchmarkId,
    criterion_group,
    criterion_main,
    Criterion,
    Throughput,
};

use bevy_splat_ingest::{
    LoadDispatcher,
    LoadRequest,
    decode_splat,
    encode_splat,
    io::{
        progress::NoProgress,
        splat::SPLAT_RECORD_STRIDE,
    },
    random_splats,
};


const SPLAT_COUNTS: [usize; 4] = [
    1000,
    10000,
    84_348,
    1_244_819,
];

fn splat_decode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode splat records");
    for count in SPLAT_COUNTS.iter() {
        group.throughput(Throughput::Bytes((*count * SPLAT_RECORD_STRIDE) as u64));
        group.bench_with_input(
            BenchmarkId::new("decode", count),
            &count,
            |b, &count| {
                let bytes = encode_splat(&random_splats(*count)).unwrap();

                b.iter(|| decode_splat(bytes.as_slice()));
            },
        );
    }
}

fn splat_load_benchmark(c: &mut Criterion) {
    let dispatcher = LoadDispatcher::default();

    let mut group = c.benchmark_group("load splat records");
    for count in SPLAT_COUNTS.iter() {
        group.throughput(Throughput::Bytes((*count * SPLAT_RECORD_STRIDE) as u64));
        group.bench_with_input(
            BenchmarkId::new("load_reordered", count),
            &count,
            |b, &count| {
                let bytes = encode_splat(&random_splats(*count)).unwrap();

                b.iter(|| {
                    let request = LoadRequest::local("bench.splat", bytes.clone());
                    dispatcher.load_contents(request, &NoProgress)
                });
            },
        );
    }
}

criterion_group!{
    name = io_benches;
    config = Criterion::default().sample_size(10);
    targets = splat_decode_benchmark, splat_load_benchmark
}
criterion_main!(io_benches);
