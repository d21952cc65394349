use std::hint::black_box;
use std::io::{Cursor, Write};

use bitcnt_rs::bitcnt::{self, BitCounter, CounterConfig};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn generate_bytes(len: usize) -> Vec<u8> {
    let mut x = 0x9E37_79B9_7F4A_7C15u64;
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x as u8
        })
        .collect()
}

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitcnt_kernel");
    for size_kb in [4, 64, 1024] {
        let data = generate_bytes(size_kb * 1024);
        group.bench_with_input(
            BenchmarkId::new("naive", format!("{}KB", size_kb)),
            &data,
            |b, data| b.iter(|| bitcnt::count_bits_naive(black_box(data))),
        );
        group.bench_with_input(
            BenchmarkId::new("tiered", format!("{}KB", size_kb)),
            &data,
            |b, data| b.iter(|| bitcnt::count_bits(black_box(data))),
        );
        group.bench_with_input(
            BenchmarkId::new("tiered_misaligned", format!("{}KB", size_kb)),
            &data,
            |b, data| b.iter(|| bitcnt::count_bits(black_box(&data[3..]))),
        );
    }
    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitcnt_source");
    let data = generate_bytes(16 * 1024 * 1024);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let mapping = BitCounter::new(CounterConfig {
        chunk_size: 16 * 1024,
        allow_mmap: true,
    });
    let streaming = BitCounter::new(CounterConfig {
        chunk_size: 16 * 1024,
        allow_mmap: false,
    });

    group.bench_function("mmap_16MB", |b| {
        b.iter(|| mapping.count_path(black_box(file.path())).unwrap())
    });
    group.bench_function("stream_file_16MB", |b| {
        b.iter(|| streaming.count_path(black_box(file.path())).unwrap())
    });
    group.bench_function("stream_memory_16MB", |b| {
        b.iter(|| {
            streaming
                .stream_count(&mut Cursor::new(black_box(&data)), "mem")
                .unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_kernels, bench_strategies);
criterion_main!(benches);
