// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(missing_docs, reason = "Benchmark harness")]
#![allow(unused_results, reason = "Criterion builder returns are intentionally unused")]
#![allow(clippy::cast_possible_truncation, reason = "Intentional modular byte pattern")]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use prisma_fs::{FileSystem, PrismaFileSystem};

fn make_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

fn bench_copy(c: &mut Criterion) {
    let sizes: &[(usize, &str)] = &[(64 * 1024, "64KB"), (1024 * 1024, "1MB"), (16 * 1024 * 1024, "16MB")];

    let mut group = c.benchmark_group("copy_file");

    for &(size, label) in sizes {
        group.throughput(Throughput::Bytes(size as u64));

        for (strategy, zero_copy) in [("zero_copy", true), ("buffered", false)] {
            group.bench_with_input(BenchmarkId::new(strategy, label), &size, |b, &size| {
                let tmp = tempfile::tempdir().expect("tempdir");
                std::fs::write(tmp.path().join("src.bin"), make_data(size)).expect("write");
                let src = format!("{}/src.bin", tmp.path().display());
                let dst = format!("{}/dst.bin", tmp.path().display());
                let fs = PrismaFileSystem::builder().with_zero_copy(zero_copy).build();
                b.iter(|| fs.copy_file(&src, &dst).expect("copy"));
            });
        }
    }

    group.finish();
}

fn bench_random_read(c: &mut Criterion) {
    let size = 4 * 1024 * 1024;
    let mut group = c.benchmark_group("random_access_read");

    for &(len, label) in &[(4096_usize, "4KB"), (256 * 1024, "256KB")] {
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("positional", label), &len, |b, &len| {
            let tmp = tempfile::tempdir().expect("tempdir");
            std::fs::write(tmp.path().join("data.bin"), make_data(size)).expect("write");
            let fs = PrismaFileSystem::new();
            let file = fs
                .new_random_access_file(&format!("{}/data.bin", tmp.path().display()))
                .expect("open");
            let mut buf = vec![0; len];
            let mut offset = 0_u64;
            b.iter(|| {
                file.read(offset, &mut buf).expect("read");
                offset = (offset + len as u64) % (size - len) as u64;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_copy, bench_random_read);
criterion_main!(benches);
