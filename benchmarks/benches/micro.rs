use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use amber_archive::{ArchiveMode, PayloadFlags, StreamArchive};
use amber_benchmarks::{bench_sampler, bench_shader_code, populated_recorder};
use amber_capture::hash::{sampler_hash, shader_module_hash};
use amber_capture::model::ShaderModuleDesc;
use amber_capture::{Hash64, ResourceKind};

// ---------------------------------------------------------------------------
// Content hashing
// ---------------------------------------------------------------------------

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_hash");

    let sampler = bench_sampler(8.0);
    group.bench_function("sampler", |b| {
        b.iter(|| sampler_hash(black_box(&sampler)).unwrap());
    });

    for &size in &[1usize << 10, 1 << 14, 1 << 18] {
        let module = ShaderModuleDesc {
            flags: 0,
            code: bench_shader_code(size),
        };
        group.bench_with_input(BenchmarkId::new("shader_module", size), &module, |b, m| {
            b.iter(|| shader_module_hash(black_box(m)).unwrap());
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// State document serialization
// ---------------------------------------------------------------------------

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize_state");
    for &count in &[16u32, 128, 512] {
        let recorder = populated_recorder(count, 4, 1 << 12);
        group.bench_with_input(BenchmarkId::from_parameter(count), &recorder, |b, r| {
            b.iter(|| r.serialize().unwrap());
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Archive write/read
// ---------------------------------------------------------------------------

fn bench_archive(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive");
    let payload = bench_shader_code(1 << 14);

    group.bench_function("write_compressed", |b| {
        b.iter_batched(
            || tempfile::TempDir::new().unwrap(),
            |dir| {
                let mut archive =
                    StreamArchive::open(&dir.path().join("bench.adb"), ArchiveMode::OverWrite)
                        .unwrap();
                archive
                    .write_entry(
                        ResourceKind::ShaderModule,
                        Hash64::new(1),
                        black_box(&payload),
                        PayloadFlags::COMPRESS | PayloadFlags::CHECKSUM,
                    )
                    .unwrap();
            },
            BatchSize::SmallInput,
        );
    });

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("read.adb");
    {
        let mut archive = StreamArchive::open(&path, ArchiveMode::OverWrite).unwrap();
        archive
            .write_entry(
                ResourceKind::ShaderModule,
                Hash64::new(1),
                &payload,
                PayloadFlags::COMPRESS | PayloadFlags::CHECKSUM,
            )
            .unwrap();
    }
    let mut archive = StreamArchive::open(&path, ArchiveMode::ReadOnly).unwrap();
    group.bench_function("read_compressed", |b| {
        b.iter(|| {
            archive
                .read_entry(
                    ResourceKind::ShaderModule,
                    Hash64::new(1),
                    PayloadFlags::empty(),
                )
                .unwrap()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_hashing, bench_serialize, bench_archive);
criterion_main!(benches);
