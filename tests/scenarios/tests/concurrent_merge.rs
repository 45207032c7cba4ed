//! Concurrent-archive acceptance scenarios: bucket allocation, write
//! suppression, union reads, and merge reconciliation.

use amber_archive::concurrent::{bucket_path, shared_archive_path};
use amber_archive::{merge_archives, ConcurrentArchive, PayloadFlags};
use amber_capture::{Hash64, ResourceKind};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_sampler(writer: &mut ConcurrentArchive, hash: u64) {
    writer
        .write_entry(
            ResourceKind::Sampler,
            Hash64::new(hash),
            &hash.to_le_bytes(),
            PayloadFlags::COMPRESS | PayloadFlags::CHECKSUM,
        )
        .unwrap();
}

/// Three writers against the same base, as produced by three processes.
/// Returns the bucket paths.
fn seed_three_writers(base: &Path) -> Vec<PathBuf> {
    // Writer A.
    let mut a = ConcurrentArchive::open(base, None).unwrap();
    write_sampler(&mut a, 2);
    write_sampler(&mut a, 3);
    drop(a);

    // Writer B duplicates hash 3; dedup across live buckets is not
    // attempted, so its bucket carries both entries.
    let mut b = ConcurrentArchive::open(base, None).unwrap();
    write_sampler(&mut b, 3);
    write_sampler(&mut b, 4);
    drop(b);

    // Writer C writes the same entry twice.
    let mut c = ConcurrentArchive::open(base, None).unwrap();
    write_sampler(&mut c, 1);
    write_sampler(&mut c, 1);
    drop(c);

    (1..=3).map(|n| bucket_path(base, n)).collect()
}

#[test]
fn bucket_allocation_and_write_suppression() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("cache");

    let buckets = seed_three_writers(&base);
    for bucket in &buckets {
        assert!(bucket.exists(), "{} missing", bucket.display());
    }
    assert!(!bucket_path(&base, 4).exists());

    // Writer D sees the union through extra paths.
    let extra = buckets
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(";");
    let mut d = ConcurrentArchive::open(&base, Some(&extra)).unwrap();
    assert_eq!(
        d.hash_list(ResourceKind::Sampler),
        vec![
            Hash64::new(1),
            Hash64::new(2),
            Hash64::new(3),
            Hash64::new(4)
        ]
    );

    // A duplicate write is suppressed and allocates no bucket.
    write_sampler(&mut d, 4);
    assert!(!bucket_path(&base, 4).exists());
    assert_eq!(d.bucket_file(), None);

    // A novel entry of a different kind allocates the bucket.
    d.write_entry(
        ResourceKind::DescriptorSetLayout,
        Hash64::new(4),
        &[4, 4, 4],
        PayloadFlags::CHECKSUM,
    )
    .unwrap();
    assert!(bucket_path(&base, 4).exists());
}

#[test]
fn union_reads_return_payloads() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("cache");
    let buckets = seed_three_writers(&base);

    let extra = buckets
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(";");
    let mut reader = ConcurrentArchive::open(&base, Some(&extra)).unwrap();
    for hash in 1..=4u64 {
        assert!(reader.has_entry(ResourceKind::Sampler, Hash64::new(hash)));
        assert_eq!(
            reader
                .read_entry(ResourceKind::Sampler, Hash64::new(hash), PayloadFlags::empty())
                .unwrap(),
            hash.to_le_bytes().to_vec()
        );
        assert_eq!(
            reader
                .entry_size(ResourceKind::Sampler, Hash64::new(hash), PayloadFlags::empty())
                .unwrap(),
            8
        );
    }
}

#[test]
fn merge_reconciles_buckets_into_shared_archive() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("cache");
    let buckets = seed_three_writers(&base);

    let stats = merge_archives(&base, &buckets).unwrap();
    assert_eq!(stats.copied, 4);
    assert_eq!(stats.skipped_duplicates, 1);
    assert!(shared_archive_path(&base).exists());

    // With P.adb present, duplicate-only writers create no new buckets.
    let mut writer = ConcurrentArchive::open(&base, None).unwrap();
    assert_eq!(
        writer.hash_list(ResourceKind::Sampler),
        vec![
            Hash64::new(1),
            Hash64::new(2),
            Hash64::new(3),
            Hash64::new(4)
        ]
    );
    for hash in 1..=4 {
        write_sampler(&mut writer, hash);
    }
    assert_eq!(writer.bucket_file(), None);
    assert!(!bucket_path(&base, 4).exists());

    // The shared payloads decompress to the original bytes.
    for hash in 1..=4u64 {
        assert_eq!(
            writer
                .read_entry(ResourceKind::Sampler, Hash64::new(hash), PayloadFlags::empty())
                .unwrap(),
            hash.to_le_bytes().to_vec()
        );
    }
}
