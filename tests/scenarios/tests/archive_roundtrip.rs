//! Archive acceptance scenarios: mode round-trips, raw blob copy, and the
//! capture → archive → replay flow.

use amber_archive::{ArchiveError, ArchiveMode, PayloadFlags, StreamArchive};
use amber_capture::id::SamplerId;
use amber_capture::model::SamplerDesc;
use amber_capture::{replay, Hash64, Recorder, ResourceKind};
use scenario_tests::InterningSink;
use tempfile::TempDir;

#[test]
fn overwrite_append_readonly_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.adb");

    {
        let mut archive = StreamArchive::open(&path, ArchiveMode::OverWrite).unwrap();
        archive
            .write_entry(
                ResourceKind::Sampler,
                Hash64::new(1),
                &[1, 2, 3],
                PayloadFlags::COMPRESS | PayloadFlags::CHECKSUM,
            )
            .unwrap();
        archive
            .write_entry(
                ResourceKind::DescriptorSetLayout,
                Hash64::new(2),
                &[10, 20, 30, 40, 50],
                PayloadFlags::COMPRESS | PayloadFlags::CHECKSUM,
            )
            .unwrap();
    }

    {
        let mut archive = StreamArchive::open(&path, ArchiveMode::Append).unwrap();
        assert!(archive.has_entry(ResourceKind::Sampler, Hash64::new(1)));
        assert!(archive.has_entry(ResourceKind::DescriptorSetLayout, Hash64::new(2)));
        assert!(!archive.has_entry(ResourceKind::ShaderModule, Hash64::new(3)));
        archive
            .write_entry(
                ResourceKind::ShaderModule,
                Hash64::new(3),
                &[1, 2, 3, 1, 2, 3],
                PayloadFlags::CHECKSUM,
            )
            .unwrap();
    }

    // Two independent read-only iterations return exact payloads.
    for _ in 0..2 {
        let mut archive = StreamArchive::open(&path, ArchiveMode::ReadOnly).unwrap();
        assert_eq!(
            archive
                .read_entry(ResourceKind::Sampler, Hash64::new(1), PayloadFlags::empty())
                .unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(
            archive
                .read_entry(
                    ResourceKind::DescriptorSetLayout,
                    Hash64::new(2),
                    PayloadFlags::empty()
                )
                .unwrap(),
            vec![10, 20, 30, 40, 50]
        );
        assert_eq!(
            archive
                .read_entry(
                    ResourceKind::ShaderModule,
                    Hash64::new(3),
                    PayloadFlags::empty()
                )
                .unwrap(),
            vec![1, 2, 3, 1, 2, 3]
        );
    }
}

#[test]
fn raw_blob_copy_between_archives() {
    let dir = TempDir::new().unwrap();
    let source_path = dir.path().join("source.adb");
    let dest_path = dir.path().join("dest.adb");

    let entries: &[(ResourceKind, u64, &[u8], PayloadFlags)] = &[
        (
            ResourceKind::Sampler,
            10,
            b"plain",
            PayloadFlags::empty(),
        ),
        (
            ResourceKind::ShaderModule,
            11,
            b"compressed and checksummed payload of some length",
            PayloadFlags::COMPRESS | PayloadFlags::CHECKSUM,
        ),
        (
            ResourceKind::RenderPass,
            12,
            b"checksummed only",
            PayloadFlags::CHECKSUM,
        ),
    ];

    {
        let mut source = StreamArchive::open(&source_path, ArchiveMode::OverWrite).unwrap();
        for &(kind, hash, payload, flags) in entries {
            source
                .write_entry(kind, Hash64::new(hash), payload, flags)
                .unwrap();
        }
    }

    {
        let mut source = StreamArchive::open(&source_path, ArchiveMode::ReadOnly).unwrap();
        let mut dest = StreamArchive::open(&dest_path, ArchiveMode::OverWrite).unwrap();
        for kind in ResourceKind::ALL {
            for hash in source.hash_list(kind) {
                let raw = source.read_entry(kind, hash, PayloadFlags::RAW).unwrap();
                dest.write_entry(kind, hash, &raw, PayloadFlags::RAW).unwrap();
            }
        }
    }

    // Destination read back with normal flags yields the original plaintext.
    let mut dest = StreamArchive::open(&dest_path, ArchiveMode::ReadOnly).unwrap();
    for &(kind, hash, payload, _) in entries {
        assert_eq!(
            dest.read_entry(kind, Hash64::new(hash), PayloadFlags::empty())
                .unwrap(),
            payload.to_vec()
        );
    }
}

#[test]
fn raw_size_probe_matches_raw_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.adb");
    let mut archive = StreamArchive::open(&path, ArchiveMode::OverWrite).unwrap();
    archive
        .write_entry(
            ResourceKind::Sampler,
            Hash64::new(1),
            b"some payload worth compressing, some payload worth compressing",
            PayloadFlags::COMPRESS | PayloadFlags::CHECKSUM,
        )
        .unwrap();

    let size = archive
        .entry_size(ResourceKind::Sampler, Hash64::new(1), PayloadFlags::RAW)
        .unwrap();
    let raw = archive
        .read_entry(ResourceKind::Sampler, Hash64::new(1), PayloadFlags::RAW)
        .unwrap();
    assert_eq!(raw.len(), size);

    let mut buffer = vec![0u8; size];
    let written = archive
        .read_entry_into(
            ResourceKind::Sampler,
            Hash64::new(1),
            &mut buffer,
            PayloadFlags::RAW,
        )
        .unwrap();
    assert_eq!(written, size);
    assert_eq!(buffer, raw);
}

#[test]
fn missing_entry_reads_fail() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.adb");
    let mut archive = StreamArchive::open(&path, ArchiveMode::OverWrite).unwrap();
    assert!(matches!(
        archive.read_entry(ResourceKind::Sampler, Hash64::new(1), PayloadFlags::empty()),
        Err(ArchiveError::NotFound { .. })
    ));
    assert!(matches!(
        archive.entry_size(ResourceKind::Sampler, Hash64::new(1), PayloadFlags::empty()),
        Err(ArchiveError::NotFound { .. })
    ));
}

#[test]
fn captured_state_flows_through_an_archive() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipelines.adb");

    // Capture.
    let mut recorder = Recorder::new();
    recorder
        .record_sampler(
            SamplerId::new(1),
            &SamplerDesc {
                max_anisotropy: 8.0,
                anisotropy_enable: true,
                ..SamplerDesc::default()
            },
        )
        .unwrap();

    // Store every interned object as a single-entry payload.
    {
        let mut archive = StreamArchive::open(&path, ArchiveMode::OverWrite).unwrap();
        for kind in ResourceKind::ALL {
            for hash in recorder.hashes_for_kind(kind) {
                let payload = recorder.serialize_entry(kind, hash).unwrap();
                archive
                    .write_entry(
                        kind,
                        hash,
                        &payload,
                        PayloadFlags::COMPRESS | PayloadFlags::CHECKSUM,
                    )
                    .unwrap();
            }
        }
    }

    // Replay straight out of the archive.
    let mut archive = StreamArchive::open(&path, ArchiveMode::ReadOnly).unwrap();
    let mut sink = InterningSink::new();
    for kind in ResourceKind::ALL {
        for hash in archive.hash_list(kind) {
            let payload = archive.read_entry(kind, hash, PayloadFlags::empty()).unwrap();
            let report = replay(&payload, &mut sink).unwrap();
            assert!(report.skipped.is_empty());
        }
    }
    assert_eq!(
        sink.recorder.hashes_for_kind(ResourceKind::Sampler),
        recorder.hashes_for_kind(ResourceKind::Sampler)
    );
}
