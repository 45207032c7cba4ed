//! Merging per-writer bucket files into one shared archive.
//!
//! Blobs move in `RAW` form: stored bytes plus metadata copy verbatim, with
//! no re-compression and no recomputed checksum. First occurrence across
//! sources (in list order) wins. Any source error aborts the merge; the
//! partial destination file is left on disk for inspection.

use std::path::{Path, PathBuf};

use amber_capture::ResourceKind;

use crate::concurrent::shared_archive_path;
use crate::error::ArchiveError;
use crate::format::PayloadFlags;
use crate::stream::{ArchiveMode, StreamArchive};

/// What a merge did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// Entries copied into the destination.
    pub copied: usize,
    /// Entries skipped because an earlier source already provided them.
    pub skipped_duplicates: usize,
}

/// Merge `sources` (in list order) into `<dest_base>.adb`.
///
/// The destination opens in overwrite mode: a merge always produces the
/// reconciled state from scratch.
///
/// # Errors
///
/// Source open/read failures and destination open/write failures; the
/// partial destination stays on disk.
pub fn merge_archives(dest_base: &Path, sources: &[PathBuf]) -> Result<MergeStats, ArchiveError> {
    let dest_path = shared_archive_path(dest_base);
    let mut dest = StreamArchive::open(&dest_path, ArchiveMode::OverWrite)?;
    let mut stats = MergeStats::default();

    for source_path in sources {
        let mut source = StreamArchive::open(source_path, ArchiveMode::ReadOnly)?;
        for kind in ResourceKind::ALL {
            for hash in source.hash_list(kind) {
                if dest.has_entry(kind, hash) {
                    stats.skipped_duplicates += 1;
                    continue;
                }
                let raw = source.read_entry(kind, hash, PayloadFlags::RAW)?;
                dest.write_entry(kind, hash, &raw, PayloadFlags::RAW)?;
                stats.copied += 1;
            }
        }
    }

    log::debug!(
        "merged {} sources into {}: {} copied, {} duplicates",
        sources.len(),
        dest_path.display(),
        stats.copied,
        stats.skipped_duplicates
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use amber_capture::Hash64;
    use tempfile::TempDir;

    fn write_source(path: &Path, entries: &[(u64, &[u8])]) {
        let mut archive = StreamArchive::open(path, ArchiveMode::OverWrite).unwrap();
        for &(hash, payload) in entries {
            archive
                .write_entry(
                    ResourceKind::Sampler,
                    Hash64::new(hash),
                    payload,
                    PayloadFlags::COMPRESS | PayloadFlags::CHECKSUM,
                )
                .unwrap();
        }
    }

    #[test]
    fn first_occurrence_wins_across_sources() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.adb");
        let b = dir.path().join("b.adb");
        write_source(&a, &[(1, b"from-a"), (2, b"shared-a")]);
        write_source(&b, &[(2, b"shared-b"), (3, b"from-b")]);

        let dest_base = dir.path().join("merged");
        let stats = merge_archives(&dest_base, &[a, b]).unwrap();
        assert_eq!(stats.copied, 3);
        assert_eq!(stats.skipped_duplicates, 1);

        let mut merged =
            StreamArchive::open(&shared_archive_path(&dest_base), ArchiveMode::ReadOnly).unwrap();
        assert_eq!(
            merged.hash_list(ResourceKind::Sampler),
            vec![Hash64::new(1), Hash64::new(2), Hash64::new(3)]
        );
        // Raw copy preserved the stored form; plain reads still decompress
        // and verify, and source order decided the survivor.
        assert_eq!(
            merged
                .read_entry(ResourceKind::Sampler, Hash64::new(2), PayloadFlags::empty())
                .unwrap(),
            b"shared-a".to_vec()
        );
    }

    #[test]
    fn missing_source_aborts_and_leaves_partial_destination() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.adb");
        write_source(&a, &[(1, b"from-a")]);
        let ghost = dir.path().join("ghost.adb");

        let dest_base = dir.path().join("merged");
        assert!(matches!(
            merge_archives(&dest_base, &[a, ghost]),
            Err(ArchiveError::NotFound { .. })
        ));
        // The partial destination holds what was merged before the failure.
        let mut partial =
            StreamArchive::open(&shared_archive_path(&dest_base), ArchiveMode::ReadOnly).unwrap();
        assert!(partial.has_entry(ResourceKind::Sampler, Hash64::new(1)));
        let _ = partial.read_entry(ResourceKind::Sampler, Hash64::new(1), PayloadFlags::empty());
    }
}
