//! `ConcurrentArchive`: many writer processes, one logical archive.
//!
//! A logical archive at base path `P` is the union of:
//!
//! - explicit extra read-only shards (user-supplied shared archives)
//! - `P.adb`, the merged shared archive, when present
//! - this writer's own bucket `P.<N>.adb`
//!
//! Each writer owns its bucket exclusively; the integer `N` is allocated by
//! an exclusive-create probe (`N = 1, 2, ...`) the first time a
//! non-duplicate write happens. A writer that only ever writes duplicates
//! therefore leaves no file on disk. Cross-writer dedup is not attempted at
//! write time; the merger reconciles duplicates later.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use amber_capture::{Hash64, ResourceKind};

use crate::error::ArchiveError;
use crate::format::PayloadFlags;
use crate::stream::{ArchiveMode, StreamArchive};

/// Separator of the extra-paths string. Windows drive-letter colons stay
/// unambiguous because the separator is `;`, not `:`.
pub const EXTRA_PATH_SEPARATOR: char = ';';

fn suffixed_path(base: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = base.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// The shared archive path for a base path: `P.adb`.
#[must_use]
pub fn shared_archive_path(base: &Path) -> PathBuf {
    suffixed_path(base, ".adb")
}

/// The bucket path for a base path and writer integer: `P.<n>.adb`.
#[must_use]
pub fn bucket_path(base: &Path, n: u32) -> PathBuf {
    suffixed_path(base, &format!(".{n}.adb"))
}

/// Split an extra-paths string; empty components are ignored.
fn split_extra_paths(extra: &str) -> impl Iterator<Item = &str> {
    extra
        .split(EXTRA_PATH_SEPARATOR)
        .filter(|component| !component.is_empty())
}

/// A writer's view of a logical concurrent archive.
#[derive(Debug)]
pub struct ConcurrentArchive {
    base: PathBuf,
    /// Extra shards in list order, then `P.adb` when present.
    shards: Vec<StreamArchive>,
    bucket: Option<StreamArchive>,
}

impl ConcurrentArchive {
    /// Open the logical archive at `base` with optional extra read-only
    /// shard paths (`;`-separated).
    ///
    /// No bucket file is created here; allocation is deferred to the first
    /// non-duplicate write.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::NotFound`] if an explicit extra path is absent;
    /// shard open errors otherwise. `P.adb` being absent is not an error.
    pub fn open(base: &Path, extra_paths: Option<&str>) -> Result<Self, ArchiveError> {
        let mut shards = Vec::new();
        if let Some(extra) = extra_paths {
            for component in split_extra_paths(extra) {
                shards.push(StreamArchive::open(
                    Path::new(component),
                    ArchiveMode::ReadOnly,
                )?);
            }
        }

        let shared = shared_archive_path(base);
        match StreamArchive::open(&shared, ArchiveMode::ReadOnly) {
            Ok(archive) => shards.push(archive),
            Err(ArchiveError::NotFound { .. }) => {}
            Err(error) => return Err(error),
        }

        Ok(Self {
            base: base.to_path_buf(),
            shards,
            bucket: None,
        })
    }

    /// The base path this logical archive was opened from.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The bucket path allocated by this writer, if any write created one.
    #[must_use]
    pub fn bucket_file(&self) -> Option<&Path> {
        self.bucket.as_ref().map(StreamArchive::path)
    }

    fn ensure_bucket(&mut self) -> Result<&mut StreamArchive, ArchiveError> {
        let bucket = match self.bucket.take() {
            Some(bucket) => bucket,
            None => {
                let mut n = 1u32;
                loop {
                    let candidate = bucket_path(&self.base, n);
                    match StreamArchive::create_exclusive(&candidate)? {
                        Some(archive) => {
                            log::debug!("allocated bucket {}", archive.path().display());
                            break archive;
                        }
                        None => n += 1,
                    }
                }
            }
        };
        Ok(self.bucket.insert(bucket))
    }

    /// Whether `(kind, hash)` exists in any shard or this writer's bucket.
    #[must_use]
    pub fn has_entry(&self, kind: ResourceKind, hash: Hash64) -> bool {
        self.shards
            .iter()
            .chain(self.bucket.as_ref())
            .any(|archive| archive.has_entry(kind, hash))
    }

    /// Write one entry into this writer's bucket unless some shard (or the
    /// bucket itself) already holds it.
    ///
    /// The first suppressed-nowhere write allocates the bucket file.
    ///
    /// # Errors
    ///
    /// Bucket allocation and [`StreamArchive::write_entry`] failures.
    pub fn write_entry(
        &mut self,
        kind: ResourceKind,
        hash: Hash64,
        payload: &[u8],
        flags: PayloadFlags,
    ) -> Result<(), ArchiveError> {
        if self.has_entry(kind, hash) {
            return Ok(());
        }
        self.ensure_bucket()?.write_entry(kind, hash, payload, flags)
    }

    fn locate(&mut self, kind: ResourceKind, hash: Hash64) -> Option<&mut StreamArchive> {
        self.shards
            .iter_mut()
            .chain(self.bucket.as_mut())
            .find(|archive| archive.has_entry(kind, hash))
    }

    /// Read one entry from the first shard that holds it (extra shards in
    /// list order, then `P.adb`, then the bucket).
    ///
    /// # Errors
    ///
    /// [`ArchiveError::NotFound`] when no shard holds the entry, plus
    /// everything [`StreamArchive::read_entry`] returns.
    pub fn read_entry(
        &mut self,
        kind: ResourceKind,
        hash: Hash64,
        flags: PayloadFlags,
    ) -> Result<Vec<u8>, ArchiveError> {
        match self.locate(kind, hash) {
            Some(archive) => archive.read_entry(kind, hash, flags),
            None => Err(ArchiveError::NotFound {
                detail: format!("{kind} {hash}"),
            }),
        }
    }

    /// Size probe over the union, mirroring [`StreamArchive::entry_size`].
    ///
    /// # Errors
    ///
    /// [`ArchiveError::NotFound`] when no shard holds the entry.
    pub fn entry_size(
        &self,
        kind: ResourceKind,
        hash: Hash64,
        flags: PayloadFlags,
    ) -> Result<usize, ArchiveError> {
        self.shards
            .iter()
            .chain(self.bucket.as_ref())
            .find(|archive| archive.has_entry(kind, hash))
            .ok_or_else(|| ArchiveError::NotFound {
                detail: format!("{kind} {hash}"),
            })?
            .entry_size(kind, hash, flags)
    }

    /// All hashes for a kind across the union, duplicates collapsed,
    /// ascending.
    #[must_use]
    pub fn hash_list(&self, kind: ResourceKind) -> Vec<Hash64> {
        let mut set = BTreeSet::new();
        for archive in self.shards.iter().chain(self.bucket.as_ref()) {
            set.extend(archive.hash_list(kind));
        }
        set.into_iter().collect()
    }
}
