//! `StreamArchive`: a single-file append-only blob store.
//!
//! Opening scans the file from its header and builds an in-memory index
//! `(kind, hash) → location`. The scan is fail-closed per record but
//! forgiving at the tail: a malformed trailing record (typically a crashed
//! writer) stops the scan with a warning and everything before it stays
//! readable. Append mode additionally truncates the file back to the last
//! complete record so new writes never land after garbage.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use amber_capture::{Hash64, ResourceKind};

use crate::error::ArchiveError;
use crate::format::{
    decode_raw, encode_raw, PayloadFlags, PayloadMeta, RecordHeader, ARCHIVE_MAGIC,
    ARCHIVE_VERSION, FILE_HEADER_SIZE, RAW_PREFIX_SIZE, RECORD_HEADER_SIZE,
};

/// How an archive file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveMode {
    /// Truncate any existing file at open.
    OverWrite,
    /// Open an existing file or create a fresh one; writes append.
    Append,
    /// Open an existing file; writes fail.
    ReadOnly,
}

#[derive(Debug, Clone, Copy)]
struct EntryLocation {
    payload_offset: u64,
    meta: PayloadMeta,
}

/// A single-file stream archive.
///
/// Not internally synchronized; concurrency is achieved by giving each
/// participant its own instance (and, across processes, its own file).
#[derive(Debug)]
pub struct StreamArchive {
    file: File,
    path: PathBuf,
    mode: ArchiveMode,
    index: BTreeMap<(u32, u64), EntryLocation>,
    append_offset: u64,
}

impl StreamArchive {
    /// Open an archive file in the given mode.
    ///
    /// On failure no file state is modified, except that `OverWrite`
    /// truncates at open by definition.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::NotFound`] for `ReadOnly` on an absent file;
    /// [`ArchiveError::UnsupportedVersion`] / [`ArchiveError::Truncated`]
    /// for an unreadable header; [`ArchiveError::Io`] otherwise.
    pub fn open(path: &Path, mode: ArchiveMode) -> Result<Self, ArchiveError> {
        match mode {
            ArchiveMode::OverWrite => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|e| ArchiveError::io("create archive", &e))?;
                Self::with_fresh_header(file, path, mode)
            }
            ArchiveMode::Append => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .open(path)
                    .map_err(|e| ArchiveError::io("open archive for append", &e))?;
                let len = file
                    .metadata()
                    .map_err(|e| ArchiveError::io("stat archive", &e))?
                    .len();
                if len == 0 {
                    Self::with_fresh_header(file, path, mode)
                } else {
                    let mut archive = Self::with_scanned_index(file, path, mode)?;
                    // Drop any torn tail so appends continue from the last
                    // complete record.
                    archive
                        .file
                        .set_len(archive.append_offset)
                        .map_err(|e| ArchiveError::io("truncate torn tail", &e))?;
                    Ok(archive)
                }
            }
            ArchiveMode::ReadOnly => {
                let file = File::open(path).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        ArchiveError::NotFound {
                            detail: format!("archive {}", path.display()),
                        }
                    } else {
                        ArchiveError::io("open archive read-only", &e)
                    }
                })?;
                Self::with_scanned_index(file, path, mode)
            }
        }
    }

    /// Create a new archive file, or return `Ok(None)` if the path already
    /// exists.
    ///
    /// This is the bucket-allocation primitive of the concurrent archive:
    /// exclusive create makes the filename probe race-free across
    /// processes.
    ///
    /// # Errors
    ///
    /// I/O failures other than `AlreadyExists`.
    pub(crate) fn create_exclusive(path: &Path) -> Result<Option<Self>, ArchiveError> {
        match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => Self::with_fresh_header(file, path, ArchiveMode::Append).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(ArchiveError::io("create bucket", &e)),
        }
    }

    fn with_fresh_header(
        mut file: File,
        path: &Path,
        mode: ArchiveMode,
    ) -> Result<Self, ArchiveError> {
        let mut header = [0u8; FILE_HEADER_SIZE];
        header[0..4].copy_from_slice(&ARCHIVE_MAGIC);
        header[4..6].copy_from_slice(&ARCHIVE_VERSION.to_le_bytes());
        file.write_all(&header)
            .map_err(|e| ArchiveError::io("write archive header", &e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            mode,
            index: BTreeMap::new(),
            append_offset: FILE_HEADER_SIZE as u64,
        })
    }

    fn with_scanned_index(
        mut file: File,
        path: &Path,
        mode: ArchiveMode,
    ) -> Result<Self, ArchiveError> {
        let len = file
            .metadata()
            .map_err(|e| ArchiveError::io("stat archive", &e))?
            .len();
        if len < FILE_HEADER_SIZE as u64 {
            return Err(ArchiveError::Truncated {
                detail: format!("{len} bytes, header needs {FILE_HEADER_SIZE}"),
            });
        }

        file.seek(SeekFrom::Start(0))
            .map_err(|e| ArchiveError::io("seek to header", &e))?;
        let mut header = [0u8; FILE_HEADER_SIZE];
        file.read_exact(&mut header)
            .map_err(|e| ArchiveError::io("read archive header", &e))?;
        if header[0..4] != ARCHIVE_MAGIC {
            return Err(ArchiveError::Truncated {
                detail: "bad magic".to_string(),
            });
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != ARCHIVE_VERSION {
            return Err(ArchiveError::UnsupportedVersion { got: version });
        }

        let mut index = BTreeMap::new();
        let mut offset = FILE_HEADER_SIZE as u64;
        loop {
            if offset + RECORD_HEADER_SIZE as u64 > len {
                if offset != len {
                    log::warn!(
                        "{}: torn record header at offset {offset}, scan stopped",
                        path.display()
                    );
                }
                break;
            }
            let mut raw = [0u8; RECORD_HEADER_SIZE];
            file.read_exact(&mut raw)
                .map_err(|e| ArchiveError::io("read record header", &e))?;
            let record = RecordHeader::decode(&raw);

            let payload_offset = offset + RECORD_HEADER_SIZE as u64;
            let payload_end = payload_offset + u64::from(record.meta.stored_size);
            if ResourceKind::from_tag(record.kind_tag).is_none() || payload_end > len {
                log::warn!(
                    "{}: malformed record at offset {offset}, scan stopped",
                    path.display()
                );
                break;
            }

            index.insert(
                (record.kind_tag, record.hash.value()),
                EntryLocation {
                    payload_offset,
                    meta: record.meta,
                },
            );
            offset = payload_end;
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| ArchiveError::io("seek past payload", &e))?;
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
            mode,
            index,
            append_offset: offset,
        })
    }

    /// The path this archive was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn mode(&self) -> ArchiveMode {
        self.mode
    }

    /// Whether `(kind, hash)` exists in this archive.
    #[must_use]
    pub fn has_entry(&self, kind: ResourceKind, hash: Hash64) -> bool {
        self.index.contains_key(&(kind.tag(), hash.value()))
    }

    /// All hashes stored for a kind, ascending.
    #[must_use]
    pub fn hash_list(&self, kind: ResourceKind) -> Vec<Hash64> {
        let tag = kind.tag();
        self.index
            .range((tag, u64::MIN)..=(tag, u64::MAX))
            .map(|(&(_, hash), _)| Hash64::new(hash))
            .collect()
    }

    /// Number of entries across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Write one entry. A duplicate `(kind, hash)` is suppressed as a no-op
    /// success, keeping the key unique within the file.
    ///
    /// The write is durable in the file once this returns `Ok`.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::ReadOnly`] in read-only mode;
    /// [`ArchiveError::MalformedRawPayload`] for a bad `RAW` frame;
    /// [`ArchiveError::Io`] on write failure.
    pub fn write_entry(
        &mut self,
        kind: ResourceKind,
        hash: Hash64,
        payload: &[u8],
        flags: PayloadFlags,
    ) -> Result<(), ArchiveError> {
        if self.mode == ArchiveMode::ReadOnly {
            return Err(ArchiveError::ReadOnly);
        }
        if self.has_entry(kind, hash) {
            return Ok(());
        }

        let (meta, stored) = if flags.contains(PayloadFlags::RAW) {
            let (meta, stored) = decode_raw(payload)?;
            (meta, stored.to_vec())
        } else {
            let stored = if flags.contains(PayloadFlags::COMPRESS) {
                deflate(payload)?
            } else {
                payload.to_vec()
            };
            let crc32 = if flags.contains(PayloadFlags::CHECKSUM) {
                crc32fast::hash(&stored)
            } else {
                0
            };
            #[allow(clippy::cast_possible_truncation)]
            let meta = PayloadMeta {
                stored_size: stored.len() as u32,
                uncompressed_size: payload.len() as u32,
                flags: flags.stored().bits(),
                crc32,
            };
            (meta, stored)
        };

        let header = RecordHeader {
            kind_tag: kind.tag(),
            hash,
            meta,
        };
        self.file
            .seek(SeekFrom::Start(self.append_offset))
            .map_err(|e| ArchiveError::io("seek to append offset", &e))?;
        self.file
            .write_all(&header.encode())
            .map_err(|e| ArchiveError::io("write record header", &e))?;
        self.file
            .write_all(&stored)
            .map_err(|e| ArchiveError::io("write record payload", &e))?;
        self.file
            .flush()
            .map_err(|e| ArchiveError::io("flush record", &e))?;

        let payload_offset = self.append_offset + RECORD_HEADER_SIZE as u64;
        self.index
            .insert((kind.tag(), hash.value()), EntryLocation { payload_offset, meta });
        self.append_offset = payload_offset + u64::from(meta.stored_size);
        Ok(())
    }

    fn location(&self, kind: ResourceKind, hash: Hash64) -> Result<EntryLocation, ArchiveError> {
        self.index
            .get(&(kind.tag(), hash.value()))
            .copied()
            .ok_or_else(|| ArchiveError::NotFound {
                detail: format!("{kind} {hash}"),
            })
    }

    fn read_stored(&mut self, location: EntryLocation) -> Result<Vec<u8>, ArchiveError> {
        self.file
            .seek(SeekFrom::Start(location.payload_offset))
            .map_err(|e| ArchiveError::io("seek to payload", &e))?;
        let mut stored = vec![0u8; location.meta.stored_size as usize];
        self.file
            .read_exact(&mut stored)
            .map_err(|e| ArchiveError::io("read payload", &e))?;
        Ok(stored)
    }

    /// Size of the bytes [`StreamArchive::read_entry`] would return, for the
    /// probe-then-read calling pattern.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::NotFound`] if the entry does not exist.
    pub fn entry_size(
        &self,
        kind: ResourceKind,
        hash: Hash64,
        flags: PayloadFlags,
    ) -> Result<usize, ArchiveError> {
        let location = self.location(kind, hash)?;
        if flags.contains(PayloadFlags::RAW) {
            Ok(RAW_PREFIX_SIZE + location.meta.stored_size as usize)
        } else {
            Ok(location.meta.uncompressed_size as usize)
        }
    }

    /// Read one entry.
    ///
    /// Plain reads verify the checksum (when the entry stored one) and
    /// decompress (when the entry is compressed). A `RAW` read returns the
    /// stored form with its metadata prefix, untouched.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::NotFound`], [`ArchiveError::ChecksumMismatch`],
    /// [`ArchiveError::Truncated`] (decompressed size mismatch), or
    /// [`ArchiveError::Io`].
    pub fn read_entry(
        &mut self,
        kind: ResourceKind,
        hash: Hash64,
        flags: PayloadFlags,
    ) -> Result<Vec<u8>, ArchiveError> {
        let location = self.location(kind, hash)?;
        let stored = self.read_stored(location)?;

        if flags.contains(PayloadFlags::RAW) {
            return Ok(encode_raw(location.meta, &stored));
        }

        let stored_flags = PayloadFlags::from_bits_truncate(location.meta.flags);
        if stored_flags.contains(PayloadFlags::CHECKSUM) {
            let computed = crc32fast::hash(&stored);
            if computed != location.meta.crc32 {
                return Err(ArchiveError::ChecksumMismatch {
                    kind,
                    hash,
                    stored: location.meta.crc32,
                    computed,
                });
            }
        }

        if stored_flags.contains(PayloadFlags::COMPRESS) {
            let plain = inflate(&stored, location.meta.uncompressed_size as usize)?;
            if plain.len() != location.meta.uncompressed_size as usize {
                return Err(ArchiveError::Truncated {
                    detail: format!(
                        "entry {kind} {hash}: decompressed {} of {} bytes",
                        plain.len(),
                        location.meta.uncompressed_size
                    ),
                });
            }
            Ok(plain)
        } else {
            Ok(stored)
        }
    }

    /// Caller-buffer form of [`StreamArchive::read_entry`]. Returns the
    /// number of bytes written, which equals
    /// [`StreamArchive::entry_size`] for the same flags.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::BufferTooSmall`] without touching the buffer, plus
    /// everything [`StreamArchive::read_entry`] returns.
    pub fn read_entry_into(
        &mut self,
        kind: ResourceKind,
        hash: Hash64,
        buffer: &mut [u8],
        flags: PayloadFlags,
    ) -> Result<usize, ArchiveError> {
        let needed = self.entry_size(kind, hash, flags)?;
        if buffer.len() < needed {
            return Err(ArchiveError::BufferTooSmall {
                needed,
                got: buffer.len(),
            });
        }
        let bytes = self.read_entry(kind, hash, flags)?;
        buffer[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }
}

fn deflate(plain: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(plain)
        .map_err(|e| ArchiveError::io("deflate payload", &e))?;
    encoder
        .finish()
        .map_err(|e| ArchiveError::io("finish deflate", &e))
}

fn inflate(stored: &[u8], expected_size: usize) -> Result<Vec<u8>, ArchiveError> {
    let mut decoder = DeflateDecoder::new(stored);
    let mut plain = Vec::with_capacity(expected_size);
    decoder
        .read_to_end(&mut plain)
        .map_err(|e| ArchiveError::io("inflate payload", &e))?;
    Ok(plain)
}
