//! On-disk archive format: constants, record headers, and the raw-payload
//! framing shared by every archive personality.
//!
//! # Wire format
//!
//! ```text
//! [magic:4 "AMBR"][version:u16le]
//! record*: [kind:u32le][hash:u64le][stored_size:u32le]
//!          [uncompressed_size:u32le][flags:u32le][crc32:u32le]
//!          [payload: stored_size bytes]
//! ```
//!
//! Records are append-only. Readers scan from the header; a malformed
//! trailing record stops the scan and everything before it stays readable.
//!
//! A `RAW`-flagged read or write moves a payload *with* its stored metadata,
//! framed as `[stored_size:u32le][uncompressed_size:u32le][flags:u32le]
//! [crc32:u32le][stored bytes]`, so blobs copy between archives without
//! re-encoding.

use crate::error::ArchiveError;
use amber_capture::Hash64;

/// File magic bytes.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"AMBR";

/// Wire format version. Readers MUST reject unknown versions.
pub const ARCHIVE_VERSION: u16 = 1;

/// File header size: magic + version.
pub const FILE_HEADER_SIZE: usize = 4 + 2;

/// Fixed record header size.
pub const RECORD_HEADER_SIZE: usize = 4 + 8 + 4 + 4 + 4 + 4;

/// Raw-payload metadata prefix size.
pub const RAW_PREFIX_SIZE: usize = 4 + 4 + 4 + 4;

bitflags::bitflags! {
    /// Per-entry payload flags.
    ///
    /// `COMPRESS` and `CHECKSUM` select the stored encoding on write and are
    /// persisted in the record header. `RAW` is a transfer mode: the payload
    /// moves in its final stored form, metadata prefix included.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PayloadFlags: u32 {
        /// Payload is stored deflate-compressed.
        const COMPRESS = 1;
        /// crc32 of the stored bytes is kept and verified on read.
        const CHECKSUM = 1 << 1;
        /// Move the payload verbatim in stored form (merge path).
        const RAW = 1 << 2;
    }
}

impl PayloadFlags {
    /// The subset persisted in record headers.
    #[must_use]
    pub fn stored(self) -> Self {
        self & (Self::COMPRESS | Self::CHECKSUM)
    }
}

/// Stored metadata of one record, without its kind/hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadMeta {
    pub stored_size: u32,
    pub uncompressed_size: u32,
    pub flags: u32,
    pub crc32: u32,
}

/// One record header as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub kind_tag: u32,
    pub hash: Hash64,
    pub meta: PayloadMeta,
}

impl RecordHeader {
    #[must_use]
    pub fn encode(&self) -> [u8; RECORD_HEADER_SIZE] {
        let mut out = [0u8; RECORD_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.kind_tag.to_le_bytes());
        out[4..12].copy_from_slice(&self.hash.to_le_bytes());
        out[12..16].copy_from_slice(&self.meta.stored_size.to_le_bytes());
        out[16..20].copy_from_slice(&self.meta.uncompressed_size.to_le_bytes());
        out[20..24].copy_from_slice(&self.meta.flags.to_le_bytes());
        out[24..28].copy_from_slice(&self.meta.crc32.to_le_bytes());
        out
    }

    /// Decode a header from exactly [`RECORD_HEADER_SIZE`] bytes.
    #[must_use]
    pub fn decode(bytes: &[u8; RECORD_HEADER_SIZE]) -> Self {
        let u32_at = |offset: usize| {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[offset..offset + 4]);
            u32::from_le_bytes(raw)
        };
        let mut hash_raw = [0u8; 8];
        hash_raw.copy_from_slice(&bytes[4..12]);
        Self {
            kind_tag: u32_at(0),
            hash: Hash64::new(u64::from_le_bytes(hash_raw)),
            meta: PayloadMeta {
                stored_size: u32_at(12),
                uncompressed_size: u32_at(16),
                flags: u32_at(20),
                crc32: u32_at(24),
            },
        }
    }
}

/// Frame stored bytes with their metadata for a `RAW` transfer.
#[must_use]
pub fn encode_raw(meta: PayloadMeta, stored: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(RAW_PREFIX_SIZE + stored.len());
    out.extend_from_slice(&meta.stored_size.to_le_bytes());
    out.extend_from_slice(&meta.uncompressed_size.to_le_bytes());
    out.extend_from_slice(&meta.flags.to_le_bytes());
    out.extend_from_slice(&meta.crc32.to_le_bytes());
    out.extend_from_slice(stored);
    out
}

/// Split a `RAW` transfer payload back into metadata and stored bytes.
///
/// # Errors
///
/// [`ArchiveError::MalformedRawPayload`] if the prefix is short or the
/// declared stored size does not match the remaining bytes.
pub fn decode_raw(payload: &[u8]) -> Result<(PayloadMeta, &[u8]), ArchiveError> {
    if payload.len() < RAW_PREFIX_SIZE {
        return Err(ArchiveError::MalformedRawPayload {
            detail: format!("{} bytes, prefix needs {RAW_PREFIX_SIZE}", payload.len()),
        });
    }
    let u32_at = |offset: usize| {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&payload[offset..offset + 4]);
        u32::from_le_bytes(raw)
    };
    let meta = PayloadMeta {
        stored_size: u32_at(0),
        uncompressed_size: u32_at(4),
        flags: u32_at(8),
        crc32: u32_at(12),
    };
    let stored = &payload[RAW_PREFIX_SIZE..];
    if stored.len() != meta.stored_size as usize {
        return Err(ArchiveError::MalformedRawPayload {
            detail: format!(
                "declared stored size {} but payload carries {}",
                meta.stored_size,
                stored.len()
            ),
        });
    }
    Ok((meta, stored))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_header_round_trips() {
        let header = RecordHeader {
            kind_tag: 4,
            hash: Hash64::new(0xDEAD_BEEF_CAFE_F00D),
            meta: PayloadMeta {
                stored_size: 128,
                uncompressed_size: 512,
                flags: (PayloadFlags::COMPRESS | PayloadFlags::CHECKSUM).bits(),
                crc32: 0x1234_5678,
            },
        };
        assert_eq!(RecordHeader::decode(&header.encode()), header);
    }

    #[test]
    fn raw_framing_round_trips() {
        let meta = PayloadMeta {
            stored_size: 3,
            uncompressed_size: 3,
            flags: PayloadFlags::CHECKSUM.bits(),
            crc32: 42,
        };
        let framed = encode_raw(meta, &[7, 8, 9]);
        let (decoded, stored) = decode_raw(&framed).unwrap();
        assert_eq!(decoded, meta);
        assert_eq!(stored, &[7, 8, 9]);
    }

    #[test]
    fn raw_framing_rejects_short_prefix() {
        assert!(matches!(
            decode_raw(&[1, 2, 3]),
            Err(ArchiveError::MalformedRawPayload { .. })
        ));
    }

    #[test]
    fn raw_framing_rejects_size_mismatch() {
        let meta = PayloadMeta {
            stored_size: 10,
            uncompressed_size: 10,
            flags: 0,
            crc32: 0,
        };
        let mut framed = encode_raw(meta, &[1, 2, 3]);
        // Declared 10 stored bytes, carries 3.
        assert!(matches!(
            decode_raw(&framed),
            Err(ArchiveError::MalformedRawPayload { .. })
        ));
        framed.truncate(8);
        assert!(matches!(
            decode_raw(&framed),
            Err(ArchiveError::MalformedRawPayload { .. })
        ));
    }

    #[test]
    fn stored_subset_drops_raw() {
        let flags = PayloadFlags::COMPRESS | PayloadFlags::RAW;
        assert_eq!(flags.stored(), PayloadFlags::COMPRESS);
    }
}
