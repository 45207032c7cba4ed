//! Typed archive errors.

use amber_capture::{Hash64, ResourceKind};

/// Failure of one archive operation.
///
/// Storage failures leave the archive instance usable for subsequent calls
/// unless the underlying file itself is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// The entry or file does not exist.
    NotFound { detail: String },

    /// Stored checksum does not match the recomputed one.
    ChecksumMismatch {
        kind: ResourceKind,
        hash: Hash64,
        stored: u32,
        computed: u32,
    },

    /// The file ends mid-structure where a complete one is required.
    Truncated { detail: String },

    /// An I/O operation failed.
    Io { detail: String },

    /// The file header carries a version this build does not read.
    UnsupportedVersion { got: u16 },

    /// The caller-provided buffer is too small for the entry.
    BufferTooSmall { needed: usize, got: usize },

    /// Write attempted on a read-only archive.
    ReadOnly,

    /// A raw-flagged payload is too short to carry its metadata prefix.
    MalformedRawPayload { detail: String },
}

impl ArchiveError {
    /// Map an I/O error into [`ArchiveError::Io`] with call-site context.
    pub(crate) fn io(context: &str, error: &std::io::Error) -> Self {
        Self::Io {
            detail: format!("{context}: {error}"),
        }
    }
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { detail } => write!(f, "not found: {detail}"),
            Self::ChecksumMismatch {
                kind,
                hash,
                stored,
                computed,
            } => write!(
                f,
                "checksum mismatch for {kind} {hash}: stored={stored:#010x}, computed={computed:#010x}"
            ),
            Self::Truncated { detail } => write!(f, "truncated: {detail}"),
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
            Self::UnsupportedVersion { got } => {
                write!(f, "unsupported archive version: {got}")
            }
            Self::BufferTooSmall { needed, got } => {
                write!(f, "buffer too small: needed {needed}, got {got}")
            }
            Self::ReadOnly => write!(f, "archive is read-only"),
            Self::MalformedRawPayload { detail } => {
                write!(f, "malformed raw payload: {detail}")
            }
        }
    }
}

impl std::error::Error for ArchiveError {}
