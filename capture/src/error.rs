//! Typed capture errors, one enum per operation class.

use crate::id::Hash64;
use crate::kind::ResourceKind;

/// Structural failure while hashing or recording a descriptor.
///
/// The offending call is rejected; recorder state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// An extension-chain entry is not recognized for this descriptor kind.
    UnsupportedExtension { kind: ResourceKind, stype: u32 },

    /// A referenced object id was never registered with the recorder.
    UnknownReference { kind: ResourceKind, id: u64 },
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedExtension { kind, stype } => {
                write!(f, "unsupported extension on {kind}: stype={stype}")
            }
            Self::UnknownReference { kind, id } => {
                write!(f, "unknown {kind} reference: id={id}")
            }
        }
    }
}

impl std::error::Error for RecordError {}

/// Failure serializing recorder state into the textual document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    /// A float field is NaN or infinite; JSON cannot represent it.
    NonFiniteFloat { field: &'static str },

    /// The requested `(kind, hash)` is not interned.
    UnknownEntry { kind: ResourceKind, hash: Hash64 },

    /// JSON rendering failed.
    Render { detail: String },
}

impl std::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteFloat { field } => {
                write!(f, "non-finite float in field {field}")
            }
            Self::UnknownEntry { kind, hash } => {
                write!(f, "unknown entry: {kind} {hash}")
            }
            Self::Render { detail } => write!(f, "JSON rendering failed: {detail}"),
        }
    }
}

impl std::error::Error for SerializeError {}

/// Fail-closed failure parsing a textual document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The payload is not valid JSON.
    InvalidJson { detail: String },

    /// The document root is not an object.
    NotAnObject,

    /// The schema version tag is missing or not a supported version.
    UnsupportedVersion { got: String },

    /// A required field is missing from an object.
    MissingField { field: &'static str },

    /// A field is present but malformed.
    InvalidField { field: &'static str, detail: String },

    /// A hash or id string is not a decimal `u64`.
    InvalidHash { raw: String },

    /// A base64 blob failed to decode.
    InvalidBlob { field: &'static str },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson { detail } => write!(f, "invalid JSON: {detail}"),
            Self::NotAnObject => write!(f, "document root is not an object"),
            Self::UnsupportedVersion { got } => write!(f, "unsupported document version: {got}"),
            Self::MissingField { field } => write!(f, "missing field: {field}"),
            Self::InvalidField { field, detail } => {
                write!(f, "invalid field {field}: {detail}")
            }
            Self::InvalidHash { raw } => write!(f, "invalid hash string: {raw:?}"),
            Self::InvalidBlob { field } => write!(f, "invalid base64 blob in field {field}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Why the replayer skipped one object while continuing with its siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The recomputed hash does not match the hash recorded in the document.
    HashMismatch { recomputed: Hash64 },

    /// A dependency of this object was itself skipped or absent.
    MissingDependency { kind: ResourceKind, hash: Hash64 },

    /// The document carries an extension chain the hasher does not support.
    UnsupportedExtension { stype: u32 },

    /// The sink declined the object.
    SinkRejected { detail: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HashMismatch { recomputed } => {
                write!(f, "hash mismatch: recomputed={recomputed}")
            }
            Self::MissingDependency { kind, hash } => {
                write!(f, "missing dependency: {kind} {hash}")
            }
            Self::UnsupportedExtension { stype } => {
                write!(f, "unsupported extension: stype={stype}")
            }
            Self::SinkRejected { detail } => write!(f, "sink rejected: {detail}"),
        }
    }
}
