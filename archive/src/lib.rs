//! Amber archive: a content-addressed blob store for captured pipeline
//! state.
//!
//! Blobs are tagged by [`amber_capture::ResourceKind`] and keyed by 64-bit
//! content hash. Three personalities share one on-disk format:
//!
//! - [`stream::StreamArchive`] — a single-file append-only store with
//!   overwrite, append, and read-only modes
//! - [`concurrent::ConcurrentArchive`] — a logical archive over read-only
//!   shards plus one exclusively-owned per-writer bucket file
//! - [`merge::merge_archives`] — first-occurrence-wins reconciliation of
//!   bucket files into a single shared archive
//!
//! # Module Dependency Direction
//!
//! `format` ← `stream` ← `concurrent` ← `merge`
//!
//! One-way only. No cycles.

pub mod concurrent;
pub mod error;
pub mod format;
pub mod merge;
pub mod stream;

pub use concurrent::ConcurrentArchive;
pub use error::ArchiveError;
pub use format::PayloadFlags;
pub use merge::{merge_archives, MergeStats};
pub use stream::{ArchiveMode, StreamArchive};
