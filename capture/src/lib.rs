//! Amber capture: GPU pipeline state capture and replay.
//!
//! A [`record::Recorder`] ingests pipeline-creation descriptors from a running
//! application, deduplicates them by a 64-bit content hash, and serializes the
//! interned state into a stable, versioned textual document. [`replay::replay`]
//! parses that document and surfaces each object to a caller-supplied
//! [`replay::StateSink`] in dependency order, re-verifying every hash.
//!
//! # Module Dependency Direction
//!
//! `kind`/`id`/`model` ← `hash` ← `record` ← `serialize`/`parse` ← `replay`
//!
//! One-way only. No cycles. The hashing layer knows nothing about
//! serialization; the replayer is the only consumer of the parser.

pub mod domain;
pub mod error;
pub mod hash;
pub mod id;
pub mod kind;
pub mod model;
pub mod parse;
pub mod record;
pub mod replay;
pub mod serialize;

pub use error::{ParseError, RecordError, SerializeError, SkipReason};
pub use id::Hash64;
pub use kind::ResourceKind;
pub use record::Recorder;
pub use replay::{replay, replay_document, ReplayReport, ReplaySkip, SinkRejection, StateSink};
