//! Nexus event log crate
//!
//! A durable, append-only event log for market-data events, persisted as
//! columnar Parquet partitioned by symbol and UTC date:
//! - File-based storage with ZSTD compression, dictionary-encoded identifier
//!   columns, and dual float/decimal128 encoding of monetary values.
//! - Crash-safe finalization: files are staged at a `.partial` path and
//!   published by atomic rename after the footer metadata (including the
//!   `write_complete` marker) is written.
//! - Deterministic replay with IO-level pruning: row groups whose min/max
//!   statistics cannot match the active time/sequence filters are skipped
//!   without being read.
//!
//! Key modules:
//! - `schema`: the v1.0 Arrow schema and name-derived column indices.
//! - `validate`: per-event invariant checks and the pairwise ordering check.
//! - `writer`: batching columnar writer with atomic finalization.
//! - `reader`: streaming reader with row-group pruning and filter residual.
//! - `partition`: canonical `{base}/{SYMBOL}/YYYY/MM/DD.parquet` layout.
//! - `metadata`: footer provenance record (session id, time bounds, host).
//!
//! To persist data, create an [`EventLogWriter`] at a path produced by
//! [`partition::partition_path`], append validated events, and `close()`.
//! Replay with [`EventLogReader`], optionally narrowing by
//! `set_time_range` / `set_seq_range` before draining.

pub mod error;
pub mod metadata;
pub mod partition;
pub mod reader;
pub mod schema;
pub mod validate;
pub mod writer;

pub use error::EventLogError;
pub use metadata::FileMeta;
pub use reader::EventLogReader;
pub use validate::{validate, validate_header, validate_ordering, ValidationError};
pub use writer::{EventLogWriter, WriterOptions};
