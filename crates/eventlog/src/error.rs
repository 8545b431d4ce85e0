use thiserror::Error;

/// Systemic failures of the storage layer.
///
/// Per-event validation rejects are not errors at this level; they are
/// reported through [`crate::writer::EventLogWriter::validation_errors`].
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("decode: {0}")]
    Decode(String),
}
