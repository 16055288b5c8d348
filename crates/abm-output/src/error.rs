//! Failures while persisting run output.
//!
//! A failed write never stops the simulation: `SimOutputObserver` keeps the
//! first error, skips later writes and hands it back from `take_error`.
//! Backend variants only exist when their feature is enabled.

use thiserror::Error;

/// Why agent rows, step summaries or state counts could not be written.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output: {0}")]
    Csv(#[from] csv::Error),

    /// A write after `finish`.
    #[error("output writer already finished")]
    Finished,

    #[cfg(feature = "sqlite")]
    #[error("SQLite output: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "parquet")]
    #[error("Arrow batch: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error("Parquet output: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type OutputResult<T> = Result<T, OutputError>;
