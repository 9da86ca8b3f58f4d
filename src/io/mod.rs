//! CSV input of extracted invoices and CSV export of results.

pub mod export;
pub mod invoices;

use thiserror::Error;

/// Failure reading or writing a CSV file.
#[derive(Debug, Error)]
pub enum CsvIoError {
    /// Malformed CSV, or a read or write failure inside the CSV codec.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// File could not be created or output could not be flushed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
