//! Error taxonomy for ingestion, validation and the access gate.

use std::io;

use thiserror::Error;

/// Failures that halt the current interaction.
///
/// Rate computations never fail: a zero denominator yields a rate of 0 and is
/// not represented here.
#[derive(Debug, Error)]
pub enum FunnelError {
    /// No upload was supplied.
    #[error("Please upload a dialer Excel file to continue.")]
    MissingFile,

    /// One or more required columns are absent, listed in required order.
    #[error("Missing columns in Excel: {missing:?}")]
    Schema { missing: Vec<String> },

    /// The shared secret was wrong or absent.
    #[error("authentication required")]
    AuthenticationFailure,

    #[error("unsupported file extension '.{0}' (expected .xlsx, .xlsm, .csv, .tsv or .parquet)")]
    UnsupportedFormat(String),

    #[error("workbook contains no worksheets")]
    EmptyWorkbook,

    #[error("file has no header row")]
    MissingHeader,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("failed to read Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("failed to decode Arrow data: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl FunnelError {
    /// Missing column names for a schema failure, empty otherwise.
    pub fn missing_columns(&self) -> &[String] {
        match self {
            FunnelError::Schema { missing } => missing,
            _ => &[],
        }
    }
}
