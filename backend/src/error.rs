//! Error types for the disbursement pipeline.
//!
//! One enum per concern:
//!
//! - [`SheetError`] - reading and parsing the uploaded file
//! - [`TransformError`] - column resolution and amount parsing
//! - [`BankCodeError`] - loading a bank-code table
//! - [`ExportError`] - CSV encoding
//! - [`ConfigError`] - environment configuration
//! - [`PipelineError`] - top-level orchestration
//! - [`ServerError`] - HTTP layer
//!
//! Lower-level errors convert into [`PipelineError`] and [`ServerError`] via `From`,
//! so `?` works across module boundaries.

use thiserror::Error;

// =============================================================================
// Sheet Errors
// =============================================================================

/// Errors while reading an uploaded sheet.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// File extension is neither CSV nor XLSX.
    #[error("Unsupported file format. ({0})")]
    UnsupportedFormat(String),

    /// Malformed CSV.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook could not be opened or read.
    #[error("Invalid workbook: {0}")]
    Workbook(String),

    /// Workbook contains no worksheet.
    #[error("Workbook has no worksheet")]
    NoWorksheet,

    /// Empty file.
    #[error("Sheet is empty")]
    EmptySheet,

    /// Header row is blank.
    #[error("No headers found in sheet")]
    NoHeaders,
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors while turning a raw table into an [`InputSheet`](crate::models::InputSheet).
#[derive(Debug, Error)]
pub enum TransformError {
    /// A required column is absent from the header row.
    #[error("Could not find column '{0}'")]
    MissingColumn(String),

    /// A `Net Value` cell is not a number.
    #[error("Line {line}: '{value}' is not a valid amount")]
    InvalidAmount { line: usize, value: String },

    /// Line items add up to more than a `Decimal` can hold.
    #[error("Line {line}: Net Value total is out of range")]
    AmountOverflow { line: usize },

    /// The sheet has no rows, so there is no total row either.
    #[error("Sheet has no rows; expected line items followed by a total row")]
    MissingTotalRow,
}

// =============================================================================
// Bank Code Errors
// =============================================================================

/// Errors while loading a bank-code table.
#[derive(Debug, Error)]
pub enum BankCodeError {
    /// IO error.
    #[error("Bank code table IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Bank code table JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A code that is not six ASCII digits.
    #[error("Invalid sort code '{code}' for bank '{bank}': expected 6 digits")]
    InvalidCode { bank: String, code: String },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while encoding the bulk-upload CSV.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer error.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Returned by [`crate::transform::pipeline::process_bytes`] and friends. Every
/// variant is fatal for the upload: no output is produced.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Sheet reading error.
    #[error("{0}")]
    Sheet(#[from] SheetError),

    /// Column or amount error.
    #[error("{0}")]
    Transform(#[from] TransformError),

    /// Encoding error.
    #[error("{0}")]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// Whether the error was caused by the uploaded content rather than the system.
    pub fn is_user_error(&self) -> bool {
        match self {
            PipelineError::Sheet(SheetError::Io(_)) => false,
            PipelineError::Sheet(_) | PipelineError::Transform(_) => true,
            PipelineError::Export(_) => false,
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for sheet operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for bank-code table operations.
pub type BankCodeResult<T> = Result<T, BankCodeError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // SheetError -> PipelineError
        let sheet_err = SheetError::EmptySheet;
        let pipeline_err: PipelineError = sheet_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // TransformError -> PipelineError -> ServerError
        let transform_err = TransformError::MissingColumn("Bank Name".into());
        let pipeline_err: PipelineError = transform_err.into();
        let server_err: ServerError = pipeline_err.into();
        assert_eq!(server_err.to_string(), "Could not find column 'Bank Name'");
    }

    #[test]
    fn test_invalid_amount_format() {
        let err = TransformError::InvalidAmount {
            line: 4,
            value: "abc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Line 4"));
        assert!(msg.contains("'abc'"));
    }

    #[test]
    fn test_amount_overflow_is_a_user_error() {
        let err: PipelineError = TransformError::AmountOverflow { line: 7 }.into();
        assert!(err.is_user_error());
        assert!(err.to_string().starts_with("Line 7:"));
    }

    #[test]
    fn test_user_error_classification() {
        let unsupported: PipelineError = SheetError::UnsupportedFormat("pdf".into()).into();
        assert!(unsupported.is_user_error());

        let io: PipelineError =
            SheetError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk")).into();
        assert!(!io.is_user_error());
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = SheetError::UnsupportedFormat("pdf".into());
        assert!(err.to_string().starts_with("Unsupported file format."));
    }
}
