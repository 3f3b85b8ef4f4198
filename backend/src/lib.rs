//! # Disburse - salary schedule to bank bulk-upload transformer
//!
//! Disburse reads a disbursement schedule (CSV or XLSX), checks that the line
//! items add up to the declared total on the last row, maps each bank name to
//! its six-digit sort code and writes the CSV a bank's bulk-payment portal
//! accepts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV / XLSX │────▶│   Parser    │────▶│  Transform  │────▶│  Upload CSV │
//! │  schedule   │     │  (auto-enc) │     │ (sum + map) │     │  (="…" ids) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use disburse::{process_file, BankCodeTable, TransformOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = BankCodeTable::builtin();
//!     let result = process_file("march.xlsx", &table, &TransformOptions::with_remark("March"))?;
//!     println!("{} rows, totals match: {}", result.output.rows.len(), result.check.matches);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per concern
//! - [`config`] - Environment configuration
//! - [`models`] - Domain models (InputSheet, SumCheck, OutputRow)
//! - [`bank_codes`] - Bank name to sort code table
//! - [`parser`] - CSV / XLSX reading with auto-detection
//! - [`transform`] - Column resolution, sum check, row building, pipeline
//! - [`export`] - Bulk-upload CSV encoding and file naming
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Reference data
pub mod bank_codes;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    BankCodeError, ConfigError, ExportError, PipelineError, ServerError, SheetError,
    TransformError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    group_thousands, DisbursementRow, InputSheet, OutputRow, SheetRow, SkippedRow, SumCheck,
    UnresolvedBank,
};

// =============================================================================
// Re-exports - Configuration and reference data
// =============================================================================

pub use bank_codes::BankCodeTable;
pub use config::Config;

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes, parse_file, ParseResult,
    RawTable, SheetFormat,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    build_output, process_bytes, process_file, process_parsed, validate_and_sum, BuildResult,
    PipelineResult, SheetInfo, TransformOptions,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{encode_csv, file_name, file_name_now};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, UploadResponse, ValidationSummary};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
