//! One-pass pipeline: read → resolve columns → validate totals → build rows.
//!
//! ```rust,ignore
//! use disburse::{process_file, BankCodeTable, TransformOptions};
//!
//! let table = BankCodeTable::builtin();
//! let options = TransformOptions::with_remark("March payroll");
//! let result = process_file("march.xlsx", &table, &options)?;
//! if !result.check.matches {
//!     eprintln!("{}", result.check.warning_message().unwrap_or_default());
//! }
//! std::fs::write("upload.csv", result.encode()?)?;
//! ```
//!
//! Everything is synchronous and request-scoped. Fatal errors stop the pass
//! before any output exists; a total mismatch, dropped rows and unresolved
//! bank names are logged as warnings and the rows are still produced.

use serde::Serialize;
use std::path::Path;

use super::output::{build_output, BuildResult};
use super::totals::validate_and_sum;
use crate::api::logs::{
    log_error, log_info, log_info_indent, log_success, log_warning, log_warning_indent,
};
use crate::bank_codes::BankCodeTable;
use crate::error::{ExportResult, PipelineError, PipelineResult as Result};
use crate::export::encode_csv;
use crate::models::{InputSheet, SumCheck};
use crate::parser::{parse_bytes, parse_file, ParseResult, RawTable, SheetFormat};

/// Rows listed individually in warnings before summarising.
const MAX_LISTED: usize = 5;

/// Per-upload options.
#[derive(Debug, Clone, Serialize)]
pub struct TransformOptions {
    /// Operator remark attached to every row; may be empty.
    pub remark: String,
    /// Currency symbol for the success message.
    pub currency: String,
}

impl TransformOptions {
    pub fn with_remark(remark: impl Into<String>) -> Self {
        Self {
            remark: remark.into(),
            ..Self::default()
        }
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            remark: String::new(),
            currency: crate::config::DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

/// What was read from the upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfo {
    pub format: SheetFormat,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    pub columns: Vec<String>,
    /// Data rows including the total row.
    pub row_count: usize,
}

/// Everything one upload produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub sheet: SheetInfo,
    /// The table as uploaded, for the raw preview.
    pub source: RawTable,
    pub check: SumCheck,
    pub output: BuildResult,
}

impl PipelineResult {
    /// Encode the output rows for download.
    pub fn encode(&self) -> ExportResult<Vec<u8>> {
        encode_csv(&self.output.rows)
    }

    /// `ready` when the totals agree, `warning` otherwise.
    pub fn status(&self) -> &'static str {
        if self.check.matches {
            "ready"
        } else {
            "warning"
        }
    }

    /// Whether any silent gap (dropped rows, missing bank codes) occurred.
    pub fn has_gaps(&self) -> bool {
        !self.output.skipped.is_empty() || !self.output.unresolved.is_empty()
    }
}

/// Run the pipeline on uploaded bytes; `file_name` selects the format.
pub fn process_bytes(
    bytes: &[u8],
    file_name: &str,
    bank_codes: &BankCodeTable,
    options: &TransformOptions,
) -> Result<PipelineResult> {
    log_info(format!("📖 Reading {} ({} bytes)...", file_name, bytes.len()));
    let parsed = parse_bytes(bytes, file_name).map_err(report)?;
    process_parsed(parsed, bank_codes, options)
}

/// Run the pipeline on a file from disk.
pub fn process_file<P: AsRef<Path>>(
    path: P,
    bank_codes: &BankCodeTable,
    options: &TransformOptions,
) -> Result<PipelineResult> {
    log_info(format!("📖 Reading {}...", path.as_ref().display()));
    let parsed = parse_file(path).map_err(report)?;
    process_parsed(parsed, bank_codes, options)
}

/// Run the pipeline on an already-read table.
pub fn process_parsed(
    parsed: ParseResult,
    bank_codes: &BankCodeTable,
    options: &TransformOptions,
) -> Result<PipelineResult> {
    describe_parse(&parsed);

    let sheet = InputSheet::from_table(&parsed.table).map_err(report)?;

    let check = validate_and_sum(&sheet);
    report_check(&check, &options.currency);

    log_info("⚙️  Building upload rows...");
    let output = build_output(&sheet, &options.remark, bank_codes);
    report_output(&output);

    Ok(PipelineResult {
        sheet: SheetInfo {
            format: parsed.format,
            encoding: parsed.encoding,
            delimiter: parsed.delimiter,
            columns: parsed.table.headers.clone(),
            row_count: parsed.table.rows.len(),
        },
        source: parsed.table,
        check,
        output,
    })
}

/// Log a fatal error and convert it for `?`.
fn report<E: Into<PipelineError>>(err: E) -> PipelineError {
    let err = err.into();
    log_error(err.to_string());
    err
}

fn describe_parse(parsed: &ParseResult) {
    log_success(format!("Format: {}", parsed.format));
    if let Some(ref encoding) = parsed.encoding {
        log_success(format!("Detected encoding: {}", encoding));
    }
    if let Some(delimiter) = parsed.delimiter {
        log_success(format!("Detected separator: '{}'", format_delimiter(delimiter)));
    }
    log_success(format!("Read {} rows", parsed.table.rows.len()));
    log_info(format!("📋 Columns: {}", parsed.table.headers.join(", ")));
}

/// A mismatch warning comes first; the total banner is always shown.
fn report_check(check: &SumCheck, currency: &str) {
    if let Some(warning) = check.warning_message() {
        log_warning(warning);
        log_info_indent(
            format!("Line items add up to {}", crate::models::group_thousands(check.computed_sum)),
            1,
        );
    }
    log_success(check.success_message(currency));
}

fn report_output(output: &BuildResult) {
    log_success(format!("{} rows ready for upload", output.rows.len()));

    if !output.skipped.is_empty() {
        log_warning(format!(
            "{} rows dropped (missing required fields)",
            output.skipped.len()
        ));
        for skip in output.skipped.iter().take(MAX_LISTED) {
            log_warning_indent(
                format!("Line {}: missing {}", skip.line, skip.missing_fields.join(", ")),
                1,
            );
        }
        if output.skipped.len() > MAX_LISTED {
            log_warning_indent(format!("... +{}", output.skipped.len() - MAX_LISTED), 1);
        }
    }

    if !output.unresolved.is_empty() {
        log_warning(format!(
            "{} rows have no bank code",
            output.unresolved.len()
        ));
        for miss in output.unresolved.iter().take(MAX_LISTED) {
            log_warning_indent(format!("Line {}: unknown bank '{}'", miss.line, miss.bank_name), 1);
        }
        if output.unresolved.len() > MAX_LISTED {
            log_warning_indent(format!("... +{}", output.unresolved.len() - MAX_LISTED), 1);
        }
    }
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
