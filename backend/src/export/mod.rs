//! Bulk-upload CSV encoding.
//!
//! Columns: `account_number, remarks, tra_amt, bank_code`. Account numbers and
//! bank codes are written as `="…"` text formulas so spreadsheet tools keep
//! their leading zeros. The bank name never reaches the file.
//!
//! Encoding is deterministic; the only timestamp lives in the file name.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use rust_decimal::Decimal;
use std::fmt::Display;

use crate::error::{ExportError, ExportResult};
use crate::models::OutputRow;

/// Header of the output file, in order.
pub const OUTPUT_COLUMNS: [&str; 4] = ["account_number", "remarks", "tra_amt", "bank_code"];

/// MIME type served with the file.
pub const CSV_MIME: &str = "text/csv";

const DELIMITER: u8 = b',';

const FILE_NAME_FORMAT: &str = "bank_upload_%d-%b-%Y %H:%M.csv";

/// Encode rows as UTF-8 CSV.
///
/// Cells are pre-escaped and written verbatim, so the text formulas stay
/// unquoted while free text is quoted only when it needs to be.
pub fn encode_csv(rows: &[OutputRow]) -> ExportResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(OUTPUT_COLUMNS)?;

    for row in rows {
        writer.write_record([
            text_literal(&row.account_number),
            quote_if_needed(&row.remarks),
            format_amount(row.tra_amt),
            row.bank_code.as_deref().map(text_literal).unwrap_or_default(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Wrap a value as `="value"`.
pub fn text_literal(value: &str) -> String {
    let literal = format!("=\"{}\"", value.replace('"', "\"\""));
    if value.contains(|c| c == DELIMITER as char || c == '\n' || c == '\r') {
        format!("\"{}\"", literal.replace('"', "\"\""))
    } else {
        literal
    }
}

/// Minimal CSV quoting for free text.
fn quote_if_needed(value: &str) -> String {
    if value.contains(|c| c == DELIMITER as char || c == '"' || c == '\n' || c == '\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render an amount the way a float column prints: `1000.0`, `1500.5`.
pub fn format_amount(amount: Decimal) -> String {
    let normalized = amount.normalize();
    if normalized.scale() == 0 {
        format!("{}.0", normalized)
    } else {
        normalized.to_string()
    }
}

/// File name for an export stamped at `at`, e.g. `bank_upload_05-Mar-2026 09:07.csv`.
pub fn file_name<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(FILE_NAME_FORMAT).to_string()
}

/// File name stamped with the current time in the given regional offset.
pub fn file_name_now(offset: FixedOffset) -> String {
    file_name(&Utc::now().with_timezone(&offset))
}
