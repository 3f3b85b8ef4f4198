//! Sheet reading for CSV and XLSX uploads.
//!
//! Produces a [`RawTable`]: header labels as written and rows of trimmed,
//! optional cells.
//! Nothing here knows about disbursement columns; that mapping happens in
//! [`crate::transform`].

use calamine::{Data, Reader, Xlsx};
use serde::Serialize;
use std::fmt;
use std::io::Cursor;
use std::path::Path;

use crate::error::{SheetError, SheetResult};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

impl SheetFormat {
    /// Pick the format from a file name's extension.
    ///
    /// Anything other than `.csv` or `.xlsx` is rejected.
    pub fn from_file_name(name: &str) -> SheetResult<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(SheetFormat::Csv),
            "xlsx" => Ok(SheetFormat::Xlsx),
            "" => Err(SheetError::UnsupportedFormat("no extension".to_string())),
            other => Err(SheetError::UnsupportedFormat(format!(".{}", other))),
        }
    }
}

impl fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetFormat::Csv => write!(f, "csv"),
            SheetFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}

/// One data row with its source line number (header = line 1).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    pub line: usize,
    pub cells: Vec<Option<String>>,
}

/// Header-addressed table as read from the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Index of a column by exact header label.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell of `row` in column `index`; short rows read as absent.
    pub fn cell(row: &RawRow, index: usize) -> Option<&str> {
        row.cells.get(index).and_then(|c| c.as_deref())
    }
}

/// Result of reading a file, with detection metadata.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub format: SheetFormat,
    /// Detected encoding (CSV only).
    pub encoding: Option<String>,
    /// Detected delimiter (CSV only).
    pub delimiter: Option<char>,
    pub table: RawTable,
}

// =============================================================================
// Entry points
// =============================================================================

/// Read an uploaded file, dispatching on the extension of `file_name`.
pub fn parse_bytes(bytes: &[u8], file_name: &str) -> SheetResult<ParseResult> {
    match SheetFormat::from_file_name(file_name)? {
        SheetFormat::Csv => parse_csv_bytes(bytes),
        SheetFormat::Xlsx => Ok(ParseResult {
            format: SheetFormat::Xlsx,
            encoding: None,
            delimiter: None,
            table: parse_workbook(bytes)?,
        }),
    }
}

/// Read a file from disk.
pub fn parse_file<P: AsRef<Path>>(path: P) -> SheetResult<ParseResult> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    // Reject the extension before touching the disk.
    SheetFormat::from_file_name(&name)?;

    let bytes = std::fs::read(path)?;
    parse_bytes(&bytes, &name)
}

// =============================================================================
// CSV
// =============================================================================

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes with the given encoding. Unknown encodings fall back to lossy UTF-8.
///
/// A leading byte-order mark is removed.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let codec = match encoding.to_lowercase().as_str() {
        // WHATWG maps latin-1 labels onto windows-1252.
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252
        }
        "iso-8859-15" => encoding_rs::ISO_8859_15,
        _ => encoding_rs::UTF_8,
    };
    codec.decode(bytes).0.into_owned()
}

/// Detect the delimiter by counting candidates in the header line.
///
/// Ties and header lines with no candidate resolve to `,`.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for sep in [',', ';', '\t', '|'] {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes with encoding and delimiter auto-detection.
pub fn parse_csv_bytes(bytes: &[u8]) -> SheetResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_csv_str(&content, delimiter)?;

    Ok(ParseResult {
        format: SheetFormat::Csv,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
        table,
    })
}

/// Parse decoded CSV text with an explicit single-byte delimiter.
///
/// Rows may be shorter or longer than the header; blank rows are skipped.
pub fn parse_csv_str(content: &str, delimiter: char) -> SheetResult<RawTable> {
    if content.trim().is_empty() {
        return Err(SheetError::EmptySheet);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Fields)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SheetError::NoHeaders);
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);

        let cells: Vec<Option<String>> = record.iter().map(non_empty).collect();
        if cells.iter().all(Option::is_none) {
            continue;
        }
        rows.push(RawRow { line, cells });
    }

    Ok(RawTable { headers, rows })
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// =============================================================================
// XLSX
// =============================================================================

/// Read the first worksheet of an XLSX workbook. The first row holds the headers.
pub fn parse_workbook(bytes: &[u8]) -> SheetResult<RawTable> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| SheetError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::NoWorksheet)?
        .map_err(|e| SheetError::Workbook(e.to_string()))?;

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut sheet_rows = range.rows();

    let header_row = sheet_rows.next().ok_or(SheetError::EmptySheet)?;
    let headers: Vec<String> = header_row.iter().map(header_text).collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SheetError::NoHeaders);
    }

    let mut rows = Vec::new();
    for (idx, row) in sheet_rows.enumerate() {
        let cells: Vec<Option<String>> = row.iter().map(cell_text).collect();
        if cells.iter().all(Option::is_none) {
            continue;
        }
        rows.push(RawRow {
            // +1 for the header, +1 for 1-based lines.
            line: first_row + idx + 2,
            cells,
        });
    }

    Ok(RawTable { headers, rows })
}

/// Header labels are kept verbatim so column matching stays exact.
fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => cell_text(other).unwrap_or_default(),
    }
}

/// Text of a workbook cell. Whole floats render without a fractional part so
/// numeric account numbers read as digits.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => non_empty(s),
        Data::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => Some(format!("{}", *v as i64)),
        Data::Float(v) => Some(format!("{v}")),
        Data::Int(v) => Some(format!("{v}")),
        Data::Bool(v) => Some(v.to_string().to_uppercase()),
        other => non_empty(&other.to_string()),
    }
}
