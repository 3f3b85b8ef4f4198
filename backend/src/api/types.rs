//! REST API types for the operator UI.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{OutputRow, SkippedRow, UnresolvedBank};
use crate::parser::RawTable;
use crate::transform::pipeline::{PipelineResult, SheetInfo};

/// Response to `POST /api/upload`: everything the UI needs to render both
/// previews and the validation banner before the operator downloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: String,

    /// `ready` or `warning`.
    pub status: String,

    /// Name the download will carry.
    pub file_name: String,

    pub validation: ValidationSummary,

    pub sheet: SheetInfo,

    /// Uploaded table as read.
    pub source: RawTable,

    /// Transformed rows, bank name included for confirmation.
    pub rows: Vec<OutputRow>,

    pub skipped: Vec<SkippedRow>,

    pub unresolved: Vec<UnresolvedBank>,
}

/// Sum-check outcome with the banner text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub computed_sum: Decimal,
    pub declared_total: Option<Decimal>,
    pub matches: bool,
    /// Success line, always present.
    pub message: String,
    /// Mismatch line, present only when the totals disagree.
    pub warning: Option<String>,
}

impl UploadResponse {
    pub fn new(result: PipelineResult, currency: &str, file_name: String) -> Self {
        let validation = ValidationSummary {
            computed_sum: result.check.computed_sum,
            declared_total: result.check.declared_total,
            matches: result.check.matches,
            message: result.check.success_message(currency),
            warning: result.check.warning_message(),
        };

        UploadResponse {
            job_id: Uuid::new_v4().to_string(),
            status: result.status().to_string(),
            file_name,
            validation,
            sheet: result.sheet,
            source: result.source,
            rows: result.output.rows,
            skipped: result.output.skipped,
            unresolved: result.output.unresolved,
        }
    }
}

/// Error envelope shared by every endpoint.
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "rows": [],
    })
}
