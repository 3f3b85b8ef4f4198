//! Disbursement transformation.
//!
//! - [`sheet`]: map header labels onto [`InputSheet`](crate::models::InputSheet) fields
//! - [`totals`]: compare the line-item sum with the declared total
//! - [`output`]: build the bulk-upload rows
//! - [`pipeline`]: parse, validate, build in one pass

pub mod output;
pub mod pipeline;
pub mod sheet;
pub mod totals;

pub use output::{build_output, BuildResult};
pub use pipeline::{
    process_bytes, process_file, process_parsed, PipelineResult, SheetInfo, TransformOptions,
};
pub use sheet::{parse_amount, ACCOUNT_NUMBER, BANK_NAME, NET_VALUE, REQUIRED_COLUMNS};
pub use totals::validate_and_sum;
