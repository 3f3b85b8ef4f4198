//! Build bulk-upload rows from a validated sheet.

use serde::Serialize;

use crate::bank_codes::BankCodeTable;
use crate::models::{InputSheet, OutputRow, SkippedRow, UnresolvedBank};

/// Rows ready for export, plus what was dropped or left without a code.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    /// Output rows in input order.
    pub rows: Vec<OutputRow>,
    /// Rows dropped for a missing required field.
    pub skipped: Vec<SkippedRow>,
    /// Rows kept with an absent bank code.
    pub unresolved: Vec<UnresolvedBank>,
}

impl BuildResult {
    pub fn into_rows(self) -> Vec<OutputRow> {
        self.rows
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} rows, {} dropped, {} without bank code",
            self.rows.len(),
            self.skipped.len(),
            self.unresolved.len()
        )
    }
}

/// Turn line items into output rows.
///
/// The total row is never part of the output. A row missing its account
/// number, net value, or bank name is dropped; that is the only filter. Bank
/// names are looked up uppercased, and a miss leaves `bank_code` absent
/// without failing. Every row carries the same `remark`.
pub fn build_output(sheet: &InputSheet, remark: &str, bank_codes: &BankCodeTable) -> BuildResult {
    let mut result = BuildResult::default();

    for row in &sheet.rows {
        let Some(item) = row.complete() else {
            result.skipped.push(SkippedRow {
                line: row.line,
                missing_fields: row.missing_fields(),
            });
            continue;
        };

        let bank_code = bank_codes.lookup(&item.bank_name).map(str::to_string);
        if bank_code.is_none() {
            result.unresolved.push(UnresolvedBank {
                line: row.line,
                bank_name: item.bank_name.clone(),
            });
        }

        result.rows.push(OutputRow {
            account_number: item.account_number,
            remarks: remark.to_string(),
            tra_amt: item.net_value,
            bank_code,
            bank_name: item.bank_name,
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SheetRow;
    use rust_decimal::Decimal;

    fn row(line: usize, account: Option<&str>, value: Option<i64>, bank: Option<&str>) -> SheetRow {
        SheetRow {
            line,
            account_number: account.map(str::to_string),
            net_value: value.map(Decimal::from),
            bank_name: bank.map(str::to_string),
        }
    }

    fn total(line: usize, value: i64) -> SheetRow {
        row(line, None, Some(value), None)
    }

    #[test]
    fn test_total_row_removed() {
        let sheet = InputSheet {
            rows: vec![
                row(2, Some("1234567890"), Some(1000), Some("ZENITH BANK")),
                row(3, Some("0987654321"), Some(2000), Some("UBA")),
            ],
            total_row: total(4, 3000),
        };

        let result = build_output(&sheet, "March payroll", &BankCodeTable::builtin());
        assert_eq!(result.rows.len(), sheet.len() - 1);
        assert!(result.skipped.is_empty());
        assert!(result.unresolved.is_empty());

        assert_eq!(result.rows[0].account_number, "1234567890");
        assert_eq!(result.rows[0].bank_code.as_deref(), Some("000015"));
        assert_eq!(result.rows[1].bank_code.as_deref(), Some("000004"));
        assert!(result.rows.iter().all(|r| r.remarks == "March payroll"));
    }

    #[test]
    fn test_incomplete_rows_dropped_in_order() {
        let sheet = InputSheet {
            rows: vec![
                row(2, Some("1"), Some(10), Some("UBA")),
                row(3, None, Some(20), Some("UBA")),
                row(4, Some("3"), None, Some("UBA")),
                row(5, Some("4"), Some(40), None),
                row(6, Some("5"), Some(50), Some("WEMA BANK")),
            ],
            total_row: total(7, 120),
        };

        let result = build_output(&sheet, "", &BankCodeTable::builtin());
        let accounts: Vec<&str> = result.rows.iter().map(|r| r.account_number.as_str()).collect();
        assert_eq!(accounts, vec!["1", "5"]);
        assert!(result.rows.len() < sheet.len() - 1);

        let skipped_lines: Vec<usize> = result.skipped.iter().map(|s| s.line).collect();
        assert_eq!(skipped_lines, vec![3, 4, 5]);
        assert_eq!(result.skipped[1].missing_fields, vec!["Net Value"]);
    }

    #[test]
    fn test_bank_lookup_uppercases() {
        let sheet = InputSheet {
            rows: vec![
                row(2, Some("1"), Some(1), Some("Eco Bank")),
                row(3, Some("2"), Some(1), Some("ecobank")),
            ],
            total_row: total(4, 2),
        };

        let result = build_output(&sheet, "x", &BankCodeTable::builtin());
        assert_eq!(result.rows[0].bank_code.as_deref(), Some("000010"));
        assert_eq!(result.rows[1].bank_code.as_deref(), Some("000010"));
        // Original spelling is kept for the preview.
        assert_eq!(result.rows[0].bank_name, "Eco Bank");
    }

    #[test]
    fn test_unresolved_bank_passes_through() {
        let sheet = InputSheet {
            rows: vec![row(2, Some("1"), Some(5), Some("Moon Bank"))],
            total_row: total(3, 5),
        };

        let result = build_output(&sheet, "x", &BankCodeTable::builtin());
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].bank_code, None);
        assert_eq!(result.unresolved[0].bank_name, "Moon Bank");
        assert_eq!(result.unresolved[0].line, 2);
    }

    #[test]
    fn test_substitute_table() {
        let table = BankCodeTable::from_entries([("MOON BANK", "000777")]).unwrap();
        let sheet = InputSheet {
            rows: vec![
                row(2, Some("1"), Some(5), Some("Moon Bank")),
                row(3, Some("2"), Some(5), Some("UBA")),
            ],
            total_row: total(4, 10),
        };

        let result = build_output(&sheet, "", &table);
        assert_eq!(result.rows[0].bank_code.as_deref(), Some("000777"));
        assert_eq!(result.rows[1].bank_code, None);
    }

    #[test]
    fn test_everything_dropped_is_valid() {
        let sheet = InputSheet {
            rows: vec![row(2, None, None, None)],
            total_row: total(3, 0),
        };

        let result = build_output(&sheet, "", &BankCodeTable::builtin());
        assert!(result.rows.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.summary(), "0 rows, 1 dropped, 0 without bank code");
    }
}
