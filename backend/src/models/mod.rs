//! Domain models for the disbursement pipeline.
//!
//! - [`SheetRow`] - one data row as read from the sheet, fields possibly absent
//! - [`DisbursementRow`] - a complete line item
//! - [`InputSheet`] - line items plus the trailing total row
//! - [`SumCheck`] - computed sum against the declared total
//! - [`OutputRow`] - one row of the bulk-upload file
//! - [`SkippedRow`], [`UnresolvedBank`] - diagnostics from building the output

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Input
// =============================================================================

/// A data row of the uploaded sheet.
///
/// `line` is the 1-based line in the source file, the header being line 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRow {
    pub line: usize,
    pub account_number: Option<String>,
    pub net_value: Option<Decimal>,
    pub bank_name: Option<String>,
}

impl SheetRow {
    /// Return the complete row, or `None` if any required field is absent.
    pub fn complete(&self) -> Option<DisbursementRow> {
        Some(DisbursementRow {
            account_number: self.account_number.clone()?,
            net_value: self.net_value?,
            bank_name: self.bank_name.clone()?,
        })
    }

    /// Names of the required columns this row has no value for.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.account_number.is_none() {
            missing.push(crate::transform::ACCOUNT_NUMBER.to_string());
        }
        if self.net_value.is_none() {
            missing.push(crate::transform::NET_VALUE.to_string());
        }
        if self.bank_name.is_none() {
            missing.push(crate::transform::BANK_NAME.to_string());
        }
        missing
    }
}

/// A line item with every required field present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisbursementRow {
    pub account_number: String,
    pub net_value: Decimal,
    pub bank_name: String,
}

/// An uploaded schedule: line items followed by one total row.
///
/// The total row is always the last row of the sheet; only its `net_value` is
/// meaningful.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSheet {
    pub rows: Vec<SheetRow>,
    pub total_row: SheetRow,
}

impl InputSheet {
    /// The grand total declared by the sheet itself.
    pub fn declared_total(&self) -> Option<Decimal> {
        self.total_row.net_value
    }

    /// Number of rows including the total row.
    pub fn len(&self) -> usize {
        self.rows.len() + 1
    }

    /// Always false: a sheet has at least its total row.
    pub fn is_empty(&self) -> bool {
        false
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Result of comparing the line-item sum with the declared total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SumCheck {
    /// Sum of line items, rounded to a whole currency unit.
    pub computed_sum: Decimal,
    /// Value of the total row, if any.
    pub declared_total: Option<Decimal>,
    /// `computed_sum == round(declared_total)`.
    pub matches: bool,
}

impl SumCheck {
    /// Message reported when the totals agree.
    pub fn success_message(&self, currency: &str) -> String {
        format!(
            "Total to be disbursed {}{}",
            currency,
            group_thousands(self.computed_sum)
        )
    }

    /// Message reported when the totals disagree, `None` when they match.
    pub fn warning_message(&self) -> Option<String> {
        if self.matches {
            return None;
        }
        Some(match self.declared_total {
            Some(total) => format!("Incorrect net value sum {}", group_thousands(total)),
            None => "Incorrect net value sum: the total row has no Net Value".to_string(),
        })
    }
}

/// Round to a whole number and insert `,` every three digits.
///
/// ```
/// use rust_decimal::Decimal;
/// use disburse::models::group_thousands;
///
/// assert_eq!(group_thousands(Decimal::new(123456789, 1)), "12,345,679");
/// ```
pub fn group_thousands(value: Decimal) -> String {
    let digits = value.round().abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if value.round().is_sign_negative() && !value.round().is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

// =============================================================================
// Output
// =============================================================================

/// One row of the bulk-upload file.
///
/// `bank_name` is kept for the confirmation preview and never encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRow {
    pub account_number: String,
    pub remarks: String,
    pub tra_amt: Decimal,
    pub bank_code: Option<String>,
    pub bank_name: String,
}

/// A row dropped because a required field was absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    pub line: usize,
    pub missing_fields: Vec<String>,
}

/// A row whose bank name has no sort code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedBank {
    pub line: usize,
    pub bank_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(dec("0")), "0");
        assert_eq!(group_thousands(dec("999")), "999");
        assert_eq!(group_thousands(dec("2500")), "2,500");
        assert_eq!(group_thousands(dec("1234567")), "1,234,567");
        assert_eq!(group_thousands(dec("-2500")), "-2,500");
        assert_eq!(group_thousands(dec("2500.4")), "2,500");
    }

    #[test]
    fn test_group_thousands_rounds_half_to_even() {
        assert_eq!(group_thousands(dec("2500.5")), "2,500");
        assert_eq!(group_thousands(dec("2501.5")), "2,502");
    }

    #[test]
    fn test_complete_row() {
        let row = SheetRow {
            line: 2,
            account_number: Some("0123456789".into()),
            net_value: Some(dec("10.5")),
            bank_name: Some("UBA".into()),
        };
        let complete = row.complete().unwrap();
        assert_eq!(complete.account_number, "0123456789");
        assert_eq!(complete.net_value, dec("10.5"));
        assert!(row.missing_fields().is_empty());
    }

    #[test]
    fn test_incomplete_row() {
        let row = SheetRow {
            line: 3,
            account_number: None,
            net_value: Some(dec("10")),
            bank_name: None,
        };
        assert!(row.complete().is_none());
        assert_eq!(row.missing_fields(), vec!["Account Number", "Bank Name"]);
    }

    #[test]
    fn test_sum_check_messages() {
        let ok = SumCheck {
            computed_sum: dec("3000"),
            declared_total: Some(dec("3000")),
            matches: true,
        };
        assert_eq!(ok.success_message("₦"), "Total to be disbursed ₦3,000");
        assert!(ok.warning_message().is_none());

        let bad = SumCheck {
            computed_sum: dec("3000"),
            declared_total: Some(dec("2500.0")),
            matches: false,
        };
        assert_eq!(
            bad.warning_message().as_deref(),
            Some("Incorrect net value sum 2,500")
        );
    }

    #[test]
    fn test_missing_declared_total_warns() {
        let check = SumCheck {
            computed_sum: dec("10"),
            declared_total: None,
            matches: false,
        };
        assert!(check.warning_message().unwrap().contains("no Net Value"));
    }
}
