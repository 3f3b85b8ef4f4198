//! Column resolution: raw table to [`InputSheet`].
//!
//! This is the only place that knows the schedule's header labels. A missing
//! label stops the upload before any totals or output are computed.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{TransformError, TransformResult};
use crate::models::{InputSheet, SheetRow};
use crate::parser::{RawRow, RawTable};

pub const ACCOUNT_NUMBER: &str = "Account Number";
pub const NET_VALUE: &str = "Net Value";
pub const BANK_NAME: &str = "Bank Name";

/// Required headers, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 3] = [ACCOUNT_NUMBER, NET_VALUE, BANK_NAME];

/// Positions of the required columns in a table.
#[derive(Debug, Clone, Copy)]
struct Columns {
    account_number: usize,
    net_value: usize,
    bank_name: usize,
}

impl Columns {
    fn resolve(table: &RawTable) -> TransformResult<Self> {
        let find = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| TransformError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            account_number: find(ACCOUNT_NUMBER)?,
            net_value: find(NET_VALUE)?,
            bank_name: find(BANK_NAME)?,
        })
    }

    fn read(&self, row: &RawRow) -> TransformResult<SheetRow> {
        let net_value = match RawTable::cell(row, self.net_value) {
            Some(raw) => Some(parse_amount(raw).ok_or_else(|| TransformError::InvalidAmount {
                line: row.line,
                value: raw.to_string(),
            })?),
            None => None,
        };

        Ok(SheetRow {
            line: row.line,
            account_number: RawTable::cell(row, self.account_number).map(str::to_string),
            net_value,
            bank_name: RawTable::cell(row, self.bank_name).map(str::to_string),
        })
    }
}

impl InputSheet {
    /// Resolve the required columns and split off the trailing total row.
    ///
    /// Fails with [`TransformError::MissingColumn`] naming the first absent
    /// header, [`TransformError::InvalidAmount`] for a non-numeric `Net Value`,
    /// [`TransformError::MissingTotalRow`] when the table has no rows, or
    /// [`TransformError::AmountOverflow`] when the line items cannot be summed.
    pub fn from_table(table: &RawTable) -> TransformResult<Self> {
        let columns = Columns::resolve(table)?;

        let mut rows = table
            .rows
            .iter()
            .map(|row| columns.read(row))
            .collect::<TransformResult<Vec<_>>>()?;

        let total_row = rows.pop().ok_or(TransformError::MissingTotalRow)?;
        check_line_total(&rows)?;

        Ok(InputSheet { rows, total_row })
    }
}

/// The line items must add up without leaving the `Decimal` range.
fn check_line_total(rows: &[SheetRow]) -> TransformResult<()> {
    rows.iter()
        .filter_map(|row| row.net_value.map(|value| (row.line, value)))
        .try_fold(Decimal::ZERO, |acc, (line, value)| {
            acc.checked_add(value)
                .ok_or(TransformError::AmountOverflow { line })
        })
        .map(|_| ())
}

/// Parse a monetary cell.
///
/// `,` is accepted only as a thousands separator (`1,500.50`, `12,345,678`);
/// a decimal comma such as `1000,50` is rejected rather than guessed at.
/// Scientific notation is accepted.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let cleaned = if raw.contains(',') {
        strip_thousands(raw)?
    } else {
        raw.to_string()
    };

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Remove well-formed thousands separators: a leading group of 1-3 digits,
/// then groups of exactly three, then an optional `.fraction`.
fn strip_thousands(raw: &str) -> Option<String> {
    let (sign, body) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    let (integer, fraction) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    let mut groups = integer.split(',');
    let first = groups.next()?;
    if !all_digits(first) || first.len() > 3 {
        return None;
    }

    let mut cleaned = format!("{sign}{first}");
    for group in groups {
        if group.len() != 3 || !all_digits(group) {
            return None;
        }
        cleaned.push_str(group);
    }

    if let Some(fraction) = fraction {
        if !all_digits(fraction) {
            return None;
        }
        cleaned.push('.');
        cleaned.push_str(fraction);
    }

    Some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv_str;

    fn table(csv: &str) -> RawTable {
        parse_csv_str(csv, ',').unwrap()
    }

    #[test]
    fn test_from_table() {
        let sheet = InputSheet::from_table(&table(
            "BVN,Account Number,Net Value,Bank Name\n\
             111,1234567890,1000,ZENITH BANK\n\
             222,0987654321,2000,UBA\n\
             ,,3000,\n",
        ))
        .unwrap();

        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.rows[1].account_number.as_deref(), Some("0987654321"));
        assert_eq!(sheet.rows[0].net_value, Some(Decimal::from(1000)));
        assert_eq!(sheet.declared_total(), Some(Decimal::from(3000)));
        assert_eq!(sheet.total_row.line, 4);
    }

    #[test]
    fn test_each_missing_column_is_named() {
        let cases = [
            ("Net Value,Bank Name\n1,UBA", ACCOUNT_NUMBER),
            ("Account Number,Bank Name\n1,UBA", NET_VALUE),
            ("Account Number,Net Value\n1,2", BANK_NAME),
        ];

        for (csv, missing) in cases {
            match InputSheet::from_table(&table(csv)) {
                Err(TransformError::MissingColumn(name)) => assert_eq!(name, missing),
                other => panic!("expected missing {missing}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let err = InputSheet::from_table(&table("account number,Net Value,Bank Name\n1,2,UBA"))
            .unwrap_err();
        assert!(matches!(err, TransformError::MissingColumn(ref c) if c == ACCOUNT_NUMBER));
    }

    #[test]
    fn test_invalid_amount() {
        let err = InputSheet::from_table(&table(
            "Account Number,Net Value,Bank Name\n1,ten,UBA\n,10,",
        ))
        .unwrap_err();
        match err {
            TransformError::InvalidAmount { line, value } => {
                assert_eq!(line, 2);
                assert_eq!(value, "ten");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_headers_only() {
        let err = InputSheet::from_table(&table("Account Number,Net Value,Bank Name\n"))
            .unwrap_err();
        assert!(matches!(err, TransformError::MissingTotalRow));
    }

    #[test]
    fn test_single_row_is_the_total() {
        let sheet =
            InputSheet::from_table(&table("Account Number,Net Value,Bank Name\n,0,")).unwrap();
        assert!(sheet.rows.is_empty());
        assert_eq!(sheet.declared_total(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1000"), Some(Decimal::from(1000)));
        assert_eq!(parse_amount("1,500.50"), Some(Decimal::new(150050, 2)));
        assert_eq!(parse_amount(" -20 "), Some(Decimal::from(-20)));
        assert_eq!(parse_amount("1e3"), Some(Decimal::from(1000)));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_parse_amount_thousands_separators() {
        assert_eq!(parse_amount("12,345,678"), Some(Decimal::from(12_345_678)));
        assert_eq!(parse_amount("-1,000"), Some(Decimal::from(-1000)));
        assert_eq!(parse_amount("999,999.5"), Some(Decimal::new(9999995, 1)));
    }

    #[test]
    fn test_parse_amount_rejects_decimal_comma() {
        assert_eq!(parse_amount("1000,50"), None);
        assert_eq!(parse_amount("1,5"), None);
        assert_eq!(parse_amount("1,50.0"), None);
        assert_eq!(parse_amount(",500"), None);
        assert_eq!(parse_amount("1,000."), None);
        assert_eq!(parse_amount("1,000,"), None);
    }

    #[test]
    fn test_decimal_comma_schedule_is_rejected() {
        let table = parse_csv_str(
            "Account Number;Net Value;Bank Name\n0123;1000,50;UBA\n;100050;\n",
            ';',
        )
        .unwrap();

        match InputSheet::from_table(&table) {
            Err(TransformError::InvalidAmount { line, value }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "1000,50");
            }
            other => panic!("expected invalid amount, got {other:?}"),
        }
    }

    #[test]
    fn test_line_item_overflow() {
        let err = InputSheet::from_table(&table(
            "Account Number,Net Value,Bank Name\n\
             1,50000000000000000000000000000,UBA\n\
             2,50000000000000000000000000000,UBA\n\
             ,1,\n",
        ))
        .unwrap_err();
        assert!(matches!(err, TransformError::AmountOverflow { line: 3 }));
    }

    #[test]
    fn test_padded_header_is_not_a_match() {
        let err = InputSheet::from_table(&table(" Account Number,Net Value,Bank Name\n1,2,UBA"))
            .unwrap_err();
        assert!(matches!(err, TransformError::MissingColumn(ref c) if c == ACCOUNT_NUMBER));
    }
}
