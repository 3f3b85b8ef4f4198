//! Sum-and-compare validation of a schedule.

use rust_decimal::Decimal;

use crate::models::{InputSheet, SumCheck};

/// Sum every line item's `Net Value` and compare it with the total row.
///
/// The sum covers all rows except the total row, including rows that
/// [`build_output`](super::build_output) will later drop; absent values add
/// nothing. A sum beyond the `Decimal` range is clamped to its bounds.
/// It is rounded to a whole currency unit (half to even), and so is
/// the declared total before comparison. A mismatch is a warning for the
/// caller to report, never an error.
pub fn validate_and_sum(sheet: &InputSheet) -> SumCheck {
    let computed_sum = sheet
        .rows
        .iter()
        .filter_map(|row| row.net_value)
        .fold(Decimal::ZERO, |acc, value| acc.saturating_add(value))
        .round();

    let declared_total = sheet.declared_total();
    let matches = declared_total.is_some_and(|total| total.round() == computed_sum);

    SumCheck {
        computed_sum,
        declared_total,
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SheetRow;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn row(line: usize, value: Option<&str>) -> SheetRow {
        SheetRow {
            line,
            account_number: Some(format!("{line:010}")),
            net_value: value.map(dec),
            bank_name: Some("UBA".into()),
        }
    }

    fn sheet(values: &[Option<&str>], total: Option<&str>) -> InputSheet {
        InputSheet {
            rows: values.iter().enumerate().map(|(i, v)| row(i + 2, *v)).collect(),
            total_row: SheetRow {
                line: values.len() + 2,
                account_number: None,
                net_value: total.map(dec),
                bank_name: None,
            },
        }
    }

    #[test]
    fn test_matching_total() {
        let check = validate_and_sum(&sheet(&[Some("1000.0"), Some("2000.0")], Some("3000.0")));
        assert_eq!(check.computed_sum, dec("3000"));
        assert_eq!(check.declared_total, Some(dec("3000")));
        assert!(check.matches);
    }

    #[test]
    fn test_mismatched_total() {
        let check = validate_and_sum(&sheet(&[Some("1000"), Some("2000")], Some("2500")));
        assert_eq!(check.computed_sum, dec("3000"));
        assert!(!check.matches);
    }

    #[test]
    fn test_sum_is_rounded_before_compare() {
        let check = validate_and_sum(&sheet(&[Some("1000.30"), Some("1999.90")], Some("3000")));
        assert_eq!(check.computed_sum, dec("3000"));
        assert!(check.matches);

        // Declared total is rounded too.
        let check = validate_and_sum(&sheet(&[Some("10"), Some("20")], Some("30.4")));
        assert!(check.matches);
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        let check = validate_and_sum(&sheet(&[Some("0.5"), Some("2")], Some("2")));
        assert_eq!(check.computed_sum, dec("2"));
        assert!(check.matches);
    }

    #[test]
    fn test_overflowing_sum_does_not_panic() {
        let huge = "50000000000000000000000000000";
        let check = validate_and_sum(&sheet(&[Some(huge), Some(huge)], Some("1")));
        assert_eq!(check.computed_sum, Decimal::MAX);
        assert!(!check.matches);
    }

    #[test]
    fn test_absent_values_add_nothing() {
        let check = validate_and_sum(&sheet(&[Some("500"), None, Some("250")], Some("750")));
        assert!(check.matches);
    }

    #[test]
    fn test_absent_total_never_matches() {
        let check = validate_and_sum(&sheet(&[], None));
        assert_eq!(check.computed_sum, Decimal::ZERO);
        assert!(!check.matches);
    }

    #[test]
    fn test_any_sheet_with_exact_total_matches() {
        for values in [
            vec!["1", "2", "3"],
            vec!["199.99", "0.01"],
            vec!["-50", "150", "12345.678"],
            vec![],
        ] {
            let sum: Decimal = values.iter().map(|v| dec(v)).sum::<Decimal>().round();
            let rows: Vec<Option<&str>> = values.iter().map(|v| Some(*v)).collect();
            let total = sum.to_string();
            let check = validate_and_sum(&sheet(&rows, Some(&total)));
            assert!(check.matches, "{values:?}");
        }
    }
}
