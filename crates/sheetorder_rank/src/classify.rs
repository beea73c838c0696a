//! Identifier-like column detection for text export.

use polars::prelude::DataFrame;
use sheetorder_io_xlsx::{EnumCellValue, derive_text_from_cell_value};
use tracing::debug;

use crate::spec::{SheetOrderError, SpecClassifyPolicy};
use crate::util::{collect_column_values, derive_column_names};

/// Return the columns whose values must be exported as literal text.
///
/// Name rule first; the value rule runs only when the name does not match.
pub fn classify_text_columns(
    df: &DataFrame,
    policy: &SpecClassifyPolicy,
) -> Result<Vec<String>, SheetOrderError> {
    let mut l_cols_text = Vec::new();

    for c_name in derive_column_names(df) {
        if is_text_column_by_name(&c_name, policy) {
            debug!(column = %c_name, rule = "name", "text column");
            l_cols_text.push(c_name);
            continue;
        }

        let l_values = collect_column_values(df, &c_name)?;
        if is_text_column_by_values(&l_values, policy) {
            debug!(column = %c_name, rule = "value", "text column");
            l_cols_text.push(c_name);
        }
    }

    Ok(l_cols_text)
}

/// Lower-cased column name contains any identifier keyword.
pub fn is_text_column_by_name(name: &str, policy: &SpecClassifyPolicy) -> bool {
    let c_name_lower = name.to_lowercase();
    policy
        .keywords
        .iter()
        .any(|c_keyword| c_name_lower.contains(&c_keyword.to_lowercase()))
}

/// Any of the first `n_samples` non-missing values is a long digit run once
/// `.` and `-` are stripped.
pub fn is_text_column_by_values(values: &[EnumCellValue], policy: &SpecClassifyPolicy) -> bool {
    values
        .iter()
        .filter(|value| !matches!(value, EnumCellValue::None))
        .take(policy.n_samples)
        .any(|value| {
            let c_digits: String = derive_text_from_cell_value(value)
                .trim()
                .chars()
                .filter(|chr| *chr != '.' && *chr != '-')
                .collect();
            c_digits.len() >= policy.n_len_digits_min
                && c_digits.chars().all(|chr| chr.is_ascii_digit())
        })
}
