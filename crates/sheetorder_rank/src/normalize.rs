//! Category label normalization against the alias table.

use std::collections::BTreeMap;

use polars::prelude::{Column, DataFrame};
use sheetorder_io_xlsx::{EnumCellValue, derive_text_from_cell_value};

use crate::spec::{SheetOrderError, SpecOrderRules};
use crate::util::collect_column_values;

/// Trim `raw` and replace it by its canonical label when it is a known alias.
///
/// Single exact-match lookup; an alias pointing to another alias is not
/// followed.
pub fn normalize_category_value(raw: &str, aliases: &BTreeMap<String, String>) -> String {
    let c_trimmed = raw.trim();
    match aliases.get(c_trimmed) {
        Some(c_canonical) => c_canonical.clone(),
        None => c_trimmed.to_string(),
    }
}

/// Normalized labels of the category column, one per row (missing -> `""`).
pub fn derive_normalized_categories(
    df: &DataFrame,
    rules: &SpecOrderRules,
) -> Result<Vec<String>, SheetOrderError> {
    Ok(collect_column_values(df, &rules.column_category)?
        .iter()
        .map(|value| match value {
            EnumCellValue::None => String::new(),
            _ => normalize_category_value(&derive_text_from_cell_value(value), &rules.aliases),
        })
        .collect())
}

/// Return `df` with the category column replaced by its normalized labels.
///
/// Every other column is left untouched.
pub fn normalize_category_column(
    df: &DataFrame,
    rules: &SpecOrderRules,
) -> Result<DataFrame, SheetOrderError> {
    let l_labels = derive_normalized_categories(df, rules)?;

    let mut df_out = df.clone();
    df_out.with_column(Column::new(rules.column_category.as_str().into(), l_labels))?;
    Ok(df_out)
}
