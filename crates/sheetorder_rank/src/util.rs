//! DataFrame helpers shared by the classifier, normalizer and orderer.

use polars::prelude::{DataFrame, IdxCa, IdxSize, NewChunkedArray};
use sheetorder_io_xlsx::{EnumCellValue, derive_cell_value_from_any_value, derive_text_from_cell_value};

use crate::spec::SheetOrderError;

/// Column names in declaration order.
pub fn derive_column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

/// Collect all cells of column `name` as pipeline cell values.
pub fn collect_column_values(
    df: &DataFrame,
    name: &str,
) -> Result<Vec<EnumCellValue>, SheetOrderError> {
    let Ok(col) = df.column(name) else {
        return Err(SheetOrderError::MissingRequiredColumn {
            column: name.to_string(),
            found: derive_column_names(df),
        });
    };

    let mut l_values = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        l_values.push(derive_cell_value_from_any_value(col.get(n_idx_row)?));
    }
    Ok(l_values)
}

/// Return `df` with rows rearranged so output row `i` is input row `rows[i]`.
///
/// `rows` must be a permutation of `0..df.height()`.
pub fn reorder_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame, SheetOrderError> {
    debug_assert_eq!(rows.len(), df.height());

    let l_idx: Vec<IdxSize> = rows.iter().map(|n_idx| *n_idx as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), l_idx);
    Ok(df.take(&idx)?)
}

/// Render the first `n_rows` rows as strings (missing -> empty string).
pub fn preview_rows(df: &DataFrame, n_rows: usize) -> Result<Vec<Vec<String>>, SheetOrderError> {
    let n_height = usize::min(n_rows, df.height());
    let l_cols = df.get_columns();

    let mut l_grid = Vec::with_capacity(n_height);
    for n_idx_row in 0..n_height {
        let mut l_row = Vec::with_capacity(l_cols.len());
        for col in l_cols {
            l_row.push(derive_text_from_cell_value(
                &derive_cell_value_from_any_value(col.get(n_idx_row)?),
            ));
        }
        l_grid.push(l_row);
    }
    Ok(l_grid)
}

#[cfg(test)]
pub(crate) mod tests {
    use polars::prelude::Column;

    use super::*;

    /// Build a string-only frame from `(name, values)` pairs.
    pub(crate) fn build_string_df(cols: &[(&str, Vec<Option<&str>>)]) -> DataFrame {
        DataFrame::new(
            cols.iter()
                .map(|(c_name, l_values)| Column::new((*c_name).into(), l_values.clone()))
                .collect(),
        )
        .expect("df")
    }

    #[test]
    fn test_reorder_rows_applies_permutation() {
        let df = build_string_df(&[("k", vec![Some("a"), Some("b"), Some("c")])]);

        let df_out = reorder_rows(&df, &[2, 0, 1]).expect("reorder");
        assert_eq!(
            preview_rows(&df_out, 10).expect("preview"),
            vec![vec!["c"], vec!["a"], vec!["b"]]
        );
    }

    #[test]
    fn test_collect_column_values_reports_missing_column() {
        let df = build_string_df(&[("k", vec![Some("a")])]);

        let err = collect_column_values(&df, "学院").expect_err("missing");
        match err {
            SheetOrderError::MissingRequiredColumn { column, found } => {
                assert_eq!(column, "学院");
                assert_eq!(found, vec!["k".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_preview_rows_limits_and_blanks_missing() {
        let df = build_string_df(&[
            ("a", vec![Some("x"), None, Some("z")]),
            ("b", vec![None, Some("y"), None]),
        ]);

        assert_eq!(
            preview_rows(&df, 2).expect("preview"),
            vec![vec!["x", ""], vec!["", "y"]]
        );
    }
}
