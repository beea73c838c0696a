//! Terminal rendering of row previews and the run report.

use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use polars::prelude::DataFrame;
use sheetorder_rank::{EnumOrderMode, ReportOrder, derive_column_names, preview_rows};

/// First `n_rows` rows of `df` as a table; text columns get a cyan header.
pub fn build_preview_table(
    df: &DataFrame,
    n_rows: usize,
    cols_text: &[String],
) -> anyhow::Result<Table> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(derive_column_names(df).into_iter().map(|c_name| {
        let cell = Cell::new(&c_name).add_attribute(Attribute::Bold);
        if cols_text.contains(&c_name) {
            cell.fg(Color::Cyan)
        } else {
            cell
        }
    }));

    for l_row in preview_rows(df, n_rows)? {
        table.add_row(l_row);
    }
    Ok(table)
}

/// Two-column summary of an ordering report.
pub fn build_report_table(report: &ReportOrder) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    table.add_row(vec![Cell::new("Mode"), Cell::new(report.mode)]);
    table.add_row(vec![Cell::new("Sort column"), Cell::new(&report.column_sort)]);
    table.add_row(vec![Cell::new("Rows"), Cell::new(report.cnt_rows)]);

    match report.mode {
        EnumOrderMode::College => {
            for (c_label, n_rows) in &report.buckets {
                if *n_rows > 0 {
                    table.add_row(vec![Cell::new(format!("  {c_label}")), Cell::new(n_rows)]);
                }
            }
            table.add_row(vec![
                Cell::new("Overflow"),
                Cell::new(report.cnt_rows_overflow).fg(if report.cnt_rows_overflow == 0 {
                    Color::White
                } else {
                    Color::Yellow
                }),
            ]);
        }
        EnumOrderMode::Time => {
            table.add_row(vec![
                Cell::new("Parsed"),
                Cell::new(format!(
                    "{:.0}%",
                    report.ratio_time_parsed.unwrap_or(0.0) * 100.0
                )),
            ]);
            table.add_row(vec![
                Cell::new("Sorted by"),
                Cell::new(if report.if_time_parsed {
                    "parsed time"
                } else {
                    "raw values"
                }),
            ]);
        }
    }

    for c_warning in &report.warnings {
        table.add_row(vec![
            Cell::new("Warning").fg(Color::Yellow),
            Cell::new(c_warning),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use polars::prelude::Column;

    use super::*;

    #[test]
    fn test_preview_table_limits_rows() {
        let df = DataFrame::new(vec![
            Column::new("学号".into(), vec![Some(20240001.0), None, Some(20240003.0)]),
            Column::new("学院".into(), vec![Some("法学院"), Some("外院"), None]),
        ])
        .expect("df");

        let table = build_preview_table(&df, 2, &["学号".to_string()]).expect("table");
        let txt = table.to_string();

        assert_eq!(table.row_iter().count(), 2);
        assert!(txt.contains("20240001"));
        assert!(txt.contains("外院"));
        assert!(!txt.contains("20240003"));
    }

    #[test]
    fn test_report_table_lists_non_empty_buckets() {
        let report = ReportOrder {
            cnt_rows: 3,
            buckets: vec![("法学院".to_string(), 2), ("外国语学院".to_string(), 0)],
            cnt_rows_overflow: 1,
            ..ReportOrder::new(EnumOrderMode::College, "学院")
        };

        let txt = build_report_table(&report).to_string();
        assert!(txt.contains("法学院"));
        assert!(!txt.contains("外国语学院"));
        assert!(txt.contains("Overflow"));
    }
}
