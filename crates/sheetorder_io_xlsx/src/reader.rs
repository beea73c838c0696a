//! XLSX reader kernel that turns workbook bytes into a DataFrame.
//!
//! The first worksheet is read into a cell grid indexed from spreadsheet row 1.
//! Each header candidate row is tried in order; the first one whose trimmed
//! names contain the required column wins and every row above it is dropped.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use polars::prelude::{Column, DataFrame};
use tracing::{debug, info};

use crate::spec::{EnumCellValue, SpecXlsxLoadOptions, XlsxIoError};
use crate::util::{
    convert_excel_serial_to_text, derive_header_names, format_number_plain,
    validate_unique_columns,
};

/// Read the first worksheet of `v_bytes` into a DataFrame.
///
/// Numeric-only columns become `Float64`; all others become `String` with
/// numbers rendered in plain form.
pub fn load_dataframe_from_bytes(
    v_bytes: &[u8],
    options: &SpecXlsxLoadOptions,
) -> Result<DataFrame, XlsxIoError> {
    if options.rows_header_candidates.is_empty() {
        return Err(XlsxIoError::InvalidInput(
            "rows_header_candidates must not be empty.".to_string(),
        ));
    }

    let l_grid = read_first_sheet_grid(v_bytes)?;
    let (n_row_header, l_colnames) = detect_header_row(&l_grid, options)?;
    debug!(
        row_header = n_row_header + 1,
        cols = l_colnames.len(),
        "header row accepted"
    );

    let mut l_rows_body: Vec<&[EnumCellValue]> = l_grid
        .iter()
        .skip(n_row_header + 1)
        .map(Vec::as_slice)
        .collect();
    if options.if_drop_empty_rows {
        l_rows_body.retain(|row| row.iter().any(|cell| !matches!(cell, EnumCellValue::None)));
    }

    let df = build_dataframe(&l_colnames, &l_rows_body)?;
    info!(
        rows = df.height(),
        cols = df.width(),
        "worksheet loaded"
    );
    Ok(df)
}

/// Return the first header candidate containing the required column.
///
/// On failure the error lists the columns of the last attempted candidate.
pub fn detect_header_row(
    grid: &[Vec<EnumCellValue>],
    options: &SpecXlsxLoadOptions,
) -> Result<(usize, Vec<String>), XlsxIoError> {
    let mut l_colnames_last = Vec::new();
    let mut if_any_attempted = false;

    for &n_row_candidate in &options.rows_header_candidates {
        let Some(l_cells) = grid.get(n_row_candidate) else {
            continue;
        };
        if_any_attempted = true;

        let l_colnames = derive_header_names(l_cells);
        if l_colnames.iter().any(|c_name| *c_name == options.column_required) {
            return Ok((n_row_candidate, l_colnames));
        }
        debug!(
            row_header = n_row_candidate + 1,
            column = %options.column_required,
            "required column absent, trying next header candidate"
        );
        l_colnames_last = l_colnames;
    }

    if !if_any_attempted {
        return Err(XlsxIoError::EmptyWorkbook);
    }
    Err(XlsxIoError::MissingRequiredColumn {
        column: options.column_required.clone(),
        found: l_colnames_last,
    })
}

fn read_first_sheet_grid(v_bytes: &[u8]) -> Result<Vec<Vec<EnumCellValue>>, XlsxIoError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(v_bytes.to_vec()))
        .map_err(|err| XlsxIoError::Read(err.to_string()))?;

    let Some(c_sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(XlsxIoError::EmptyWorkbook);
    };
    let range = workbook
        .worksheet_range(&c_sheet_name)
        .map_err(|err| XlsxIoError::Read(err.to_string()))?;

    // `Range` starts at the first used cell; pad so index 0 is spreadsheet row 1.
    let n_row_offset = range.start().map_or(0, |(n_row, _)| n_row as usize);
    let n_width = range.width();

    let mut l_grid: Vec<Vec<EnumCellValue>> = (0..n_row_offset)
        .map(|_| vec![EnumCellValue::None; n_width])
        .collect();
    for row in range.rows() {
        l_grid.push(row.iter().map(derive_cell_value_from_data).collect());
    }

    debug!(
        sheet = %c_sheet_name,
        rows = l_grid.len(),
        cols = n_width,
        "worksheet grid read"
    );
    Ok(l_grid)
}

fn derive_cell_value_from_data(data: &Data) -> EnumCellValue {
    match data {
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::String(val) => {
            if val.is_empty() {
                EnumCellValue::None
            } else {
                EnumCellValue::String(val.clone())
            }
        }
        Data::Bool(val) => EnumCellValue::String(if *val { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(val) if val.is_duration() => EnumCellValue::Number(val.as_f64()),
        Data::DateTime(val) => match convert_excel_serial_to_text(val.as_f64()) {
            Some(c_text) => EnumCellValue::String(c_text),
            None => EnumCellValue::Number(val.as_f64()),
        },
        Data::DateTimeIso(val) => EnumCellValue::String(val.clone()),
        Data::DurationIso(val) => EnumCellValue::String(val.clone()),
        Data::Error(err) => EnumCellValue::String(err.to_string()),
        _ => EnumCellValue::None,
    }
}

fn build_dataframe(
    colnames: &[String],
    rows_body: &[&[EnumCellValue]],
) -> Result<DataFrame, XlsxIoError> {
    validate_unique_columns(colnames).map_err(XlsxIoError::InvalidInput)?;

    let mut l_columns = Vec::with_capacity(colnames.len());
    for (n_idx_col, c_name) in colnames.iter().enumerate() {
        let l_values: Vec<&EnumCellValue> = rows_body
            .iter()
            .map(|row| row.get(n_idx_col).unwrap_or(&EnumCellValue::None))
            .collect();

        let if_has_value = l_values.iter().any(|v| !matches!(v, EnumCellValue::None));
        let if_all_numeric = l_values
            .iter()
            .all(|v| matches!(v, EnumCellValue::Number(_) | EnumCellValue::None));

        let column = if if_has_value && if_all_numeric {
            let l_numbers: Vec<Option<f64>> = l_values
                .iter()
                .map(|v| match v {
                    EnumCellValue::Number(n) => Some(*n),
                    _ => None,
                })
                .collect();
            Column::new(c_name.as_str().into(), l_numbers)
        } else {
            let l_texts: Vec<Option<String>> = l_values
                .iter()
                .map(|v| match v {
                    EnumCellValue::None => None,
                    EnumCellValue::String(s) => Some(s.clone()),
                    EnumCellValue::Number(n) => Some(format_number_plain(*n)),
                })
                .collect();
            Column::new(c_name.as_str().into(), l_texts)
        };
        l_columns.push(column);
    }

    Ok(DataFrame::new(l_columns)?)
}

#[cfg(test)]
mod tests {
    use polars::prelude::DataType;
    use rust_xlsxwriter::{Format, Workbook};

    use super::*;
    use crate::util::derive_cell_value_from_any_value;

    fn build_workbook_bytes(rows: &[Vec<EnumCellValue>]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (n_row, row) in rows.iter().enumerate() {
            for (n_col, cell) in row.iter().enumerate() {
                match cell {
                    EnumCellValue::None => {}
                    EnumCellValue::String(s) => {
                        worksheet
                            .write_string(n_row as u32, n_col as u16, s)
                            .expect("write string");
                    }
                    EnumCellValue::Number(n) => {
                        worksheet
                            .write_number(n_row as u32, n_col as u16, *n)
                            .expect("write number");
                    }
                }
            }
        }
        workbook.save_to_buffer().expect("save workbook")
    }

    fn s(val: &str) -> EnumCellValue {
        EnumCellValue::String(val.to_string())
    }

    fn n(val: f64) -> EnumCellValue {
        EnumCellValue::Number(val)
    }

    #[test]
    fn test_load_uses_first_row_header_when_required_column_present() {
        let v_bytes = build_workbook_bytes(&[
            vec![s(" 学院 "), s("姓名"), s("学号")],
            vec![s("法学院"), s("张三"), n(2021001001.0)],
            vec![s("经管学院"), s("李四"), n(2021001002.0)],
        ]);

        let df = load_dataframe_from_bytes(&v_bytes, &SpecXlsxLoadOptions::default())
            .expect("load");

        assert_eq!(df.get_column_names_str(), vec!["学院", "姓名", "学号"]);
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("学号").expect("col").dtype(), &DataType::Float64);
        assert_eq!(df.column("学院").expect("col").dtype(), &DataType::String);
    }

    #[test]
    fn test_load_falls_back_to_second_row_header_after_banner() {
        let v_bytes = build_workbook_bytes(&[
            vec![s("2024 年度活动报名表")],
            vec![s("序号"), s("学院 "), s("备注")],
            vec![n(1.0), s("法学院"), s("无")],
        ]);

        let df = load_dataframe_from_bytes(&v_bytes, &SpecXlsxLoadOptions::default())
            .expect("load");

        assert_eq!(df.get_column_names_str(), vec!["序号", "学院", "备注"]);
        assert_eq!(df.height(), 1);
        let value = derive_cell_value_from_any_value(
            df.column("学院").expect("col").get(0).expect("cell"),
        );
        assert_eq!(value, s("法学院"));
    }

    #[test]
    fn test_load_reports_missing_required_column_with_found_list() {
        let v_bytes = build_workbook_bytes(&[
            vec![s("标题")],
            vec![s("姓名"), s("部门")],
            vec![s("张三"), s("教务处")],
        ]);

        let err = load_dataframe_from_bytes(&v_bytes, &SpecXlsxLoadOptions::default())
            .expect_err("missing column");

        match err {
            XlsxIoError::MissingRequiredColumn { column, found } => {
                assert_eq!(column, "学院");
                assert_eq!(found, vec!["姓名".to_string(), "部门".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_mixed_column_renders_numbers_plain_and_drops_blank_rows() {
        let v_bytes = build_workbook_bytes(&[
            vec![s("学院"), s("电话")],
            vec![s("法学院"), n(13800138000.0)],
            vec![EnumCellValue::None, EnumCellValue::None],
            vec![s("外院"), s("未填写")],
        ]);

        let df = load_dataframe_from_bytes(&v_bytes, &SpecXlsxLoadOptions::default())
            .expect("load");

        assert_eq!(df.height(), 2);
        let col = df.column("电话").expect("col");
        assert_eq!(col.dtype(), &DataType::String);
        assert_eq!(
            derive_cell_value_from_any_value(col.get(0).expect("cell")),
            s("13800138000")
        );
    }

    #[test]
    fn test_load_rejects_non_workbook_bytes() {
        let err = load_dataframe_from_bytes(b"not a workbook", &SpecXlsxLoadOptions::default())
            .expect_err("garbage input");

        assert!(matches!(err, XlsxIoError::Read(_)));
    }

    #[test]
    fn test_detect_header_row_on_empty_grid_is_empty_workbook() {
        let err = detect_header_row(&[], &SpecXlsxLoadOptions::default()).expect_err("empty");

        assert!(matches!(err, XlsxIoError::EmptyWorkbook));
    }

    fn build_formatted_workbook_bytes(
        c_header: &str,
        l_values: &[f64],
        c_num_format: &str,
    ) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let format = Format::new().set_num_format(c_num_format);
        worksheet.write_string(0, 0, "学院").expect("header");
        worksheet.write_string(0, 1, c_header).expect("header");
        for (n_idx, val) in l_values.iter().enumerate() {
            let n_row = n_idx as u32 + 1;
            worksheet.write_string(n_row, 0, "法学院").expect("college");
            worksheet
                .write_number_with_format(n_row, 1, *val, &format)
                .expect("formatted number");
        }
        workbook.save_to_buffer().expect("save workbook")
    }

    #[test]
    fn test_load_renders_date_cells_as_text() {
        let v_bytes = build_formatted_workbook_bytes("日期", &[45292.0, 45292.5], "yyyy-mm-dd");

        let df = load_dataframe_from_bytes(&v_bytes, &SpecXlsxLoadOptions::default())
            .expect("load");

        let col = df.column("日期").expect("col");
        assert_eq!(col.dtype(), &DataType::String);
        assert_eq!(
            derive_cell_value_from_any_value(col.get(0).expect("cell")),
            s("2024-01-01")
        );
        assert_eq!(
            derive_cell_value_from_any_value(col.get(1).expect("cell")),
            s("2024-01-01 12:00:00")
        );
    }

    #[test]
    fn test_load_keeps_out_of_range_date_cell_as_number() {
        let v_bytes = build_formatted_workbook_bytes("日期", &[-1e300], "yyyy-mm-dd");

        let df = load_dataframe_from_bytes(&v_bytes, &SpecXlsxLoadOptions::default())
            .expect("load");

        let col = df.column("日期").expect("col");
        assert_eq!(col.dtype(), &DataType::Float64);
        assert_eq!(
            derive_cell_value_from_any_value(col.get(0).expect("cell")),
            n(-1e300)
        );
    }

    #[test]
    fn test_load_keeps_duration_cells_as_numbers() {
        let v_bytes = build_formatted_workbook_bytes("时长", &[1.5, 0.25], "[h]:mm");

        let df = load_dataframe_from_bytes(&v_bytes, &SpecXlsxLoadOptions::default())
            .expect("load");

        let col = df.column("时长").expect("col");
        assert_eq!(col.dtype(), &DataType::Float64);
        assert_eq!(
            derive_cell_value_from_any_value(col.get(0).expect("cell")),
            n(1.5)
        );
        assert_eq!(
            derive_cell_value_from_any_value(col.get(1).expect("cell")),
            n(0.25)
        );
    }
}
