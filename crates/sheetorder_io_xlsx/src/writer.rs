//! XLSX writer kernel that renders an ordered DataFrame into workbook bytes.

use std::collections::BTreeSet;

use polars::prelude::DataFrame;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::{debug, info};

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecXlsxExportOptions, SpecXlsxReport, XlsxIoError,
};
use crate::util::{
    convert_cell_value, derive_cell_value_from_any_value, estimate_unicode_string_width,
    estimate_width_len, sanitize_sheet_name, select_sorted_indices_from_names,
    validate_unique_columns,
};

/// Stateful in-memory workbook writer.
pub struct XlsxWriter {
    workbook: Workbook,
    options: SpecXlsxExportOptions,
    l_reports: Vec<SpecXlsxReport>,
}

impl XlsxWriter {
    /// Create writer with export options; nothing is serialized until
    /// [`Self::finish`].
    pub fn new(options: SpecXlsxExportOptions) -> Self {
        Self {
            workbook: Workbook::new(),
            options,
            l_reports: Vec::new(),
        }
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Serialize the workbook into `.xlsx` bytes.
    pub fn finish(mut self) -> Result<Vec<u8>, XlsxIoError> {
        let v_bytes = self
            .workbook
            .save_to_buffer()
            .map_err(derive_xlsx_error)?;
        info!(bytes = v_bytes.len(), "workbook serialized");
        Ok(v_bytes)
    }

    /// Write one sheet: bold centered header, centered body, `cols_text`
    /// written as literal text.
    ///
    /// Cells are written as strings or numbers only. Dates loaded from Excel
    /// date cells arrive as `YYYY-MM-DD` text and are written back as text,
    /// not as Excel datetime cells.
    pub fn write_sheet(
        &mut self,
        df_data: &DataFrame,
        cols_text: &[String],
    ) -> Result<SpecXlsxReport, XlsxIoError> {
        validate_policy_autofit(&self.options.policy_autofit)?;

        let l_colnames_df: Vec<String> = df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        validate_unique_columns(&l_colnames_df).map_err(XlsxIoError::InvalidInput)?;

        let n_width_df = l_colnames_df.len();
        let n_height_df = df_data.height();
        if n_width_df > N_NCOLS_EXCEL_MAX || n_height_df + 1 > N_NROWS_EXCEL_MAX {
            return Err(XlsxIoError::InvalidInput(format!(
                "Table of {n_height_df} rows x {n_width_df} columns exceeds Excel sheet limits."
            )));
        }

        let l_cols_idx_text = select_sorted_indices_from_names(&l_colnames_df, cols_text)
            .map_err(XlsxIoError::InvalidInput)?;
        let set_cols_idx_text: BTreeSet<usize> = l_cols_idx_text.iter().copied().collect();

        let fmt_header = derive_rust_xlsx_format(&self.options.fmt_header);
        let fmt_body = derive_rust_xlsx_format(&self.options.fmt_body);
        let fmt_text = derive_rust_xlsx_format(&self.options.fmt_text);
        let value_policy = self.options.value_policy.clone();
        let policy_autofit = self.options.policy_autofit.clone();

        let c_sheet_name = sanitize_sheet_name(&self.options.sheet_name, "_");
        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&c_sheet_name)
            .map_err(derive_xlsx_error)?;

        let mut l_width_by_col_header = vec![0usize; n_width_df];
        let mut l_width_by_col_body = vec![0usize; n_width_df];

        for (n_idx_col, c_name) in l_colnames_df.iter().enumerate() {
            l_width_by_col_header[n_idx_col] = estimate_unicode_string_width(c_name);
        }
        write_header(worksheet, &l_colnames_df, &fmt_header)?;

        let l_cols = df_data.get_columns();
        for n_idx_row in 0..n_height_df {
            for (n_idx_col, col) in l_cols.iter().enumerate() {
                let if_is_text_col = set_cols_idx_text.contains(&n_idx_col);

                let value_raw = derive_cell_value_from_any_value(
                    col.get(n_idx_row)
                        .map_err(|err| {
                            XlsxIoError::InvalidInput(format!("Failed to access cell value: {err}"))
                        })?,
                );
                let value = convert_cell_value(&value_raw, if_is_text_col, &value_policy);

                l_width_by_col_body[n_idx_col] =
                    usize::max(l_width_by_col_body[n_idx_col], estimate_width_len(&value));

                write_cell_with_format(
                    worksheet,
                    n_idx_row + 1,
                    n_idx_col,
                    &value,
                    if if_is_text_col { &fmt_text } else { &fmt_body },
                )?;
            }
        }

        if !matches!(policy_autofit.rule_columns, EnumAutofitColumnsRule::None) {
            let n_min = usize::max(1, policy_autofit.width_cell_min);
            let n_max = usize::min(255, usize::max(n_min, policy_autofit.width_cell_max));
            let n_pad = policy_autofit.width_cell_padding;

            for n_idx_col in 0..n_width_df {
                let n_width_recorded = match policy_autofit.rule_columns {
                    EnumAutofitColumnsRule::Header => l_width_by_col_header[n_idx_col],
                    EnumAutofitColumnsRule::Body => l_width_by_col_body[n_idx_col],
                    EnumAutofitColumnsRule::All | EnumAutofitColumnsRule::None => usize::max(
                        l_width_by_col_header[n_idx_col],
                        l_width_by_col_body[n_idx_col],
                    ),
                };
                let n_width_final = usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad));
                worksheet
                    .set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)
                    .map_err(derive_xlsx_error)?;
            }
        }

        let cols_text_written: Vec<String> = l_cols_idx_text
            .iter()
            .map(|n_idx| l_colnames_df[*n_idx].clone())
            .collect();
        debug!(
            sheet = %c_sheet_name,
            rows = n_height_df,
            cols = n_width_df,
            cols_text = ?cols_text_written,
            "sheet written"
        );

        let mut report = SpecXlsxReport {
            sheet_name: c_sheet_name.clone(),
            n_rows: n_height_df,
            n_cols: n_width_df,
            cols_text: cols_text_written,
            warnings: vec![],
        };
        if c_sheet_name != self.options.sheet_name {
            report.warn(format!(
                "Sheet name {:?} sanitized to {c_sheet_name:?}.",
                self.options.sheet_name
            ));
        }
        self.l_reports.push(report.clone());
        Ok(report)
    }
}

/// Render `df_data` as a single-sheet workbook and return its bytes.
///
/// Date values are exported as text; see [`XlsxWriter::write_sheet`].
pub fn write_dataframe_to_bytes(
    df_data: &DataFrame,
    cols_text: &[String],
    options: &SpecXlsxExportOptions,
) -> Result<(Vec<u8>, SpecXlsxReport), XlsxIoError> {
    let mut writer = XlsxWriter::new(options.clone());
    let report = writer.write_sheet(df_data, cols_text)?;
    let v_bytes = writer.finish()?;
    Ok((v_bytes, report))
}

fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), XlsxIoError> {
    if policy_autofit.width_cell_min == 0 {
        return Err(XlsxIoError::InvalidInput(
            "policy_autofit.width_cell_min must be >= 1.".to_string(),
        ));
    }
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(XlsxIoError::InvalidInput(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        ));
    }
    Ok(())
}

fn write_header(
    worksheet: &mut Worksheet,
    colnames: &[String],
    fmt_header: &Format,
) -> Result<(), XlsxIoError> {
    for (col_idx, cell_value) in colnames.iter().enumerate() {
        worksheet
            .write_string_with_format(0, cast_col_num(col_idx)?, cell_value, fmt_header)
            .map_err(derive_xlsx_error)?;
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), XlsxIoError> {
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::String(val) if val.is_empty() => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    val,
                    format,
                )
                .map_err(derive_xlsx_error)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    *val,
                    format,
                )
                .map_err(derive_xlsx_error)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    u32::try_from(value)
        .map_err(|_| XlsxIoError::InvalidInput(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    u16::try_from(value)
        .map_err(|_| XlsxIoError::InvalidInput(format!("column index overflow: {value}")))
}

fn derive_xlsx_error(err: XlsxError) -> XlsxIoError {
    XlsxIoError::Write(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use calamine::{Data, Reader, Xlsx};
    use polars::prelude::Column;

    use super::*;

    fn read_back(v_bytes: Vec<u8>) -> (Vec<String>, Vec<Vec<Data>>) {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(v_bytes)).expect("open xlsx");
        let l_sheet_names = workbook.sheet_names();
        let range = workbook
            .worksheet_range(&l_sheet_names[0])
            .expect("sheet range");
        let l_rows = range.rows().map(|row| row.to_vec()).collect();
        (l_sheet_names, l_rows)
    }

    fn build_df() -> DataFrame {
        DataFrame::new(vec![
            Column::new("学院".into(), vec![Some("法学院"), Some("外国语学院")]),
            Column::new("手机号".into(), vec![Some(1.23e10), Some(13800138000.0)]),
            Column::new("人数".into(), vec![Some(12.0), None]),
        ])
        .expect("df")
    }

    #[test]
    fn test_write_text_columns_as_plain_digit_strings() {
        let df = build_df();
        let (v_bytes, report) = write_dataframe_to_bytes(
            &df,
            &["手机号".to_string()],
            &SpecXlsxExportOptions::default(),
        )
        .expect("write");

        assert_eq!(report.sheet_name, "排序后数据");
        assert_eq!(report.n_rows, 2);
        assert_eq!(report.cols_text, vec!["手机号".to_string()]);

        let (l_sheet_names, l_rows) = read_back(v_bytes);
        assert_eq!(l_sheet_names, vec!["排序后数据".to_string()]);
        assert_eq!(l_rows[0][0], Data::String("学院".to_string()));
        assert_eq!(l_rows[1][1], Data::String("12300000000".to_string()));
        assert_eq!(l_rows[2][1], Data::String("13800138000".to_string()));
        assert_eq!(l_rows[1][2], Data::Float(12.0));
        assert_eq!(l_rows[2][2], Data::Empty);
    }

    #[test]
    fn test_write_rejects_unknown_text_column() {
        let df = build_df();
        let err = write_dataframe_to_bytes(
            &df,
            &["不存在".to_string()],
            &SpecXlsxExportOptions::default(),
        )
        .expect_err("unknown column");

        assert!(matches!(err, XlsxIoError::InvalidInput(_)));
    }

    #[test]
    fn test_write_rejects_invalid_autofit_policy() {
        let df = build_df();
        let mut options = SpecXlsxExportOptions::default();
        options.policy_autofit.width_cell_min = 0;

        let err = write_dataframe_to_bytes(&df, &[], &options).expect_err("invalid policy");
        assert!(err.to_string().contains("width_cell_min"));
    }

    #[test]
    fn test_write_sanitizes_sheet_name_with_warning() {
        let df = build_df();
        let options = SpecXlsxExportOptions {
            sheet_name: "2024/秋季[报名]".to_string(),
            ..Default::default()
        };

        let (_, report) = write_dataframe_to_bytes(&df, &[], &options).expect("write");
        assert_eq!(report.sheet_name, "2024_秋季_报名_");
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_writer_collects_reports() {
        let df = build_df();
        let mut writer = XlsxWriter::new(SpecXlsxExportOptions::default());
        writer.write_sheet(&df, &[]).expect("write");

        assert_eq!(writer.report().len(), 1);
        assert!(writer.report()[0].cols_text.is_empty());
        assert!(!writer.finish().expect("finish").is_empty());
    }

    #[test]
    fn test_derive_format_applies_every_cell_format_field() {
        let spec = SpecCellFormat {
            font_name: Some("宋体".to_string()),
            font_size: Some(12),
            bold: Some(true),
            align: Some("left".to_string()),
            valign: Some("vcenter".to_string()),
            border: Some(1),
            text_wrap: Some(true),
            num_format: Some("0.00".to_string()),
        };

        let expected = Format::new()
            .set_font_name("宋体")
            .set_font_size(12.0)
            .set_bold()
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter)
            .set_num_format("0.00")
            .set_border(FormatBorder::Thin)
            .set_text_wrap();
        assert_eq!(derive_rust_xlsx_format(&spec), expected);
        assert_eq!(derive_rust_xlsx_format(&SpecCellFormat::default()), Format::new());
    }

    #[test]
    fn test_derive_format_border_and_align_codes() {
        assert_eq!(derive_format_border(2), FormatBorder::Medium);
        assert_eq!(derive_format_border(7), FormatBorder::Hair);
        assert_eq!(derive_format_border(0), FormatBorder::None);
        assert_eq!(derive_format_border(99), FormatBorder::None);
        assert_eq!(derive_format_align(" VCenter "), Some(FormatAlign::VerticalCenter));
        assert_eq!(derive_format_align("justify"), None);
    }

    #[test]
    fn test_write_with_styled_body_and_header() {
        let df = build_df();
        let fmt_styled = SpecCellFormat {
            font_name: Some("Arial".to_string()),
            font_size: Some(10),
            valign: Some("vcenter".to_string()),
            border: Some(1),
            text_wrap: Some(true),
            ..Default::default()
        };
        let defaults = SpecXlsxExportOptions::default();
        let options = SpecXlsxExportOptions {
            fmt_header: defaults.fmt_header.merge(&fmt_styled),
            fmt_body: defaults.fmt_body.merge(&fmt_styled),
            fmt_text: defaults.fmt_text.merge(&fmt_styled),
            ..defaults
        };

        let (v_bytes, _) =
            write_dataframe_to_bytes(&df, &["手机号".to_string()], &options).expect("write");
        let (_, l_rows) = read_back(v_bytes);

        assert_eq!(l_rows[0][0], Data::String("学院".to_string()));
        assert_eq!(l_rows[1][1], Data::String("12300000000".to_string()));
        assert_eq!(l_rows[1][2], Data::Float(12.0));
    }

    #[test]
    fn test_write_date_text_stays_string_cell() {
        let df = DataFrame::new(vec![
            Column::new("学院".into(), vec![Some("法学院")]),
            Column::new("日期".into(), vec![Some("2024-01-01")]),
        ])
        .expect("df");

        let (v_bytes, _) =
            write_dataframe_to_bytes(&df, &[], &SpecXlsxExportOptions::default()).expect("write");
        let (_, l_rows) = read_back(v_bytes);

        assert_eq!(l_rows[1][1], Data::String("2024-01-01".to_string()));
    }
}
