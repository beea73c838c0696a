//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// MIME type of the exported workbook.
pub const C_MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Excel number format code that stores cells as literal text.
pub const C_NUM_FORMAT_TEXT: &str = "@";
/// Default worksheet name of the exported workbook.
pub const C_SHEET_NAME_DEFAULT: &str = "排序后数据";
/// Default column that must be present in the detected header row.
pub const C_COLUMN_REQUIRED_DEFAULT: &str = "学院";
/// Header rows tried in order: row 1, then row 2 (row 1 treated as a banner).
pub const L_ROWS_HEADER_CANDIDATES_DEFAULT: [usize; 2] = [0, 1];

/// Day zero of the Excel 1900 date system, as used by serial date values.
pub const TUP_EXCEL_EPOCH_YMD: (i32, u32, u32) = (1899, 12, 30);

/// Largest serial Excel renders as a date (9999-12-31 23:59:59.999).
pub const N_EXCEL_SERIAL_DATE_MAX: f64 = 2_958_465.999_99;

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumFmtKey {
    /// Header cell format.
    Header,
    /// Generic body cell format.
    Body,
    /// Body cell format for columns forced to text.
    Text,
}

impl EnumFmtKey {
    /// Preset name used in [`derive_default_xlsx_formats`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Body => "body",
            Self::Text => "text",
        }
    }
}

/// Build default named format presets used by [`crate::writer::XlsxWriter`].
pub fn derive_default_xlsx_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        align: Some("center".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(
        EnumFmtKey::Body.as_str().to_string(),
        cfg_base_fmt_spec.clone(),
    );
    dict_fmt.insert(
        EnumFmtKey::Header.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Text.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_TEXT.to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}
