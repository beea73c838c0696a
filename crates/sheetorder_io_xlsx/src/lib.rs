//! `sheetorder_io_xlsx` v1:
//! Spreadsheet I/O kernel for the sheet ordering pipeline.
//!
//! - `conf`   : constants and default presets
//! - `spec`   : specs/options/errors
//! - `util`   : pure helper functions
//! - `reader` : workbook bytes -> DataFrame (header-row detection)
//! - `writer` : DataFrame -> styled workbook bytes
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_COLUMN_REQUIRED_DEFAULT, C_MIME_XLSX, C_NUM_FORMAT_TEXT, C_SHEET_NAME_DEFAULT,
    L_ROWS_HEADER_CANDIDATES_DEFAULT, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX,
};
pub use reader::{detect_header_row, load_dataframe_from_bytes};
pub use spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecXlsxExportOptions, SpecXlsxLoadOptions, SpecXlsxReport, SpecXlsxValuePolicy, XlsxIoError,
};
pub use util::{
    derive_cell_value_from_any_value, derive_text_from_cell_value, format_number_plain,
    normalize_numeric_text, sanitize_sheet_name,
};
pub use writer::{XlsxWriter, write_dataframe_to_bytes};
