//! Shared XLSX specification models and errors.

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::conf::{
    C_COLUMN_REQUIRED_DEFAULT, C_SHEET_NAME_DEFAULT, EnumFmtKey, L_ROWS_HEADER_CANDIDATES_DEFAULT,
    derive_default_xlsx_formats,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification merged into `rust_xlsxwriter::Format` at write time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
}

/// Normalized cell value during load/convert/write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LoadOptions

/// Options for turning workbook bytes into a DataFrame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxLoadOptions {
    /// Column name that must appear in the accepted header row.
    pub column_required: String,
    /// Zero-based header row candidates, tried in order.
    pub rows_header_candidates: Vec<usize>,
    /// Drop body rows whose cells are all blank.
    pub if_drop_empty_rows: bool,
}

impl Default for SpecXlsxLoadOptions {
    fn default() -> Self {
        Self {
            column_required: C_COLUMN_REQUIRED_DEFAULT.to_string(),
            rows_header_candidates: L_ROWS_HEADER_CANDIDATES_DEFAULT.to_vec(),
            if_drop_empty_rows: true,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Replacement text for non-finite numbers, which Excel cannot store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxValuePolicy {
    /// Replacement text for NaN.
    pub nan_str: String,
    /// Replacement text for positive infinity.
    pub posinf_str: String,
    /// Replacement text for negative infinity.
    pub neginf_str: String,
}

impl Default for SpecXlsxValuePolicy {
    fn default() -> Self {
        Self {
            nan_str: "NaN".to_string(),
            posinf_str: "Inf".to_string(),
            neginf_str: "-Inf".to_string(),
        }
    }
}

/// Autofit rule for column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit.
    None,
    /// Infer width from header cells only.
    Header,
    /// Infer width from body cells only.
    Body,
    /// Infer width from both header and body cells (default).
    #[default]
    All,
}

/// Autofit policy for per-sheet write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::All,
            width_cell_min: 1,
            width_cell_max: 30,
            width_cell_padding: 2,
        }
    }
}

/// Export options controlling sheet naming, formats and widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxExportOptions {
    /// Worksheet name (sanitized before use).
    pub sheet_name: String,
    /// Header row format.
    pub fmt_header: SpecCellFormat,
    /// Body format for regular columns.
    pub fmt_body: SpecCellFormat,
    /// Body format for columns forced to text.
    pub fmt_text: SpecCellFormat,
    /// Non-finite number replacement policy.
    pub value_policy: SpecXlsxValuePolicy,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

impl Default for SpecXlsxExportOptions {
    fn default() -> Self {
        let dict_fmt = derive_default_xlsx_formats();
        let derive_fmt = |key: EnumFmtKey| dict_fmt.get(key.as_str()).cloned().unwrap_or_default();

        Self {
            sheet_name: C_SHEET_NAME_DEFAULT.to_string(),
            fmt_header: derive_fmt(EnumFmtKey::Header),
            fmt_body: derive_fmt(EnumFmtKey::Body),
            fmt_text: derive_fmt(EnumFmtKey::Text),
            value_policy: SpecXlsxValuePolicy::default(),
            policy_autofit: SpecAutofitCellsPolicy::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Actual sheet name in workbook.
    pub sheet_name: String,
    /// Body rows written.
    pub n_rows: usize,
    /// Columns written.
    pub n_cols: usize,
    /// Columns written with the text format.
    pub cols_text: Vec<String>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Load/export failures of the XLSX layer.
#[derive(Debug, Error)]
pub enum XlsxIoError {
    /// Byte stream is not a readable workbook.
    #[error("failed to read workbook: {0}")]
    Read(String),

    /// Workbook has no worksheet or no row that can serve as a header.
    #[error("workbook has no readable worksheet data")]
    EmptyWorkbook,

    /// Required column absent under every header candidate.
    #[error("required column '{column}' not found; columns found: {found:?}")]
    MissingRequiredColumn {
        /// Column that was required.
        column: String,
        /// Trimmed column names of the last attempted header row.
        found: Vec<String>,
    },

    /// Invalid option or DataFrame shape.
    #[error("{0}")]
    InvalidInput(String),

    /// DataFrame construction or access failed.
    #[error("DataFrame operation failed: {0}")]
    Frame(#[from] PolarsError),

    /// Workbook serialization failed.
    #[error("xlsx write error: {0}")]
    Write(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
