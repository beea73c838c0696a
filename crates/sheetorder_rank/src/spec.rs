//! Ordering specification models and top-level error types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use polars::prelude::PolarsError;
use serde::{Deserialize, Serialize};
use sheetorder_io_xlsx::{SpecXlsxExportOptions, SpecXlsxLoadOptions, XlsxIoError};
use thiserror::Error;

use crate::conf::{
    C_FILE_NAME_COLLEGE, C_FILE_NAME_TIME, derive_default_classify_policy,
    derive_default_order_rules, derive_default_time_sort_policy,
};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Row ordering mode; chosen explicitly per run, never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumOrderMode {
    /// Bucket rows by canonical college order, unmatched rows last.
    College,
    /// Sort rows ascending by the detected date/time column.
    Time,
}

impl EnumOrderMode {
    /// Stable lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::College => "college",
            Self::Time => "time",
        }
    }

    /// Default output file name for this mode.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::College => C_FILE_NAME_COLLEGE,
            Self::Time => C_FILE_NAME_TIME,
        }
    }
}

impl fmt::Display for EnumOrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EnumOrderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "college" | "category" | "按学院排序" => Ok(Self::College),
            "time" | "按时间列排序" | "按时间排序" => Ok(Self::Time),
            other => Err(format!(
                "Unknown order mode {other:?}; expected \"college\" or \"time\"."
            )),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsInit

/// Category column, canonical bucket order and alias table.
///
/// Later duplicate alias keys overwrite earlier ones; an alias that collides
/// with a canonical label is applied as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecOrderRules {
    /// Column holding the category label.
    #[serde(default = "derive_default_column_category")]
    pub column_category: String,
    /// Canonical labels in bucket priority order.
    pub order: Vec<String>,
    /// Exact-match alias -> canonical label.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

fn derive_default_column_category() -> String {
    crate::conf::C_COLUMN_CATEGORY_DEFAULT.to_string()
}

impl Default for SpecOrderRules {
    fn default() -> Self {
        derive_default_order_rules()
    }
}

impl SpecOrderRules {
    /// Parse rules from a JSON document.
    pub fn from_json_str(txt: &str) -> Result<Self, SheetOrderError> {
        serde_json::from_str(txt).map_err(|err| SheetOrderError::InvalidRules(err.to_string()))
    }
}

/// Identifier-column detection policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecClassifyPolicy {
    /// Name fragments that mark a column as text (matched lower-cased).
    pub keywords: Vec<String>,
    /// Non-missing values inspected by the value rule.
    pub n_samples: usize,
    /// Minimum digit count of a long numeric identifier.
    pub n_len_digits_min: usize,
}

impl Default for SpecClassifyPolicy {
    fn default() -> Self {
        derive_default_classify_policy()
    }
}

/// Time column detection and parse fallback policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTimeSortPolicy {
    /// Name fragments that mark a time column (matched lower-cased).
    pub keywords: Vec<String>,
    /// Parsed fraction that must be strictly exceeded to sort by parsed time.
    pub thr_ratio_parsed_min: f64,
}

impl Default for SpecTimeSortPolicy {
    fn default() -> Self {
        derive_default_time_sort_policy()
    }
}

/// Full configuration injected into [`crate::pipeline::SheetOrderPipeline`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecPipelineOptions {
    /// College bucket rules.
    pub rules: SpecOrderRules,
    /// Text-column classification.
    pub policy_classify: SpecClassifyPolicy,
    /// Time column sorting.
    pub policy_time_sort: SpecTimeSortPolicy,
    /// Header row candidates (the required column comes from `rules`).
    pub rows_header_candidates: Option<Vec<usize>>,
    /// Workbook export options.
    pub export_options: SpecXlsxExportOptions,
}

impl SpecPipelineOptions {
    /// Loader options derived from the rules' category column.
    pub fn derive_load_options(&self) -> SpecXlsxLoadOptions {
        let mut options = SpecXlsxLoadOptions {
            column_required: self.rules.column_category.clone(),
            ..Default::default()
        };
        if let Some(l_rows) = &self.rows_header_candidates {
            options.rows_header_candidates = l_rows.clone();
        }
        options
    }
}

/// Bytes and metadata of one completed run.
#[derive(Debug, Clone)]
pub struct SpecPipelineOutput {
    /// Exported `.xlsx` bytes.
    pub bytes: Vec<u8>,
    /// Suggested download file name.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime_type: String,
    /// Ordering report.
    pub report: crate::report::ReportOrder,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Fatal errors of one ordering run; no partial output is produced.
#[derive(Debug, Error)]
pub enum SheetOrderError {
    /// Category column absent under every header candidate.
    #[error("required column '{column}' not found; columns found: {found:?}")]
    MissingRequiredColumn {
        /// Column that was required.
        column: String,
        /// Columns actually found.
        found: Vec<String>,
    },

    /// Time order requested but no column name looks like a date/time.
    #[error("no date/time column found; columns found: {found:?}")]
    NoSortableColumn {
        /// Columns actually found.
        found: Vec<String>,
    },

    /// College order requested but the category column has no value at all.
    #[error("column '{column}' has no category value in {n_rows} row(s)")]
    NoMatchedCategories {
        /// Category column.
        column: String,
        /// Rows inspected.
        n_rows: usize,
    },

    /// Workbook serialization failed.
    #[error("export failed: {0}")]
    ExportFailure(String),

    /// Input bytes could not be read as a workbook.
    #[error("load failed: {0}")]
    LoadFailure(String),

    /// Rules document could not be parsed.
    #[error("invalid rules: {0}")]
    InvalidRules(String),

    /// DataFrame operation failed.
    #[error("DataFrame operation failed: {0}")]
    Frame(#[from] PolarsError),
}

impl From<XlsxIoError> for SheetOrderError {
    fn from(err: XlsxIoError) -> Self {
        match err {
            XlsxIoError::MissingRequiredColumn { column, found } => {
                Self::MissingRequiredColumn { column, found }
            }
            XlsxIoError::Frame(err) => Self::Frame(err),
            XlsxIoError::Write(msg) => Self::ExportFailure(msg),
            XlsxIoError::Read(_) | XlsxIoError::EmptyWorkbook | XlsxIoError::InvalidInput(_) => {
                Self::LoadFailure(err.to_string())
            }
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
