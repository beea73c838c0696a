//! Ordering report model.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::EnumOrderMode;

/// Counters and diagnostics for one ordering run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOrder {
    /// Mode that produced the output.
    pub mode: EnumOrderMode,
    /// Column the rows were ordered by.
    pub column_sort: String,
    /// Total rows in (and out).
    pub cnt_rows: u64,
    /// Canonical label and its row count, in canonical order (college mode).
    pub buckets: Vec<(String, u64)>,
    /// Rows placed in the trailing overflow block (college mode).
    pub cnt_rows_overflow: u64,
    /// Distinct non-empty unmatched labels in first-seen order (college mode).
    pub categories_unmatched: Vec<String>,
    /// Fraction of rows whose time value parsed (time mode).
    pub ratio_time_parsed: Option<f64>,
    /// Whether rows were sorted by parsed time rather than raw values.
    pub if_time_parsed: bool,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl ReportOrder {
    /// Empty report for `mode` sorted by `column_sort`.
    pub fn new(mode: EnumOrderMode, column_sort: impl Into<String>) -> Self {
        Self {
            mode,
            column_sort: column_sort.into(),
            cnt_rows: 0,
            buckets: Vec::new(),
            cnt_rows_overflow: 0,
            categories_unmatched: Vec::new(),
            ratio_time_parsed: None,
            if_time_parsed: false,
            warnings: Vec::new(),
        }
    }

    /// Rows that landed in a canonical bucket.
    pub fn cnt_rows_matched(&self) -> u64 {
        self.buckets.iter().map(|(_, n_rows)| n_rows).sum()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_rows".to_string(), self.cnt_rows);
        dict_counts.insert("cnt_rows_matched".to_string(), self.cnt_rows_matched());
        dict_counts.insert("cnt_rows_overflow".to_string(), self.cnt_rows_overflow);
        dict_counts.insert(
            "cnt_categories_unmatched".to_string(),
            self.categories_unmatched.len() as u64,
        );
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let c_head = format!(
            "{prefix} mode={} column={} rows={}",
            self.mode, self.column_sort, self.cnt_rows
        );
        let c_body = match self.mode {
            EnumOrderMode::College => format!(
                "matched={} overflow={} unmatched={:?}",
                self.cnt_rows_matched(),
                self.cnt_rows_overflow,
                self.categories_unmatched
            ),
            EnumOrderMode::Time => format!(
                "parsed={:.2} by={}",
                self.ratio_time_parsed.unwrap_or(0.0),
                if self.if_time_parsed { "time" } else { "raw" }
            ),
        };
        format!("{c_head} {c_body} warnings={}", self.warning_count())
    }
}

impl fmt::Display for ReportOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[ORDER]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_college_to_dict_and_format() {
        let report = ReportOrder {
            cnt_rows: 4,
            buckets: vec![("经济与管理学院".to_string(), 1), ("法学院".to_string(), 2)],
            cnt_rows_overflow: 1,
            categories_unmatched: vec!["某新学院".to_string()],
            ..ReportOrder::new(EnumOrderMode::College, "学院")
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_rows"], 4);
        assert_eq!(dict_counts["cnt_rows_matched"], 3);
        assert_eq!(dict_counts["cnt_rows_overflow"], 1);
        assert_eq!(dict_counts["cnt_categories_unmatched"], 1);
        assert_eq!(dict_counts["cnt_warnings"], 0);

        let txt = report.format("[ORDER]");
        assert_eq!(
            txt,
            "[ORDER] mode=college column=学院 rows=4 matched=3 overflow=1 unmatched=[\"某新学院\"] warnings=0"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn test_report_time_format_names_sort_path() {
        let mut report = ReportOrder {
            cnt_rows: 3,
            ratio_time_parsed: Some(2.0 / 3.0),
            if_time_parsed: true,
            ..ReportOrder::new(EnumOrderMode::Time, "日期")
        };
        report.add_warning("1 value(s) did not parse");

        assert_eq!(
            report.format("[ORDER]"),
            "[ORDER] mode=time column=日期 rows=3 parsed=0.67 by=time warnings=1"
        );
    }
}
