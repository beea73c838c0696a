//! Row orderers: canonical college buckets and detected time column.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::DataFrame;
use sheetorder_io_xlsx::EnumCellValue;
use tracing::{debug, warn};

use crate::normalize::{derive_normalized_categories, normalize_category_column};
use crate::report::ReportOrder;
use crate::spec::{EnumOrderMode, SheetOrderError, SpecOrderRules, SpecTimeSortPolicy};
use crate::util::{collect_column_values, derive_column_names, reorder_rows};

/// Accepted date-time layouts, tried in order.
const L_FORMATS_DATETIME: [&str; 14] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y年%m月%d日 %H:%M:%S",
    "%Y年%m月%d日 %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Accepted date-only layouts, tried in order.
const L_FORMATS_DATE: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y年%m月%d日",
    "%m/%d/%Y",
    "%d.%m.%Y",
];

////////////////////////////////////////////////////////////////////////////////
// #region CollegeOrder

/// Row permutation and bucket statistics of a college ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCollegePlan {
    /// Output row `i` is input row `rows[i]`.
    pub rows: Vec<usize>,
    /// Canonical label and its row count, in canonical order.
    pub buckets: Vec<(String, usize)>,
    /// Rows in the trailing overflow block.
    pub n_rows_overflow: usize,
    /// Distinct non-empty labels outside the canonical order, first-seen order.
    pub categories_unmatched: Vec<String>,
}

/// Plan a stable bucket ordering of `labels` by canonical `order`.
///
/// Rows whose label is not in `order` keep their input order in one
/// trailing block.
pub fn plan_college_order(labels: &[String], order: &[String]) -> SpecCollegePlan {
    let mut dict_bucket_idx: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    for (n_idx, c_label) in order.iter().enumerate() {
        dict_bucket_idx.entry(c_label.as_str()).or_insert(n_idx);
    }

    let mut l_buckets: Vec<Vec<usize>> = vec![Vec::new(); order.len()];
    let mut l_overflow = Vec::new();
    let mut l_unmatched = Vec::new();
    let mut set_unmatched = BTreeSet::new();

    for (n_idx_row, c_label) in labels.iter().enumerate() {
        match dict_bucket_idx.get(c_label.as_str()) {
            Some(n_idx_bucket) => l_buckets[*n_idx_bucket].push(n_idx_row),
            None => {
                l_overflow.push(n_idx_row);
                if !c_label.is_empty() && set_unmatched.insert(c_label.as_str()) {
                    l_unmatched.push(c_label.clone());
                }
            }
        }
    }

    let buckets = order
        .iter()
        .zip(&l_buckets)
        .map(|(c_label, l_rows)| (c_label.clone(), l_rows.len()))
        .collect();
    let n_rows_overflow = l_overflow.len();
    let mut rows: Vec<usize> = l_buckets.into_iter().flatten().collect();
    rows.extend(l_overflow);

    SpecCollegePlan {
        rows,
        buckets,
        n_rows_overflow,
        categories_unmatched: l_unmatched,
    }
}

/// Normalize the category column and bucket rows by canonical college order.
pub fn order_by_college(
    df: &DataFrame,
    rules: &SpecOrderRules,
) -> Result<(DataFrame, ReportOrder), SheetOrderError> {
    let df_normalized = normalize_category_column(df, rules)?;
    let l_labels = derive_normalized_categories(&df_normalized, rules)?;

    if l_labels.iter().all(String::is_empty) {
        return Err(SheetOrderError::NoMatchedCategories {
            column: rules.column_category.clone(),
            n_rows: l_labels.len(),
        });
    }

    let plan = plan_college_order(&l_labels, &rules.order);
    let df_out = reorder_rows(&df_normalized, &plan.rows)?;

    let mut report = ReportOrder {
        cnt_rows: l_labels.len() as u64,
        buckets: plan
            .buckets
            .iter()
            .map(|(c_label, n_rows)| (c_label.clone(), *n_rows as u64))
            .collect(),
        cnt_rows_overflow: plan.n_rows_overflow as u64,
        categories_unmatched: plan.categories_unmatched.clone(),
        ..ReportOrder::new(EnumOrderMode::College, rules.column_category.as_str())
    };
    if !plan.categories_unmatched.is_empty() {
        warn!(
            column = %rules.column_category,
            unmatched = ?plan.categories_unmatched,
            "categories outside canonical order placed last"
        );
        report.add_warning(format!(
            "{} unmatched categories outside canonical order: {:?}",
            plan.categories_unmatched.len(),
            plan.categories_unmatched
        ));
    }
    let n_rows_empty = l_labels.iter().filter(|c_label| c_label.is_empty()).count();
    if n_rows_empty > 0 {
        report.add_warning(format!("{n_rows_empty} row(s) without category placed last"));
    }
    debug!(rows = report.cnt_rows, overflow = report.cnt_rows_overflow, "college order done");

    Ok((df_out, report))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TimeOrder

/// First column (declaration order) whose lower-cased name contains a time keyword.
pub fn detect_time_column(columns: &[String], policy: &SpecTimeSortPolicy) -> Option<String> {
    let l_keywords: Vec<String> = policy.keywords.iter().map(|c| c.to_lowercase()).collect();
    columns
        .iter()
        .find(|c_name| {
            let c_name_lower = c_name.to_lowercase();
            l_keywords.iter().any(|c_keyword| c_name_lower.contains(c_keyword))
        })
        .cloned()
}

/// Parse date/time text; date-only values resolve to midnight.
pub fn parse_datetime_text(txt: &str) -> Option<NaiveDateTime> {
    let c_trimmed = txt.trim();
    if c_trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(c_trimmed) {
        return Some(dt.naive_local());
    }
    for c_fmt in L_FORMATS_DATETIME {
        if let Ok(dt) = NaiveDateTime::parse_from_str(c_trimmed, c_fmt) {
            return Some(dt);
        }
    }
    for c_fmt in L_FORMATS_DATE {
        if let Ok(date) = NaiveDate::parse_from_str(c_trimmed, c_fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    parse_compact_date(c_trimmed)
}

/// `YYYYMMDD` without separators.
fn parse_compact_date(txt: &str) -> Option<NaiveDateTime> {
    if txt.len() != 8 || !txt.chars().all(|chr| chr.is_ascii_digit()) {
        return None;
    }
    let n_year = txt[0..4].parse().ok()?;
    let n_month = txt[4..6].parse().ok()?;
    let n_day = txt[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(n_year, n_month, n_day)?.and_hms_opt(0, 0, 0)
}

/// Parsed time key of one cell; numeric cells are never read as dates.
pub fn derive_time_key(value: &EnumCellValue) -> Option<NaiveDateTime> {
    match value {
        EnumCellValue::String(s) => parse_datetime_text(s),
        EnumCellValue::Number(_) | EnumCellValue::None => None,
    }
}

/// Row permutation of a time ordering and the parse statistics behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTimePlan {
    /// Output row `i` is input row `rows[i]`.
    pub rows: Vec<usize>,
    /// Rows whose value parsed as a date/time.
    pub n_rows_parsed: usize,
    /// `n_rows_parsed` over all rows (0 for an empty column).
    pub ratio_parsed: f64,
    /// Whether the parsed keys drove the ordering.
    pub if_parsed: bool,
}

/// Plan a stable ascending ordering of `values`.
///
/// Sorts by parsed time when the parsed fraction strictly exceeds the
/// threshold, otherwise by the raw values. Missing keys go last either way.
pub fn plan_time_order(values: &[EnumCellValue], policy: &SpecTimeSortPolicy) -> SpecTimePlan {
    let l_keys: Vec<Option<NaiveDateTime>> = values.iter().map(derive_time_key).collect();
    let n_rows_parsed = l_keys.iter().filter(|key| key.is_some()).count();
    let ratio_parsed = if values.is_empty() {
        0.0
    } else {
        n_rows_parsed as f64 / values.len() as f64
    };
    let if_parsed = ratio_parsed > policy.thr_ratio_parsed_min;

    let mut rows: Vec<usize> = (0..values.len()).collect();
    if if_parsed {
        rows.sort_by_key(|n_idx| (l_keys[*n_idx].is_none(), l_keys[*n_idx]));
    } else {
        rows.sort_by(|a, b| compare_raw_values(&values[*a], &values[*b]));
    }

    SpecTimePlan {
        rows,
        n_rows_parsed,
        ratio_parsed,
        if_parsed,
    }
}

/// Raw fallback order: numbers ascending, then text lexically, missing last.
pub fn compare_raw_values(a: &EnumCellValue, b: &EnumCellValue) -> Ordering {
    match (a, b) {
        (EnumCellValue::Number(x), EnumCellValue::Number(y)) => x.total_cmp(y),
        (EnumCellValue::String(x), EnumCellValue::String(y)) => x.cmp(y),
        (EnumCellValue::None, EnumCellValue::None) => Ordering::Equal,
        (EnumCellValue::Number(_), _) => Ordering::Less,
        (_, EnumCellValue::Number(_)) => Ordering::Greater,
        (EnumCellValue::None, _) => Ordering::Greater,
        (_, EnumCellValue::None) => Ordering::Less,
    }
}

/// Detect the time column and sort rows ascending by it.
pub fn order_by_time(
    df: &DataFrame,
    policy: &SpecTimeSortPolicy,
) -> Result<(DataFrame, ReportOrder), SheetOrderError> {
    let l_columns = derive_column_names(df);
    let Some(c_column) = detect_time_column(&l_columns, policy) else {
        return Err(SheetOrderError::NoSortableColumn { found: l_columns });
    };

    let l_values = collect_column_values(df, &c_column)?;
    let plan = plan_time_order(&l_values, policy);
    let df_out = reorder_rows(df, &plan.rows)?;

    let mut report = ReportOrder {
        cnt_rows: l_values.len() as u64,
        ratio_time_parsed: Some(plan.ratio_parsed),
        if_time_parsed: plan.if_parsed,
        ..ReportOrder::new(EnumOrderMode::Time, c_column.as_str())
    };
    if plan.if_parsed {
        let n_rows_unparsed = l_values.len() - plan.n_rows_parsed;
        if n_rows_unparsed > 0 {
            report.add_warning(format!(
                "{n_rows_unparsed} value(s) in '{c_column}' did not parse and were placed last"
            ));
        }
    } else {
        warn!(
            column = %c_column,
            ratio = plan.ratio_parsed,
            "too few date/time values parsed; sorting raw values"
        );
        report.add_warning(format!(
            "only {:.0}% of '{c_column}' parsed as date/time; sorted by raw values",
            plan.ratio_parsed * 100.0
        ));
    }
    debug!(column = %c_column, parsed = plan.if_parsed, "time order done");

    Ok((df_out, report))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
