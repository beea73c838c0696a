//! Stateless helper utilities used by the XLSX reader and writer kernels.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use polars::prelude::AnyValue;

use crate::conf::{
    N_EXCEL_SERIAL_DATE_MAX, N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_EPOCH_YMD, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumCellValue, SpecXlsxValuePolicy};

/// Integral floats at or above this magnitude are no longer exact in `f64`.
const N_ABS_INTEGRAL_EXACT_MAX: f64 = 1e17;

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Convert `NaN`/`Inf` to policy string; return error for finite values.
pub fn convert_nan_inf_to_str(
    x: f64,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<String, String> {
    if x.is_nan() {
        return Ok(value_policy.nan_str.clone());
    }
    if x.is_infinite() {
        return Ok(if x.is_sign_positive() {
            value_policy.posinf_str.clone()
        } else {
            value_policy.neginf_str.clone()
        });
    }
    Err("Input is neither NaN nor Inf.".to_string())
}

/// Render a number without scientific notation or a trailing `.0`.
///
/// `1.23e10` becomes `12300000000`, `12345.0` becomes `12345` and
/// `3.5` stays `3.5`.
pub fn format_number_plain(x: f64) -> String {
    if x == 0.0 {
        return "0".to_string();
    }
    if x.is_finite() && x.fract() == 0.0 && x.abs() < N_ABS_INTEGRAL_EXACT_MAX {
        return format!("{x:.0}");
    }
    // `Display` for f64 never switches to exponent notation.
    x.to_string()
}

/// Rewrite numeric text in `1.23E+10` or `12345.0` form to its plain digits.
///
/// Any other text (leading zeros, letters, dashes) is returned unchanged.
pub fn normalize_numeric_text(s: &str) -> String {
    let c_trimmed = s.trim();
    let if_scientific = c_trimmed.contains(['e', 'E']);
    let if_zero_decimal = c_trimmed.split_once('.').is_some_and(|(c_int, c_frac)| {
        let c_digits = c_int.strip_prefix('-').unwrap_or(c_int);
        !c_digits.is_empty()
            && c_digits.chars().all(|chr| chr.is_ascii_digit())
            && !c_frac.is_empty()
            && c_frac.chars().all(|chr| chr == '0')
    });
    if !if_scientific && !if_zero_decimal {
        return s.to_string();
    }

    match c_trimmed.parse::<f64>() {
        Ok(val) if val.is_finite() => format_number_plain(val),
        _ => s.to_string(),
    }
}

/// Normalize cell value for writing, according to the column's text flag.
pub fn convert_cell_value(
    value: &EnumCellValue,
    if_is_text_col: bool,
    value_policy: &SpecXlsxValuePolicy,
) -> EnumCellValue {
    match value {
        EnumCellValue::None => EnumCellValue::None,
        EnumCellValue::Number(n) if !n.is_finite() => EnumCellValue::String(
            convert_nan_inf_to_str(*n, value_policy)
                .unwrap_or_else(|_| value_policy.nan_str.clone()),
        ),
        EnumCellValue::Number(n) => {
            if if_is_text_col {
                EnumCellValue::String(format_number_plain(*n))
            } else {
                EnumCellValue::Number(*n)
            }
        }
        EnumCellValue::String(s) => {
            if if_is_text_col {
                EnumCellValue::String(normalize_numeric_text(s))
            } else {
                EnumCellValue::String(s.clone())
            }
        }
    }
}

/// String form of a cell value; missing becomes the empty string.
pub fn derive_text_from_cell_value(value: &EnumCellValue) -> String {
    match value {
        EnumCellValue::None => String::new(),
        EnumCellValue::String(s) => s.clone(),
        EnumCellValue::Number(n) => format_number_plain(*n),
    }
}

/// Convert a Polars scalar into the pipeline cell value.
pub fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "TRUE" } else { "FALSE" }.to_string())
        }
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

/// Render an Excel serial date as `YYYY-MM-DD`, or `YYYY-MM-DD HH:MM:SS` when
/// it carries a time of day.
///
/// Serials outside `0..=N_EXCEL_SERIAL_DATE_MAX` have no date rendering and
/// yield `None`.
pub fn convert_excel_serial_to_text(serial: f64) -> Option<String> {
    if !(0.0..=N_EXCEL_SERIAL_DATE_MAX).contains(&serial) {
        return None;
    }
    let (n_year, n_month, n_day) = TUP_EXCEL_EPOCH_YMD;
    let dt_epoch = NaiveDate::from_ymd_opt(n_year, n_month, n_day)?.and_hms_opt(0, 0, 0)?;
    let n_millis = (serial * 86_400_000.0).round() as i64;
    let dt_value = dt_epoch.checked_add_signed(Duration::try_milliseconds(n_millis)?)?;

    if dt_value.time() == chrono::NaiveTime::MIN {
        Some(dt_value.format("%Y-%m-%d").to_string())
    } else {
        Some(dt_value.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrameLikeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Resolve column names to sorted unique indices.
///
/// Names are matched literally; a column called `2024` is a name, not an index.
pub fn select_sorted_indices_from_names(
    columns: &[String],
    names: &[String],
) -> Result<Vec<usize>, String> {
    let mut set_idx = BTreeSet::new();
    for c_name_ref in names {
        let Some(n_idx) = columns.iter().position(|c_name| c_name == c_name_ref) else {
            return Err(format!("Column not found: {c_name_ref:?}"));
        };
        set_idx.insert(n_idx);
    }

    Ok(set_idx.into_iter().collect())
}

/// Trim raw header cells, name blanks `Unnamed: {idx}` and suffix duplicates
/// as `name.1`, `name.2`, ...
pub fn derive_header_names(header_cells: &[EnumCellValue]) -> Vec<String> {
    let mut set_names_used = BTreeSet::new();
    let mut l_names = Vec::with_capacity(header_cells.len());

    for (n_idx, cell) in header_cells.iter().enumerate() {
        let c_trimmed = derive_text_from_cell_value(cell).trim().to_string();
        let c_base = if c_trimmed.is_empty() {
            format!("Unnamed: {n_idx}")
        } else {
            c_trimmed
        };

        let mut c_name = c_base.clone();
        let mut n_dup = 1usize;
        while set_names_used.contains(&c_name) {
            c_name = format!("{c_base}.{n_dup}");
            n_dup += 1;
        }
        set_names_used.insert(c_name.clone());
        l_names.push(c_name);
    }

    l_names
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WidthEstimation

/// Estimate displayed width units for one normalized cell value.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => format_number_plain(*n).len(),
    }
}

/// Width of text where non-ASCII (CJK) characters count wider than ASCII.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
