use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use sheetorder_rank::{
    C_FILE_NAME_COLLEGE, C_FILE_NAME_TIME, C_MIME_XLSX, EnumOrderMode, ReportOrder,
    SheetOrderError, SheetOrderPipeline, SpecPipelineOptions, derive_column_names, preview_rows,
};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "sheetorder.rank.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "ReportOrder")]
#[derive(Debug, Clone)]
struct PyReportOrder {
    #[pyo3(get)]
    mode: String,
    #[pyo3(get)]
    column_sort: String,
    #[pyo3(get)]
    cnt_rows: u64,
    #[pyo3(get)]
    buckets: Vec<(String, u64)>,
    #[pyo3(get)]
    cnt_rows_overflow: u64,
    #[pyo3(get)]
    categories_unmatched: Vec<String>,
    #[pyo3(get)]
    ratio_time_parsed: Option<f64>,
    #[pyo3(get)]
    if_time_parsed: bool,
    #[pyo3(get)]
    warnings: Vec<String>,
    inner: ReportOrder,
}

impl From<ReportOrder> for PyReportOrder {
    fn from(report: ReportOrder) -> Self {
        Self {
            mode: report.mode.as_str().to_string(),
            column_sort: report.column_sort.clone(),
            cnt_rows: report.cnt_rows,
            buckets: report.buckets.clone(),
            cnt_rows_overflow: report.cnt_rows_overflow,
            categories_unmatched: report.categories_unmatched.clone(),
            ratio_time_parsed: report.ratio_time_parsed,
            if_time_parsed: report.if_time_parsed,
            warnings: report.warnings.clone(),
            inner: report,
        }
    }
}

#[pymethods]
impl PyReportOrder {
    #[getter]
    fn warning_count(&self) -> usize {
        self.inner.warning_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.inner.to_dict()
    }

    #[pyo3(signature = (prefix = "[ORDER]"))]
    fn format(&self, prefix: &str) -> String {
        self.inner.format(prefix)
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

#[pyclass(name = "SheetOrderer")]
struct PySheetOrderer {
    pipeline: SheetOrderPipeline,
    df_loaded: Option<DataFrame>,
    df_ordered: Option<DataFrame>,
    cols_text: Vec<String>,
    mode: Option<EnumOrderMode>,
    report: Option<PyReportOrder>,
}

#[pymethods]
impl PySheetOrderer {
    #[new]
    #[pyo3(signature = (
        order = None,
        aliases = None,
        column_category = None,
        thr_ratio_parsed_min = None,
        rows_header_candidates = None
    ))]
    fn new(
        order: Option<Vec<String>>,
        aliases: Option<BTreeMap<String, String>>,
        column_category: Option<String>,
        thr_ratio_parsed_min: Option<f64>,
        rows_header_candidates: Option<Vec<usize>>,
    ) -> PyResult<Self> {
        let mut options = SpecPipelineOptions::default();
        if let Some(l_order) = order {
            options.rules.order = l_order;
        }
        if let Some(dict_aliases) = aliases {
            options.rules.aliases = dict_aliases;
        }
        if let Some(c_column) = column_category {
            options.rules.column_category = c_column;
        }
        if let Some(thr) = thr_ratio_parsed_min {
            if !(0.0..1.0).contains(&thr) {
                return Err(PyValueError::new_err(format!(
                    "Invalid thr_ratio_parsed_min: `{thr}`. Expected 0 <= value < 1."
                )));
            }
            options.policy_time_sort.thr_ratio_parsed_min = thr;
        }
        if let Some(l_rows) = rows_header_candidates {
            if l_rows.is_empty() {
                return Err(PyValueError::new_err(
                    "rows_header_candidates must not be empty.",
                ));
            }
            options.rows_header_candidates = Some(l_rows);
        }

        Ok(Self {
            pipeline: SheetOrderPipeline::new(options),
            df_loaded: None,
            df_ordered: None,
            cols_text: Vec::new(),
            mode: None,
            report: None,
        })
    }

    /// Load workbook bytes and classify text columns; clears earlier results.
    fn load(&mut self, py: Python<'_>, data: &[u8]) -> PyResult<()> {
        let pipeline = &self.pipeline;
        let (df, l_cols_text) = py
            .allow_threads(|| {
                let df = pipeline.load(data)?;
                let l_cols_text = pipeline.classify(&df)?;
                Ok::<_, SheetOrderError>((df, l_cols_text))
            })
            .map_err(map_sheet_order_error)?;

        self.df_loaded = Some(df);
        self.df_ordered = None;
        self.cols_text = l_cols_text;
        self.mode = None;
        self.report = None;
        Ok(())
    }

    #[getter]
    fn columns(&self) -> PyResult<Vec<String>> {
        Ok(derive_column_names(self.require_loaded()?))
    }

    #[getter]
    fn height(&self) -> PyResult<usize> {
        Ok(self.require_loaded()?.height())
    }

    #[getter]
    fn text_columns(&self) -> Vec<String> {
        self.cols_text.clone()
    }

    #[getter]
    fn report(&self) -> Option<PyReportOrder> {
        self.report.clone()
    }

    #[getter]
    fn file_name(&self) -> Option<&'static str> {
        self.mode.map(|mode| mode.default_file_name())
    }

    /// First `n` rows as strings; the ordered table once `process` ran.
    #[pyo3(signature = (n = 5, if_processed = false))]
    fn preview(&self, n: usize, if_processed: bool) -> PyResult<Vec<Vec<String>>> {
        let df = if if_processed {
            self.df_ordered
                .as_ref()
                .ok_or_else(|| PyRuntimeError::new_err("Nothing processed yet; call process()."))?
        } else {
            self.require_loaded()?
        };
        preview_rows(df, n).map_err(map_sheet_order_error)
    }

    #[pyo3(signature = (mode = "college"))]
    fn process(&mut self, py: Python<'_>, mode: &str) -> PyResult<PyReportOrder> {
        let mode = mode
            .parse::<EnumOrderMode>()
            .map_err(PyValueError::new_err)?;
        let df = self.require_loaded()?;
        let pipeline = &self.pipeline;

        let (df_ordered, report) = py
            .allow_threads(|| pipeline.process(df, mode))
            .map_err(map_sheet_order_error)?;

        let report = PyReportOrder::from(report);
        self.df_ordered = Some(df_ordered);
        self.mode = Some(mode);
        self.report = Some(report.clone());
        Ok(report)
    }

    fn export<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let df = self
            .df_ordered
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("Nothing processed yet; call process()."))?;
        let pipeline = &self.pipeline;
        let l_cols_text = &self.cols_text;

        let v_bytes = py
            .allow_threads(|| pipeline.export(df, l_cols_text))
            .map_err(map_sheet_order_error)?;
        Ok(PyBytes::new(py, &v_bytes))
    }
}

impl PySheetOrderer {
    fn require_loaded(&self) -> PyResult<&DataFrame> {
        self.df_loaded
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("No workbook loaded; call load() first."))
    }
}

fn map_sheet_order_error(exception: SheetOrderError) -> PyErr {
    match exception {
        SheetOrderError::MissingRequiredColumn { .. } => PyKeyError::new_err(exception.to_string()),
        SheetOrderError::NoSortableColumn { .. }
        | SheetOrderError::NoMatchedCategories { .. }
        | SheetOrderError::LoadFailure(_)
        | SheetOrderError::InvalidRules(_) => PyValueError::new_err(exception.to_string()),
        SheetOrderError::ExportFailure(_) | SheetOrderError::Frame(_) => {
            PyRuntimeError::new_err(exception.to_string())
        }
    }
}

#[pymodule]
fn _sheetorder_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyReportOrder>()?;
    module.add_class::<PySheetOrderer>()?;
    module.add("MIME_XLSX", C_MIME_XLSX)?;
    module.add("FILE_NAME_COLLEGE", C_FILE_NAME_COLLEGE)?;
    module.add("FILE_NAME_TIME", C_FILE_NAME_TIME)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
