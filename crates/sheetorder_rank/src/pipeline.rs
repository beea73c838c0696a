//! Load -> classify -> normalize/order -> export pipeline facade.
//!
//! Configuration is injected once at construction; every call is otherwise
//! stateless, so one pipeline may serve any number of independent runs.

use polars::prelude::DataFrame;
use sheetorder_io_xlsx::{C_MIME_XLSX, load_dataframe_from_bytes, write_dataframe_to_bytes};
use tracing::{debug, info};

use crate::classify::classify_text_columns;
use crate::order::{order_by_college, order_by_time};
use crate::report::ReportOrder;
use crate::spec::{EnumOrderMode, SheetOrderError, SpecPipelineOptions, SpecPipelineOutput};

/// Sheet ordering pipeline bound to one configuration.
#[derive(Debug, Clone, Default)]
pub struct SheetOrderPipeline {
    options: SpecPipelineOptions,
}

impl SheetOrderPipeline {
    /// Create pipeline with injected rules and policies.
    pub fn new(options: SpecPipelineOptions) -> Self {
        Self { options }
    }

    /// Read workbook bytes, detecting the header row.
    pub fn load(&self, v_bytes: &[u8]) -> Result<DataFrame, SheetOrderError> {
        let df = load_dataframe_from_bytes(v_bytes, &self.options.derive_load_options())?;
        Ok(df)
    }

    /// Columns to export as literal text.
    pub fn classify(&self, df: &DataFrame) -> Result<Vec<String>, SheetOrderError> {
        classify_text_columns(df, &self.options.policy_classify)
    }

    /// Reorder rows by `mode`.
    pub fn process(
        &self,
        df: &DataFrame,
        mode: EnumOrderMode,
    ) -> Result<(DataFrame, ReportOrder), SheetOrderError> {
        debug!(mode = %mode, rows = df.height(), "ordering rows");
        match mode {
            EnumOrderMode::College => order_by_college(df, &self.options.rules),
            EnumOrderMode::Time => order_by_time(df, &self.options.policy_time_sort),
        }
    }

    /// Serialize `df` to styled workbook bytes.
    pub fn export(&self, df: &DataFrame, cols_text: &[String]) -> Result<Vec<u8>, SheetOrderError> {
        let (v_bytes, _) = write_dataframe_to_bytes(df, cols_text, &self.options.export_options)
            .map_err(|err| SheetOrderError::ExportFailure(err.to_string()))?;
        Ok(v_bytes)
    }

    /// Run the whole pipeline on one workbook.
    ///
    /// Text columns are classified on the loaded table, before reordering.
    pub fn run(
        &self,
        v_bytes: &[u8],
        mode: EnumOrderMode,
    ) -> Result<SpecPipelineOutput, SheetOrderError> {
        let df = self.load(v_bytes)?;
        let l_cols_text = self.classify(&df)?;
        let (df_ordered, report) = self.process(&df, mode)?;
        let v_bytes_out = self.export(&df_ordered, &l_cols_text)?;

        info!(
            mode = %mode,
            rows = report.cnt_rows,
            cols_text = l_cols_text.len(),
            bytes = v_bytes_out.len(),
            "sheet ordered"
        );
        Ok(SpecPipelineOutput {
            bytes: v_bytes_out,
            file_name: mode.default_file_name().to_string(),
            mime_type: C_MIME_XLSX.to_string(),
            report,
        })
    }
}
