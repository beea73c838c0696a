//! Command-line argument definitions using clap

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use sheetorder_rank::{
    EnumOrderMode, N_RATIO_TIME_PARSED_MIN_DEFAULT, SpecOrderRules, SpecPipelineOptions,
};

/// Sheetorder - reorder a worksheet by college or by its date/time column
#[derive(Parser, Debug)]
#[command(name = "sheetorder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input workbook (.xlsx, .xlsm, .xls, .xlsb or .ods)
    pub input: PathBuf,

    /// Ordering mode: "college" (canonical college buckets) or "time"
    #[arg(short, long, default_value = "college")]
    pub mode: EnumOrderMode,

    /// Output workbook path.
    /// Defaults to the mode's file name next to the input (e.g. 按学院排序.xlsx).
    /// Refused when it names the input workbook itself.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON file overriding the college rules:
    /// {"column_category": "学院", "order": [...], "aliases": {...}}
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Parsed fraction of the time column that must be exceeded to sort by parsed time
    #[arg(long, default_value_t = N_RATIO_TIME_PARSED_MIN_DEFAULT)]
    pub parse_ratio: f64,

    /// Spreadsheet rows (1-based) tried in order as the header row
    #[arg(long, value_delimiter = ',', default_values_t = [1usize, 2])]
    pub header_rows: Vec<usize>,

    /// Print the first N rows before and after ordering
    #[arg(long, default_value_t = 0)]
    pub preview: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Explicit output path, or the mode's default file name beside the input.
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let parent = self.input.parent().unwrap_or_else(|| Path::new("."));
            parent.join(self.mode.default_file_name())
        })
    }

    /// Output path, refused when it resolves to the input workbook.
    pub fn validate_output_path(&self) -> Result<PathBuf> {
        let path_output = self.output_path();
        let if_same_file = path_output == self.input
            || matches!(
                (std::fs::canonicalize(&path_output), std::fs::canonicalize(&self.input)),
                (Ok(path_a), Ok(path_b)) if path_a == path_b
            );
        if if_same_file {
            bail!(
                "Output {} would overwrite the input workbook; pass -o with another path",
                path_output.display()
            );
        }
        Ok(path_output)
    }

    /// Pipeline configuration from defaults, the rules file and flags.
    pub fn build_pipeline_options(&self) -> Result<SpecPipelineOptions> {
        if !(0.0..1.0).contains(&self.parse_ratio) {
            bail!(
                "--parse-ratio must be in [0, 1), got {}",
                self.parse_ratio
            );
        }
        if self.header_rows.is_empty() || self.header_rows.contains(&0) {
            bail!("--header-rows takes 1-based row numbers, got {:?}", self.header_rows);
        }

        let mut options = SpecPipelineOptions::default();
        if let Some(path_rules) = &self.rules {
            let txt = std::fs::read_to_string(path_rules)
                .with_context(|| format!("Failed to read rules file {}", path_rules.display()))?;
            options.rules = SpecOrderRules::from_json_str(&txt)
                .with_context(|| format!("Invalid rules file {}", path_rules.display()))?;
        }
        options.policy_time_sort.thr_ratio_parsed_min = self.parse_ratio;
        options.rows_header_candidates =
            Some(self.header_rows.iter().map(|n_row| n_row - 1).collect());
        Ok(options)
    }
}
