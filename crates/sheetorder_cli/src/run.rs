//! One read -> order -> write pass driven by parsed arguments.

use anyhow::{Context, Result};
use sheetorder_rank::SheetOrderPipeline;
use tracing::info;

use crate::args::Cli;
use crate::preview::{build_preview_table, build_report_table};

/// Order the input workbook and write the result to the output path.
///
/// No output file is written when any stage fails, and the input workbook is
/// never overwritten.
pub fn run_cli(cli: &Cli) -> Result<()> {
    let options = cli.build_pipeline_options()?;
    let pipeline = SheetOrderPipeline::new(options);
    let path_output = cli.validate_output_path()?;

    let v_bytes_in = std::fs::read(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let df = pipeline
        .load(&v_bytes_in)
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;
    let l_cols_text = pipeline.classify(&df)?;
    info!(
        rows = df.height(),
        cols = df.width(),
        cols_text = ?l_cols_text,
        "input loaded"
    );
    if cli.preview > 0 {
        println!("Before ({} rows):", df.height());
        println!("{}", build_preview_table(&df, cli.preview, &l_cols_text)?);
    }

    let (df_ordered, report) = pipeline.process(&df, cli.mode)?;
    if cli.preview > 0 {
        println!("After:");
        println!("{}", build_preview_table(&df_ordered, cli.preview, &l_cols_text)?);
    }

    let v_bytes_out = pipeline.export(&df_ordered, &l_cols_text)?;
    std::fs::write(&path_output, &v_bytes_out)
        .with_context(|| format!("Failed to write {}", path_output.display()))?;

    println!("{}", build_report_table(&report));
    println!("{report}");
    println!("Wrote {}", path_output.display());
    Ok(())
}
