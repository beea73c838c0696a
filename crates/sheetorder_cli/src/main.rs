//! Sheetorder: reorder a worksheet by canonical college order or by time.

use anyhow::Result;
use clap::Parser;

use sheetorder_cli::{Cli, logging::init_logging, run_cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    run_cli(&cli)
}
