//! Sheetorder command-line front end.
//!
//! - `args`    : clap argument model and pipeline configuration
//! - `logging` : tracing subscriber setup
//! - `preview` : comfy-table rendering of rows and reports
//! - `run`     : one read -> order -> write pass

pub mod args;
pub mod logging;
pub mod preview;
pub mod run;

pub use args::Cli;
pub use run::run_cli;
