//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Logs go to stderr in compact form so stdout stays reserved for previews
//! and the run summary. `RUST_LOG` overrides the `-v` derived level.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Map `-v` count to a level: warn, info, debug, then trace.
pub fn derive_level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber; call once at startup.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let filter = build_env_filter(derive_level_from_verbosity(verbosity));
    let layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|err| anyhow!("Failed to initialize logging: {err}"))
}

fn build_env_filter(level: Level) -> EnvFilter {
    let level_str = level.as_str().to_lowercase();

    // Dependencies stay at warn.
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,sheetorder_cli={level},sheetorder_rank={level},sheetorder_io_xlsx={level}",
            level = level_str
        ))
    })
}
