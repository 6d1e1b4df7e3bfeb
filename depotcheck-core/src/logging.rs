//! Diagnostic logging to stderr. Reports go to stdout; logs never do.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins; otherwise `warn`, or
/// `depotcheck=debug` when `verbose`.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "warn,depotcheck=debug,depotcheck_core=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("initialize logging: {}", e))
}
