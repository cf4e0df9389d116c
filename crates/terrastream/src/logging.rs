//! Global logging setup for binaries.

use std::env;

use tracing_subscriber::fmt::{self, time::uptime};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use crate::error::{ClientError, ClientResult};

/// Default filter: our crates at info, everything else at warn.
pub const DEFAULT_FILTER: &str = "warn,terrastream=info,terrastream_terrain=info";

/// Builds the filter string: [`DEFAULT_FILTER`] followed by `RUST_LOG`, so
/// directives from the environment win.
#[must_use]
pub fn filter_directives(env_filter: Option<&str>) -> String {
    let mut filter = DEFAULT_FILTER.to_owned();
    if let Some(extra) = env_filter.filter(|s| !s.trim().is_empty()) {
        filter.push(',');
        filter.push_str(extra);
    }
    filter
}

/// Installs a compact stdout `tracing` subscriber honoring `RUST_LOG`.
///
/// # Errors
///
/// Returns [`ClientError::Logging`] for an unparsable filter or if a global
/// subscriber is already installed.
pub fn init_logging() -> ClientResult<()> {
    let env_filter = env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(filter_directives(env_filter.as_deref()))
        .map_err(|e| ClientError::Logging(e.to_string()))?;

    let format = fmt::format().compact().with_timer(uptime()).with_line_number(true);
    let subscriber = Registry::default().with(filter).with(fmt::layer().event_format(format));
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ClientError::Logging(e.to_string()))?;

    tracing::debug!("log subscriber installed");
    Ok(())
}
