//! Tracing subscriber setup.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Install the global subscriber: fmt layer plus an `EnvFilter` seeded
/// from the CLI verbosity and overridable via `RUST_LOG`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    // RUST_LOG=
    let default_level = verbosity_level.unwrap_or(Level::ERROR);
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let subscriber = Registry::default().with(fmt_layer).with(env_filter);

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")
}
