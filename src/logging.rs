// ABOUTME: Structured logging setup for the long-running sync service
// ABOUTME: Initializes the tracing subscriber from RUST_LOG with sane defaults
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Logging initialization for operator-facing per-cycle output.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber from the environment.
///
/// `RUST_LOG` controls the filter; without it the service logs at `info`,
/// which yields one summary line per sync cycle plus provider-level warnings.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_from_env() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}
