// src/telemetry.rs

//! Installs a `tracing` subscriber for binaries, demos and tests.
//!
//! The library itself only emits events; nothing is printed until a
//! subscriber is installed.

use crate::core::{QvmError, Result};
use tracing_subscriber::EnvFilter;

/// Installs a formatted subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (for example `"mbqc=debug"`).
///
/// Calling it again once a global subscriber exists is a no-op.
pub fn init_tracing(default_directive: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive).map_err(|err| QvmError::Config {
            message: format!("invalid tracing directive \"{}\": {}", default_directive, err),
        })?,
    };
    // try_init fails only when a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
    Ok(())
}

/// Subscriber for test binaries: output is captured by the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        assert!(init_tracing("mbqc=info").is_ok());
        assert!(init_tracing("mbqc=debug").is_ok());
        init_test_tracing();
    }
}
