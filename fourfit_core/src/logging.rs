//! Tracing setup for the `fourfit` binary.
//!
//! Command results are printed on stdout (plain text or `--json`), so every
//! diagnostic goes to stderr. The remote-fallback notices are emitted at
//! `warn`, which is why that is the default level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when `RUST_LOG` is unset: fallback and mirror warnings only
pub const DEFAULT_LEVEL: &str = "warn";

/// Install the stderr subscriber at [`DEFAULT_LEVEL`]
pub fn init() {
    init_with_level(DEFAULT_LEVEL)
}

/// Install the stderr subscriber; `RUST_LOG` takes precedence over `default_level`
///
/// `RUST_LOG=fourfit_core=debug` shows each store read/write and remote call.
pub fn init_with_level(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Route unit-test logs through the test harness so they show only on failure
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_warn() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(env_filter(DEFAULT_LEVEL).to_string(), "warn");
    }

    #[test]
    fn test_init_test_can_run_repeatedly() {
        init_test();
        init_test();
        tracing::warn!("still logging after repeated init");
    }
}
