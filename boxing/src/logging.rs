//! Logging setup for the boxing phase
//!
//! The analyzers log through the `log` facade and open `tracing` spans per
//! unit; this module only installs an `env_logger` backend for binaries,
//! benches and tests that drive the phase directly.
//!
//! Levels:
//!
//! - `warn!` - a rule was skipped because of malformed input
//! - `info!` - pass start and end, with counts
//! - `debug!` - inherited decisions, per-unit summaries
//! - `trace!` - one line per annotated expression node
//!
//! ```bash
//! RUST_LOG=boxing=debug cargo test -p boxing
//! RUST_LOG=boxing::analysis::expression_boxing=trace cargo bench
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install the logger at `Warn`. Later calls are no-ops.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        let _ = Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {} - {}",
                    record.level(),
                    record.module_path().unwrap_or("boxing"),
                    record.args()
                )
            })
            .try_init();
    });
}

/// Install the logger from `RUST_LOG`, defaulting to `warn`
pub fn init_from_env() {
    INIT.call_once(|| {
        let _ = Builder::from_env(env_logger::Env::default().default_filter_or("warn")).try_init();
    });
}

/// Install the logger at a level named in configuration (`"debug"`, `"trace"`, ...).
/// Unknown names fall back to `RUST_LOG`.
pub fn init_from_name(level: &str) {
    match level.parse::<LevelFilter>() {
        Ok(level) => init_with_level(level),
        Err(_) => init_from_env(),
    }
}

/// Test logger: captured by the harness, quiet unless `RUST_LOG` says otherwise
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .parse_env("RUST_LOG")
        .is_test(true)
        .try_init();
}

pub fn is_initialized() -> bool {
    INIT.is_completed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_is_idempotent() {
        init_test();
        init_test();
        log::debug!("boxing logging smoke test");
    }

    #[test]
    fn test_level_names() {
        assert_eq!("trace".parse::<LevelFilter>().ok(), Some(LevelFilter::Trace));
        assert!("loud".parse::<LevelFilter>().is_err());
    }
}
