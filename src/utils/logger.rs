//! Logging utilities using the tracing framework

use std::fmt::Display;
use tracing_subscriber::EnvFilter;

/// Map the `-v` count to a tracing level directive
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",  // Default: progress of the setup steps
        1 => "debug", // -v: rendered manifests, config paths
        _ => "trace", // -vv: everything, including kube client internals
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the verbosity flag.
pub fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbose)));

    // A second init (e.g. from tests) is not an error worth reporting
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log an informational message (wrapper around tracing::info)
pub fn log_info<T: Display>(msg: T) {
    tracing::info!("{}", msg);
}

/// Log a warning message (wrapper around tracing::warn)
pub fn log_warn<T: Display>(msg: T) {
    tracing::warn!("{}", msg);
}

/// Macro for convenient info logging
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::utils::logger::log_info(format!($($arg)*))
    };
}

/// Macro for convenient warning logging
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::utils::logger::log_warn(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_functions() {
        // These should not panic, with or without a subscriber
        log_info("Test info message");
        log_warn("Test warning message");
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0), "info");
        assert_eq!(level_for_verbosity(1), "debug");
        assert_eq!(level_for_verbosity(2), "trace");
        assert_eq!(level_for_verbosity(7), "trace");
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(0);
        init_logging(2);
    }
}
