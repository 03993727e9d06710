//! Logging utilities

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the fallback log level
pub const LOG_LEVEL_ENV: &str = "VIBE_LOG_LEVEL";

/// Build the filter: `RUST_LOG` wins, then `VIBE_LOG_LEVEL`, then `info`
pub fn build_filter() -> EnvFilter {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
    EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into())
}

/// Initialize the global logging system
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let result = tracing_subscriber::registry()
        .with(build_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if result.is_ok() {
        tracing::debug!("Logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }

    #[test]
    fn test_build_filter() {
        let filter = build_filter();
        assert!(!filter.to_string().is_empty());
    }
}
