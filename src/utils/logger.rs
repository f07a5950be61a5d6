//! Logging utilities
//!
//! Picks the effective log level from CLI flags and environment
//! overrides, then installs the subscriber.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Resolve the effective level: an explicit level name wins, then the
/// verbose flag (CLI or environment) bumps Info to Debug.
pub fn resolve_level(explicit: Option<&str>, verbose: bool) -> LogLevel {
    explicit.and_then(LogLevel::from_str).unwrap_or(if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    })
}

/// Initialize the logger with the resolved level.
///
/// RUST_LOG still takes precedence when set, e.g. RUST_LOG=flakecheck=trace.
pub fn init_logger(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flakecheck={}", level.to_tracing_level())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("unknown"), None);
    }

    #[test]
    fn test_resolve_level_explicit_wins() {
        assert_eq!(resolve_level(Some("trace"), false), LogLevel::Trace);
        assert_eq!(resolve_level(Some("warn"), true), LogLevel::Warn);
    }

    #[test]
    fn test_resolve_level_verbose_fallback() {
        assert_eq!(resolve_level(None, true), LogLevel::Debug);
        assert_eq!(resolve_level(None, false), LogLevel::Info);
        // Unparseable explicit level falls back to the verbose flag.
        assert_eq!(resolve_level(Some("loud"), true), LogLevel::Debug);
    }
}
