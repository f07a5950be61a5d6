//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "FLAKECHECK";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Command from FLAKECHECK_COMMAND
    pub command: Option<String>,
    /// Repeat count from FLAKECHECK_TIMES
    pub times: Option<u32>,
    /// Rounds from FLAKECHECK_ROUNDS
    pub rounds: Option<u32>,
    /// Timeout from FLAKECHECK_TIMEOUT
    pub timeout: Option<u64>,
    /// Config file from FLAKECHECK_CONFIG
    pub config_file: Option<String>,
    /// Output format from FLAKECHECK_FORMAT
    pub format: Option<String>,
    /// Verbose from FLAKECHECK_VERBOSE
    pub verbose: Option<bool>,
    /// Log level from FLAKECHECK_LOG
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            command: get_env("COMMAND"),
            times: get_env_parse("TIMES"),
            rounds: get_env_parse("ROUNDS"),
            timeout: get_env_parse("TIMEOUT"),
            config_file: get_env("CONFIG"),
            format: get_env("FORMAT"),
            verbose: get_env_bool("VERBOSE"),
            log_level: get_env("LOG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.command.is_some()
            || self.times.is_some()
            || self.rounds.is_some()
            || self.timeout.is_some()
            || self.config_file.is_some()
            || self.format.is_some()
            || self.verbose.is_some()
            || self.log_level.is_some()
    }
}

fn get_env(suffix: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{suffix}")).ok()
}

fn get_env_parse<T: std::str::FromStr>(suffix: &str) -> Option<T> {
    get_env(suffix).and_then(|v| v.parse().ok())
}

fn get_env_bool(suffix: &str) -> Option<bool> {
    get_env(suffix).map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Print supported environment variables
pub fn print_env_help() {
    println!("Supported environment variables:\n");
    println!("  {ENV_PREFIX}_COMMAND   Command to invoke");
    println!("  {ENV_PREFIX}_TIMES     Number of concurrent invocations");
    println!("  {ENV_PREFIX}_ROUNDS    Number of sequential rounds");
    println!("  {ENV_PREFIX}_TIMEOUT   Wall-clock timeout in seconds");
    println!("  {ENV_PREFIX}_CONFIG    Path to config file");
    println!("  {ENV_PREFIX}_FORMAT    Output format (table, json, json-pretty, summary)");
    println!("  {ENV_PREFIX}_VERBOSE   Enable verbose logging");
    println!("  {ENV_PREFIX}_LOG       Log level (error, warn, info, debug, trace)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_env_has_none() {
        let config = EnvConfig::default();
        assert!(!config.has_any());
    }

    #[test]
    fn test_env_override_parsing() {
        env::set_var("FLAKECHECK_TIMES", "5");
        env::set_var("FLAKECHECK_VERBOSE", "true");

        let config = EnvConfig::load();
        assert_eq!(config.times, Some(5));
        assert_eq!(config.verbose, Some(true));
        assert!(config.has_any());

        env::remove_var("FLAKECHECK_TIMES");
        env::remove_var("FLAKECHECK_VERBOSE");
    }

    #[test]
    fn test_log_level_override() {
        env::set_var("FLAKECHECK_LOG", "trace");

        let config = EnvConfig::load();
        assert_eq!(config.log_level.as_deref(), Some("trace"));
        assert!(config.has_any());

        env::remove_var("FLAKECHECK_LOG");
    }
}
