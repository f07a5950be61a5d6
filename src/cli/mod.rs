//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Repeated test invocation tool for catching flaky test suites
#[derive(Parser, Debug)]
#[command(name = "flakecheck")]
#[command(version = "0.1.0")]
#[command(about = "Run a test command N times concurrently and fail if any run fails")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the repeated invocation
    Run(RunArgs),

    /// Check that the command is resolvable before running
    Check(CheckArgs),

    /// View stored run results
    Results(ResultsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Number of concurrent invocations
    #[arg(short, long)]
    pub times: Option<u32>,

    /// Number of sequential rounds of the full set
    #[arg(short, long)]
    pub rounds: Option<u32>,

    /// Wall-clock timeout in seconds over a whole round
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format (table, json, json-pretty, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Save the run summary to the results directory
    #[arg(short, long)]
    pub save: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Command and its arguments, usually after `--`
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,
}

/// Arguments for preflight check
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Command to resolve; falls back to the configured default
    pub command: Option<String>,
}

/// Arguments for results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    /// Show only the most recent run
    #[arg(short, long)]
    pub latest: bool,

    /// Show a specific run by ID
    #[arg(long)]
    pub id: Option<String>,

    /// Output format (table, json, json-pretty, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,
}

/// Arguments for configuration management
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./flakecheck.yaml")]
        output: String,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show effective configuration
    Show {
        /// Show environment variable overrides instead
        #[arg(short, long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate; defaults to the discovered config
        file: Option<String>,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. app.times)
        key: String,

        /// Value to set
        value: String,

        /// Config file path
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Get a configuration value
    Get {
        /// Configuration key (e.g. app.times)
        key: String,

        /// Config file path
        #[arg(short, long)]
        file: Option<String>,
    },

    /// List supported environment variables
    Env,
}
