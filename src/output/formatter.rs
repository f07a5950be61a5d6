//! Output formatters for run results
//!
//! Provides JSON, Table, and summary output formats.

#![allow(dead_code)]

use crate::invoker::RoundAggregate;
use crate::models::{InvocationResult, InvocationStatus, RunSummary};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format a single invocation result
    pub fn format_result(&self, result: &InvocationResult) -> String {
        match self.format {
            OutputFormat::Table => self.format_result_line(result),
            OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Summary => result.to_string(),
        }
    }

    fn format_result_line(&self, result: &InvocationResult) -> String {
        let status_str = if self.colorize {
            match result.status {
                InvocationStatus::Passed => "\x1b[32m✓ PASS\x1b[0m",
                InvocationStatus::Failed => "\x1b[31m✗ FAIL\x1b[0m",
                InvocationStatus::SpawnFailed => "\x1b[31m! SPAWN ERROR\x1b[0m",
            }
        } else {
            match result.status {
                InvocationStatus::Passed => "✓ PASS",
                InvocationStatus::Failed => "✗ FAIL",
                InvocationStatus::SpawnFailed => "! SPAWN ERROR",
            }
        };

        let code = result
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "#{:<3} {} exit={:<3} [{:>6}ms]{}",
            result.seq + 1,
            status_str,
            code,
            result.duration_ms,
            result
                .message
                .as_deref()
                .map(|m| format!(" {m}"))
                .unwrap_or_default()
        )
    }

    /// Format a run summary
    pub fn format_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Summary => summary.to_string(),
        }
    }

    fn format_summary_table(&self, summary: &RunSummary) -> String {
        let mut output = String::new();

        output.push_str("\n──────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            " Round {} - {}\n",
            summary.round, summary.command_line
        ));
        output.push_str("──────────────────────────────────────────────────────────────\n");

        for result in &summary.results {
            output.push_str(&format!(" {}\n", self.format_result_line(result)));
        }

        output.push_str("──────────────────────────────────────────────────────────────\n");

        let pass_str = if self.colorize {
            format!("\x1b[32m{}\x1b[0m", summary.passed)
        } else {
            summary.passed.to_string()
        };
        let fail_count = summary.failed + summary.spawn_errors;
        let fail_str = if self.colorize && fail_count > 0 {
            format!("\x1b[31m{fail_count}\x1b[0m")
        } else {
            fail_count.to_string()
        };

        output.push_str(&format!(
            " Total: {} | Pass: {} | Fail: {} | Pass Rate: {:.1}% | {}ms\n",
            summary.total,
            pass_str,
            fail_str,
            summary.pass_rate(),
            summary.duration_ms
        ));
        output.push_str("──────────────────────────────────────────────────────────────\n");

        output
    }

    /// Format aggregate statistics across rounds
    pub fn format_aggregate(&self, aggregate: &RoundAggregate, command_line: &str) -> String {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => {
                let value = serde_json::json!({
                    "command_line": command_line,
                    "rounds": aggregate.rounds,
                    "clean_rounds": aggregate.clean_rounds,
                    "total_invocations": aggregate.total_invocations,
                    "passed": aggregate.passed,
                    "pass_rate": aggregate.pass_rate,
                    "flaky": aggregate.is_flaky(),
                    "total_duration_ms": aggregate.total_duration_ms,
                });
                if self.format == OutputFormat::JsonPretty {
                    serde_json::to_string_pretty(&value).unwrap_or_default()
                } else {
                    value.to_string()
                }
            }
            _ => {
                let verdict = if aggregate.all_clean() {
                    "stable"
                } else if aggregate.is_flaky() {
                    "FLAKY"
                } else {
                    "always failing"
                };

                format!(
                    "\n {} across {} rounds: {} clean, {}/{} invocations passed ({:.1}%) - {} [{}ms]\n",
                    command_line,
                    aggregate.rounds,
                    aggregate.clean_rounds,
                    aggregate.passed,
                    aggregate.total_invocations,
                    aggregate.pass_rate,
                    verdict,
                    aggregate.total_duration_ms
                )
            }
        }
    }
}
