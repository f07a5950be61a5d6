//! Invocation models for repeated test runs
//!
//! Defines the invocation request, per-process results, and run summaries.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of repeated invocations
pub const DEFAULT_TIMES: u32 = 2;

/// Immutable description of one repeated-invocation run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationSpec {
    /// Command name, resolved via PATH
    pub command: String,

    /// Arguments passed to every invocation
    #[serde(default)]
    pub args: Vec<String>,

    /// How many child processes to launch
    #[serde(default = "default_times")]
    pub times: u32,
}

fn default_times() -> u32 {
    DEFAULT_TIMES
}

impl InvocationSpec {
    /// Create a spec with the default repeat count
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            times: DEFAULT_TIMES,
        }
    }

    /// Set arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set repeat count
    pub fn with_times(mut self, times: u32) -> Self {
        self.times = times;
        self
    }

    /// Command line as it would appear in a shell
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

impl fmt::Display for InvocationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` x{}", self.command_line(), self.times)
    }
}

/// How a single invocation ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    /// Process exited zero
    Passed,
    /// Process exited non-zero or was killed by a signal
    Failed,
    /// Process never started (binary not found, permission denied)
    SpawnFailed,
}

impl InvocationStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            InvocationStatus::Passed => "✓",
            InvocationStatus::Failed => "✗",
            InvocationStatus::SpawnFailed => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InvocationStatus::Passed)
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationStatus::Passed => write!(f, "PASS"),
            InvocationStatus::Failed => write!(f, "FAIL"),
            InvocationStatus::SpawnFailed => write!(f, "SPAWN ERROR"),
        }
    }
}

/// Outcome of a single child process
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvocationResult {
    /// Zero-based position in the spawn order
    pub seq: u32,
    pub status: InvocationStatus,
    /// Exit code, absent on spawn failure or signal death
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub message: Option<String>,
}

impl InvocationResult {
    pub fn passed(seq: u32, duration_ms: u64) -> Self {
        Self {
            seq,
            status: InvocationStatus::Passed,
            exit_code: Some(0),
            duration_ms,
            message: None,
        }
    }

    pub fn failed(seq: u32, exit_code: i32, duration_ms: u64) -> Self {
        Self {
            seq,
            status: InvocationStatus::Failed,
            exit_code: Some(exit_code),
            duration_ms,
            message: Some(format!("exited with code {exit_code}")),
        }
    }

    /// Killed by a signal, no exit code available
    pub fn signalled(seq: u32, duration_ms: u64, detail: impl Into<String>) -> Self {
        Self {
            seq,
            status: InvocationStatus::Failed,
            exit_code: None,
            duration_ms,
            message: Some(detail.into()),
        }
    }

    pub fn spawn_failed(seq: u32, error: impl Into<String>) -> Self {
        Self {
            seq,
            status: InvocationStatus::SpawnFailed,
            exit_code: None,
            duration_ms: 0,
            message: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl fmt::Display for InvocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} invocation #{} {} [{}ms]",
            self.status.symbol(),
            self.seq + 1,
            self.status,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Summary of one full repeated-invocation run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// Round number, 1 for single-round runs
    pub round: u32,
    /// Command line that was invoked
    pub command_line: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub spawn_errors: usize,
    /// Wall-clock time of the whole joined set
    pub duration_ms: u64,
    pub results: Vec<InvocationResult>,
}

impl RunSummary {
    pub fn new(
        round: u32,
        command_line: impl Into<String>,
        duration_ms: u64,
        results: Vec<InvocationResult>,
    ) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.is_success()).count();
        let failed = results
            .iter()
            .filter(|r| r.status == InvocationStatus::Failed)
            .count();
        let spawn_errors = results
            .iter()
            .filter(|r| r.status == InvocationStatus::SpawnFailed)
            .count();

        Self {
            round,
            command_line: command_line.into(),
            total,
            passed,
            failed,
            spawn_errors,
            duration_ms,
            results,
        }
    }

    /// True iff every invocation exited zero
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "round {}: {}/{} passed ({:.1}%) in {}ms",
            self.round,
            self.passed,
            self.total,
            self.pass_rate(),
            self.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults() {
        let spec = InvocationSpec::new("npm").with_args(["test"]);
        assert_eq!(spec.times, 2);
        assert_eq!(spec.command_line(), "npm test");
    }

    #[test]
    fn test_spec_display() {
        let spec = InvocationSpec::new("cargo")
            .with_args(["test", "--release"])
            .with_times(3);
        assert_eq!(spec.to_string(), "`cargo test --release` x3");
    }

    #[test]
    fn test_status_success() {
        assert!(InvocationStatus::Passed.is_success());
        assert!(!InvocationStatus::Failed.is_success());
        assert!(!InvocationStatus::SpawnFailed.is_success());
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            InvocationResult::passed(0, 120),
            InvocationResult::failed(1, 1, 80),
            InvocationResult::spawn_failed(2, "No such file or directory"),
        ];
        let summary = RunSummary::new(1, "sh -c true", 150, results);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.spawn_errors, 1);
        assert!(!summary.all_passed());
    }

    #[test]
    fn test_summary_all_passed() {
        let results = vec![
            InvocationResult::passed(0, 10),
            InvocationResult::passed(1, 12),
        ];
        let summary = RunSummary::new(1, "true", 13, results);
        assert!(summary.all_passed());
        assert!((summary.pass_rate() - 100.0).abs() < f64::EPSILON);
    }
}
