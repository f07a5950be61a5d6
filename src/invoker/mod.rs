//! Invocation engine
//!
//! Spawns the configured command as concurrent child processes and
//! aggregates their exit codes.

mod parallel;
mod spawn;

pub use parallel::{BatchRunner, RepeatedInvoker, RoundAggregate};
pub use spawn::{invoke_once, resolve_command};

use thiserror::Error;

use crate::models::RunSummary;

/// Run-level failure taxonomy
///
/// Individual invocation failures are never surfaced one by one; they
/// collapse into `TestsFailed` after the full set has exited.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    /// At least one invocation exited non-zero or failed to start
    #[error("some tests have failed ({failed} of {total} invocations)")]
    TestsFailed { failed: usize, total: usize },

    /// The joined set did not complete within the configured wall clock
    #[error("run timed out after {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },
}

/// Collapse a completed round into the aggregate pass/fail verdict.
pub fn verdict(summary: &RunSummary) -> Result<(), RunError> {
    if summary.all_passed() {
        Ok(())
    } else {
        Err(RunError::TestsFailed {
            failed: summary.total - summary.passed,
            total: summary.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvocationResult;

    #[test]
    fn test_verdict_collapses_mixed_results() {
        let clean = RunSummary::new(1, "t", 3, vec![InvocationResult::passed(0, 3)]);
        assert!(verdict(&clean).is_ok());

        let dirty = RunSummary::new(
            1,
            "t",
            3,
            vec![
                InvocationResult::passed(0, 3),
                InvocationResult::failed(1, 2, 3),
            ],
        );
        assert_eq!(
            verdict(&dirty).unwrap_err(),
            RunError::TestsFailed { failed: 1, total: 2 }
        );
    }

    #[test]
    fn test_error_messages() {
        let err = RunError::TestsFailed {
            failed: 1,
            total: 2,
        };
        assert_eq!(err.to_string(), "some tests have failed (1 of 2 invocations)");

        let err = RunError::TimedOut { timeout_ms: 50000 };
        assert_eq!(err.to_string(), "run timed out after 50000ms");
    }
}
