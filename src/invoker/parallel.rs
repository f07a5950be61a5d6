//! Parallel repeated invocation
//!
//! Launches all invocations at once and joins the full set before
//! evaluating the aggregate pass/fail predicate.

#![allow(dead_code)]

use futures::future::join_all;
use std::time::Duration;
use tracing::{info, warn};

use super::spawn::invoke_once;
use super::RunError;
use crate::models::{InvocationResult, InvocationSpec, RunSummary};
use crate::utils::Timer;

/// Repeated test invoker
///
/// Spawns `spec.times` independent child processes without sequencing or
/// throttling, then suspends at a single join over all of them. There is
/// no short-circuit: a failing invocation does not stop its siblings.
pub struct RepeatedInvoker {
    spec: InvocationSpec,
    timeout: Option<Duration>,
}

impl RepeatedInvoker {
    pub fn new(spec: InvocationSpec) -> Self {
        Self {
            spec,
            timeout: None,
        }
    }

    /// Apply a wall-clock timeout over the whole joined set
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn spec(&self) -> &InvocationSpec {
        &self.spec
    }

    /// Run all invocations concurrently and collect every exit.
    ///
    /// Returns a summary once every child has exited. `Err` is reserved
    /// for the run not completing at all (timeout); a run where children
    /// exited non-zero still yields `Ok`, with the verdict left to
    /// [`RunSummary::all_passed`] or [`super::verdict`].
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        self.run_round(1).await
    }

    pub(super) async fn run_round(&self, round: u32) -> Result<RunSummary, RunError> {
        info!("Launching {} concurrent invocations of {}", self.spec.times, self.spec);

        let timer = Timer::start(format!("round {round}"));
        let mut handles = Vec::with_capacity(self.spec.times as usize);

        for seq in 0..self.spec.times {
            let spec = self.spec.clone();
            handles.push(tokio::spawn(async move { invoke_once(seq, &spec).await }));
        }

        let joined = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, join_all(handles))
                .await
                .map_err(|_| {
                    warn!(
                        "Run did not complete within {}ms; children are left running",
                        timeout.as_millis()
                    );
                    RunError::TimedOut {
                        timeout_ms: timeout.as_millis() as u64,
                    }
                })?,
            None => join_all(handles).await,
        };

        let results: Vec<InvocationResult> = joined
            .into_iter()
            .enumerate()
            .map(|(seq, joined)| match joined {
                Ok(result) => result,
                // A panicked task never produced a result; treat it like
                // a process that never started.
                Err(e) => InvocationResult::spawn_failed(seq as u32, e.to_string()),
            })
            .collect();

        let summary = RunSummary::new(
            round,
            self.spec.command_line(),
            timer.elapsed_ms(),
            results,
        );

        info!("{summary}");
        Ok(summary)
    }
}

/// Batch runner for multiple sequential rounds of the repeated set
pub struct BatchRunner {
    invoker: RepeatedInvoker,
    rounds: u32,
}

impl BatchRunner {
    pub fn new(invoker: RepeatedInvoker, rounds: u32) -> Self {
        Self { invoker, rounds }
    }

    /// Run the full repeated set `rounds` times, one round after another.
    pub async fn run_rounds(&self) -> Result<Vec<RunSummary>, RunError> {
        info!("Running {} rounds of {}", self.rounds, self.invoker.spec());

        let timer = Timer::start(format!("{} rounds", self.rounds));
        let mut summaries = Vec::with_capacity(self.rounds as usize);
        for round in 1..=self.rounds {
            let summary = self.invoker.run_round(round).await?;
            summaries.push(summary);
        }
        timer.stop();

        Ok(summaries)
    }

    /// Aggregate pass rates across rounds
    pub fn aggregate(summaries: &[RunSummary]) -> RoundAggregate {
        let rounds = summaries.len() as u32;
        let total_invocations: usize = summaries.iter().map(|s| s.total).sum();
        let passed: usize = summaries.iter().map(|s| s.passed).sum();
        let clean_rounds = summaries.iter().filter(|s| s.all_passed()).count() as u32;
        let total_duration_ms: u64 = summaries.iter().map(|s| s.duration_ms).sum();

        let pass_rate = if total_invocations == 0 {
            0.0
        } else {
            (passed as f64 / total_invocations as f64) * 100.0
        };

        RoundAggregate {
            rounds,
            clean_rounds,
            total_invocations,
            passed,
            pass_rate,
            total_duration_ms,
        }
    }
}

/// Aggregate statistics across multiple rounds
#[derive(Clone, Debug)]
pub struct RoundAggregate {
    pub rounds: u32,
    /// Rounds in which every invocation passed
    pub clean_rounds: u32,
    pub total_invocations: usize,
    pub passed: usize,
    pub pass_rate: f64,
    pub total_duration_ms: u64,
}

impl RoundAggregate {
    /// A command is flaky when some, but not all, rounds were clean
    pub fn is_flaky(&self) -> bool {
        self.clean_rounds > 0 && self.clean_rounds < self.rounds
    }

    pub fn all_clean(&self) -> bool {
        self.clean_rounds == self.rounds
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::invoker::verdict;
    use crate::models::InvocationStatus;

    #[tokio::test]
    async fn test_two_passing_invocations_succeed() {
        let invoker = RepeatedInvoker::new(InvocationSpec::new("true"));
        let summary = invoker.run().await.unwrap();
        assert_eq!(summary.total, 2);
        assert!(summary.all_passed());
        assert!(verdict(&summary).is_ok());
    }

    #[tokio::test]
    async fn test_one_failure_dooms_the_run() {
        // mkdir is atomic, so with two concurrent invocations exactly one
        // succeeds and one exits non-zero regardless of timing.
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("once");
        let spec = InvocationSpec::new("sh").with_args([
            "-c".to_string(),
            format!("mkdir {} 2>/dev/null", target.display()),
        ]);

        let invoker = RepeatedInvoker::new(spec);
        let summary = invoker.run().await.unwrap();
        let err = verdict(&summary).unwrap_err();
        assert!(matches!(
            err,
            RunError::TestsFailed { failed: 1, total: 2 }
        ));
    }

    #[tokio::test]
    async fn test_exact_invocation_count_without_short_circuit() {
        // Every invocation appends a line even though all of them fail,
        // proving all three ran to completion.
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("invocations.log");
        let spec = InvocationSpec::new("sh")
            .with_args([
                "-c".to_string(),
                format!("echo ran >> {}; exit 1", log.display()),
            ])
            .with_times(3);

        let summary = RepeatedInvoker::new(spec).run().await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.failed, 3);

        let lines = std::fs::read_to_string(&log).unwrap();
        assert_eq!(lines.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_three_passing_invocations() {
        let spec = InvocationSpec::new("true").with_times(3);
        let summary = RepeatedInvoker::new(spec).run().await.unwrap();
        assert_eq!(summary.total, 3);
        assert!(summary.all_passed());
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_from_aggregate_failure() {
        let spec = InvocationSpec::new("sleep").with_args(["5"]);
        let invoker = RepeatedInvoker::new(spec).with_timeout(Duration::from_millis(200));

        let err = invoker.run().await.unwrap_err();
        assert!(matches!(err, RunError::TimedOut { timeout_ms: 200 }));
    }

    #[tokio::test]
    async fn test_spawn_error_counts_as_failure() {
        let spec = InvocationSpec::new("flakecheck-no-such-binary");
        let summary = RepeatedInvoker::new(spec).run().await.unwrap();
        assert_eq!(summary.spawn_errors, 2);
        assert!(!summary.all_passed());
        assert!(summary
            .results
            .iter()
            .all(|r| r.status == InvocationStatus::SpawnFailed));
    }

    #[tokio::test]
    async fn test_idempotent_classification() {
        let invoker = RepeatedInvoker::new(InvocationSpec::new("true"));
        let first = invoker.run().await.unwrap();
        let second = invoker.run().await.unwrap();
        assert_eq!(first.all_passed(), second.all_passed());
    }

    #[tokio::test]
    async fn test_batch_rounds_and_aggregate() {
        let spec = InvocationSpec::new("true");
        let runner = BatchRunner::new(RepeatedInvoker::new(spec), 3);

        let summaries = runner.run_rounds().await.unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[2].round, 3);

        let aggregate = BatchRunner::aggregate(&summaries);
        assert_eq!(aggregate.rounds, 3);
        assert_eq!(aggregate.total_invocations, 6);
        assert!(aggregate.all_clean());
        assert!(!aggregate.is_flaky());
    }

    #[test]
    fn test_aggregate_flakiness() {
        let clean = RunSummary::new(1, "t", 5, vec![InvocationResult::passed(0, 5)]);
        let dirty = RunSummary::new(2, "t", 5, vec![InvocationResult::failed(0, 1, 5)]);

        let aggregate = BatchRunner::aggregate(&[clean, dirty]);
        assert_eq!(aggregate.clean_rounds, 1);
        assert!(aggregate.is_flaky());
        assert!((aggregate.pass_rate - 50.0).abs() < f64::EPSILON);
    }
}
