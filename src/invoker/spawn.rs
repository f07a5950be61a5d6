//! Single invocation spawning
//!
//! Launches one child process with inherited standard streams and
//! classifies how it ended.

use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::models::{InvocationResult, InvocationSpec};
use crate::utils::Timer;

/// Run one invocation of the spec's command and wait for it to exit.
///
/// The child inherits stdin/stdout/stderr, so its output lands on the
/// parent console interleaved with any sibling invocations. A spawn
/// error and a non-zero exit are recorded as distinct statuses; both
/// count as failure for the aggregate.
pub async fn invoke_once(seq: u32, spec: &InvocationSpec) -> InvocationResult {
    debug!("Spawning invocation #{} of `{}`", seq + 1, spec.command_line());
    let timer = Timer::start(format!("invocation #{}", seq + 1));

    let status = Command::new(&spec.command)
        .args(&spec.args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await;

    let duration_ms = timer.elapsed_ms();

    match status {
        Ok(status) => match status.code() {
            Some(0) => InvocationResult::passed(seq, duration_ms),
            Some(code) => InvocationResult::failed(seq, code, duration_ms),
            None => InvocationResult::signalled(seq, duration_ms, status.to_string()),
        },
        Err(e) => InvocationResult::spawn_failed(seq, e.to_string()),
    }
}

/// Resolve a command name to an executable path via PATH.
///
/// Used by the preflight check; the run itself lets the spawn fail and
/// records the error instead of pre-checking.
pub fn resolve_command(command: &str) -> Option<PathBuf> {
    let candidate = PathBuf::from(command);
    if candidate.components().count() > 1 {
        return is_executable(&candidate).then_some(candidate);
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(command))
        .find(|p| is_executable(p))
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &std::path::Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvocationStatus;

    #[tokio::test]
    async fn test_invoke_once_zero_exit() {
        let spec = InvocationSpec::new("true");
        let result = invoke_once(0, &spec).await;
        assert_eq!(result.status, InvocationStatus::Passed);
        assert_eq!(result.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_invoke_once_nonzero_exit() {
        let spec = InvocationSpec::new("false");
        let result = invoke_once(0, &spec).await;
        assert_eq!(result.status, InvocationStatus::Failed);
        assert_eq!(result.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_invoke_once_exit_code_preserved() {
        let spec = InvocationSpec::new("sh").with_args(["-c", "exit 7"]);
        let result = invoke_once(3, &spec).await;
        assert_eq!(result.status, InvocationStatus::Failed);
        assert_eq!(result.exit_code, Some(7));
        assert_eq!(result.seq, 3);
    }

    #[tokio::test]
    async fn test_invoke_once_spawn_error() {
        let spec = InvocationSpec::new("flakecheck-no-such-binary");
        let result = invoke_once(0, &spec).await;
        assert_eq!(result.status, InvocationStatus::SpawnFailed);
        assert_eq!(result.exit_code, None);
        assert!(result.message.is_some());
    }

    #[test]
    fn test_resolve_command_found() {
        assert!(resolve_command("sh").is_some());
    }

    #[test]
    fn test_resolve_command_missing() {
        assert!(resolve_command("flakecheck-no-such-binary").is_none());
    }
}
