//! Runs one case as a child process under a timeout.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::process::Command;

use crate::cases::ToolCase;

/// How a case ended.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Exit status zero.
    Success { stdout: String, stderr: String },
    /// Non-zero exit. `code` is `None` when the child was killed by a signal.
    Failed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// Still running when the time limit passed; the child was killed.
    Timeout { after_secs: u64 },
    /// The child could not be started or waited on.
    Exception { error: String },
    /// Reported as passing without being run.
    Skipped { note: String },
}

impl Outcome {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Skipped { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "SUCCESS",
            Self::Failed { .. } => "FAILED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Exception { .. } => "EXCEPTION",
            Self::Skipped { .. } => "SKIPPED",
        }
    }
}

/// One case and how it went.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub args: Vec<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub duration_ms: u128,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.outcome.passed()
    }
}

/// Run `case` against `binary`. Never fails: every way a case can go wrong
/// is an [`Outcome`].
pub async fn run_case(binary: &Path, case: &ToolCase) -> CaseReport {
    let start = Instant::now();
    tracing::info!(case = %case.name, args = ?case.args, "Running case");

    let outcome = execute(binary, &case.args, case.timeout).await;
    let duration = start.elapsed();

    tracing::info!(
        case = %case.name,
        outcome = outcome.label(),
        duration_ms = duration.as_millis(),
        "Case finished"
    );

    CaseReport {
        name: case.name.clone(),
        args: case.args.clone(),
        outcome,
        duration_ms: duration.as_millis(),
    }
}

async fn execute(binary: &Path, args: &[String], limit: Duration) -> Outcome {
    let child = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) => {
            return Outcome::Exception {
                error: format!("{}: {e}", binary.display()),
            }
        }
    };

    // Dropping the wait future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Outcome::Exception { error: e.to_string() },
        Err(_) => {
            return Outcome::Timeout {
                after_secs: limit.as_secs(),
            }
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if output.status.success() {
        Outcome::Success { stdout, stderr }
    } else {
        Outcome::Failed {
            code: output.status.code(),
            stdout,
            stderr,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh_case(script: &str, timeout_ms: u64) -> ToolCase {
        ToolCase {
            name: "shell".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test]
    async fn test_success_captures_output() {
        let report = run_case(Path::new("/bin/sh"), &sh_case("echo hello; echo warn >&2", 5000)).await;
        assert!(report.passed());
        assert_eq!(
            report.outcome,
            Outcome::Success {
                stdout: "hello\n".to_string(),
                stderr: "warn\n".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_code_and_partial_output() {
        let report = run_case(
            Path::new("/bin/sh"),
            &sh_case("echo partial; echo broken >&2; exit 3", 5000),
        )
        .await;
        assert!(!report.passed());
        assert_eq!(
            report.outcome,
            Outcome::Failed {
                code: Some(3),
                stdout: "partial\n".to_string(),
                stderr: "broken\n".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let started = Instant::now();
        let report = run_case(Path::new("/bin/sh"), &sh_case("sleep 30", 200)).await;
        assert_eq!(report.outcome.label(), "TIMEOUT");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_binary_is_exception() {
        let report = run_case(Path::new("/nonexistent/meshprobe"), &sh_case("true", 1000)).await;
        assert!(matches!(report.outcome, Outcome::Exception { .. }));
        assert!(!report.passed());
    }
}
