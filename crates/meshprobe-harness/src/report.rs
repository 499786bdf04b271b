//! Builder-pattern recorder for one harness run, plus console rendering.
//!
//! ```
//! # use meshprobe_harness::report::{RunRecorder, Verdict};
//! let mut run = RunRecorder::new("/usr/local/bin/meshprobe");
//! run.record_skipped("build_and_flash_firmware", "flashing is never automated");
//! let summary = run.finalize();
//! assert_eq!(summary.verdict, Verdict::AllWorking);
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::runner::{CaseReport, Outcome};
use crate::status::{DeviceStatus, NetworkHealth};

/// Overall judgement of a run.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every case passed.
    AllWorking,
    /// More than three quarters passed.
    MostlyWorking,
    NeedsAttention,
}

impl Verdict {
    pub fn from_counts(successes: usize, total: usize) -> Self {
        if successes == total {
            Self::AllWorking
        } else if successes * 4 > total * 3 {
            Self::MostlyWorking
        } else {
            Self::NeedsAttention
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::AllWorking => "ALL TOOLS WORKING!",
            Self::MostlyWorking => "MOSTLY WORKING - minor issues to resolve",
            Self::NeedsAttention => "NEEDS ATTENTION - several tools need debugging",
        }
    }
}

/// Device status with its health grade, as reported in the summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusReport {
    #[serde(flatten)]
    pub status: DeviceStatus,
    pub health: NetworkHealth,
}

/// The finished record of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub binary: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub cases: Vec<CaseReport>,
    pub device_status: Option<StatusReport>,
    pub successes: usize,
    pub total: usize,
    pub verdict: Verdict,
}

/// Records case results as the run progresses.
pub struct RunRecorder {
    binary: String,
    started_at: DateTime<Utc>,
    cases: Vec<CaseReport>,
    device_status: Option<StatusReport>,
}

impl RunRecorder {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            started_at: Utc::now(),
            cases: Vec::new(),
            device_status: None,
        }
    }

    pub fn record(&mut self, report: CaseReport) {
        self.cases.push(report);
    }

    /// Record a step that is reported as passing without being run.
    pub fn record_skipped(&mut self, name: &str, note: &str) {
        self.cases.push(CaseReport {
            name: name.to_string(),
            args: Vec::new(),
            outcome: Outcome::Skipped {
                note: note.to_string(),
            },
            duration_ms: 0,
        });
    }

    /// Attach the device status parsed from the status case's output.
    pub fn set_device_status(&mut self, status: DeviceStatus) {
        let health = status.health();
        self.device_status = Some(StatusReport { status, health });
    }

    pub fn finalize(self) -> RunSummary {
        let total = self.cases.len();
        let successes = self.cases.iter().filter(|c| c.passed()).count();
        RunSummary {
            binary: self.binary,
            started_at: self.started_at,
            completed_at: Utc::now(),
            cases: self.cases,
            device_status: self.device_status,
            successes,
            total,
            verdict: Verdict::from_counts(successes, total),
        }
    }
}

const RULE_WIDTH: usize = 60;

/// Console block for one finished case.
pub fn render_case(report: &CaseReport) -> String {
    let mut out = String::new();
    match &report.outcome {
        Outcome::Success { stdout, stderr } => {
            out.push_str("SUCCESS\n");
            out.push_str(&format!("Output:\n{stdout}"));
            if !stderr.trim().is_empty() {
                out.push_str(&format!("Warnings:\n{stderr}"));
            }
        }
        Outcome::Failed {
            code,
            stdout,
            stderr,
        } => {
            let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
            out.push_str("FAILED\n");
            out.push_str(&format!("Error (code {code}):\n{stderr}"));
            if !stdout.trim().is_empty() {
                out.push_str(&format!("Partial output:\n{stdout}"));
            }
        }
        Outcome::Timeout { after_secs } => {
            out.push_str(&format!("TIMEOUT (after {after_secs}s)\n"));
        }
        Outcome::Exception { error } => {
            out.push_str(&format!("EXCEPTION: {error}\n"));
        }
        Outcome::Skipped { note } => {
            out.push_str(&format!("SKIPPED ({note}), counted as passing\n"));
        }
    }
    out
}

/// Final summary block.
pub fn render_summary(summary: &RunSummary) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = format!("\n{rule}\nTOOLS TEST SUMMARY\n{rule}\n");

    out.push_str(&format!(
        "Successful: {}/{} tools\n",
        summary.successes, summary.total
    ));
    out.push_str(&format!(
        "Failed: {}/{} tools\n",
        summary.total - summary.successes,
        summary.total
    ));

    for case in summary.cases.iter().filter(|c| !c.passed()) {
        out.push_str(&format!("  - {}: {}\n", case.name, case.outcome.label()));
    }

    if let Some(report) = &summary.device_status {
        let status = &report.status;
        out.push_str(&format!(
            "Device: {} ({}), {} mesh node(s), network health {}\n",
            status.node_name.as_deref().unwrap_or("Unknown"),
            status.node_id.as_deref().unwrap_or("Unknown"),
            status.mesh_nodes,
            report.health.as_str()
        ));
    }

    out.push_str(&format!("\n{}\n", summary.verdict.message()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(name: &str, outcome: Outcome) -> CaseReport {
        CaseReport {
            name: name.to_string(),
            args: vec![],
            outcome,
            duration_ms: 5,
        }
    }

    fn success() -> Outcome {
        Outcome::Success {
            stdout: "ok\n".to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(Verdict::from_counts(8, 8), Verdict::AllWorking);
        assert_eq!(Verdict::from_counts(7, 8), Verdict::MostlyWorking);
        // Exactly 75% is not "more than three quarters".
        assert_eq!(Verdict::from_counts(6, 8), Verdict::NeedsAttention);
        assert_eq!(Verdict::from_counts(0, 8), Verdict::NeedsAttention);
        assert_eq!(Verdict::from_counts(0, 0), Verdict::AllWorking);
    }

    #[test]
    fn test_recorder_counts_skipped_as_passing() {
        let mut run = RunRecorder::new("meshprobe");
        run.record(case("status", success()));
        run.record(case("find", Outcome::Timeout { after_secs: 20 }));
        run.record_skipped("build_and_flash_firmware", "never automated");

        let summary = run.finalize();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.successes, 2);
        assert_eq!(summary.verdict, Verdict::NeedsAttention);
        assert!(summary.completed_at >= summary.started_at);
    }

    #[test]
    fn test_device_status_graded() {
        let mut run = RunRecorder::new("meshprobe");
        run.set_device_status(DeviceStatus {
            connected: true,
            mesh_nodes: 2,
            ..Default::default()
        });
        let summary = run.finalize();
        assert_eq!(summary.device_status.unwrap().health, NetworkHealth::Good);
    }

    #[test]
    fn test_render_case_blocks() {
        let failed = render_case(&case(
            "send",
            Outcome::Failed {
                code: Some(1),
                stdout: "Connecting to device...\n".to_string(),
                stderr: "Error: No device found\n".to_string(),
            },
        ));
        assert!(failed.starts_with("FAILED\n"));
        assert!(failed.contains("Error (code 1):\nError: No device found"));
        assert!(failed.contains("Partial output:\nConnecting to device..."));

        let ok = render_case(&case("status", success()));
        assert_eq!(ok, "SUCCESS\nOutput:\nok\n");
    }

    #[test]
    fn test_render_summary_lists_failures() {
        let mut run = RunRecorder::new("meshprobe");
        run.record(case("status", success()));
        run.record(case(
            "find",
            Outcome::Exception {
                error: "not found".to_string(),
            },
        ));
        let text = render_summary(&run.finalize());

        assert!(text.contains("Successful: 1/2 tools"));
        assert!(text.contains("Failed: 1/2 tools"));
        assert!(text.contains("  - find: EXCEPTION"));
        assert!(text.contains(Verdict::NeedsAttention.message()));
    }

    #[test]
    fn test_summary_json_shape() {
        let mut run = RunRecorder::new("meshprobe");
        run.record(case("status", success()));
        let json = serde_json::to_value(run.finalize()).unwrap();

        assert_eq!(json["verdict"], "all_working");
        assert_eq!(json["cases"][0]["outcome"], "success");
        assert_eq!(json["cases"][0]["stdout"], "ok\n");
        assert!(json["device_status"].is_null());
    }
}
