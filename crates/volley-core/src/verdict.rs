use crate::ledger::EventAudit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Final outcome of a conformance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Every enabled check held.
    Pass,
    /// The SuT violated an asserted behavior.
    Failed(String),
    /// The environment prevented a conclusion.
    Inconclusive(String),
}

impl Verdict {
    /// Upper-case label.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Failed(_) => "FAILED",
            Verdict::Inconclusive(_) => "INCONCLUSIVE",
        }
    }

    /// Why the run did not pass.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Pass => None,
            Verdict::Failed(reason) | Verdict::Inconclusive(reason) => Some(reason),
        }
    }

    /// Whether the run passed.
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// Process exit code for the verdict.
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Pass => 0,
            Verdict::Failed(_) => 2,
            Verdict::Inconclusive(_) => 3,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{}: {}", self.label(), reason),
            None => f.write_str(self.label()),
        }
    }
}

/// Stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Wait for the SuT to join.
    WaitSutJoin,
    /// Consume interactions until the stop condition or timeout.
    WaitInteractions,
    /// Assert that no event has a failed or missing field.
    CheckParams,
    /// Assert that every detonation has a prior fire.
    CheckPairing,
    /// Wait for the SuT to resign.
    WaitSutResign,
    /// Terminal success.
    Done,
}

impl Stage {
    /// The stage that follows this one.
    pub fn next(self) -> Stage {
        match self {
            Stage::WaitSutJoin => Stage::WaitInteractions,
            Stage::WaitInteractions => Stage::CheckParams,
            Stage::CheckParams => Stage::CheckPairing,
            Stage::CheckPairing => Stage::WaitSutResign,
            Stage::WaitSutResign | Stage::Done => Stage::Done,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::WaitSutJoin => "wait_sut_join",
            Stage::WaitInteractions => "wait_interactions",
            Stage::CheckParams => "check_params",
            Stage::CheckPairing => "check_pairing",
            Stage::WaitSutResign => "wait_sut_resign",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Completed.
    Passed,
    /// Disabled by configuration.
    Skipped,
    /// Ended the run with a failure.
    Failed,
    /// Ended the run inconclusively.
    Inconclusive,
}

/// One stage in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    /// The stage.
    pub stage: Stage,
    /// How it ended.
    pub status: StageStatus,
    /// Wall time spent, milliseconds.
    pub elapsed_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Final verdict.
    #[serde(flatten)]
    pub verdict: Verdict,
    /// RFC 3339 start time.
    pub started_at: String,
    /// RFC 3339 end time.
    pub finished_at: String,
    /// Stages in execution order, up to the terminal one.
    pub stages: Vec<StageOutcome>,
    /// Per-class event audits.
    pub audit: BTreeMap<String, Vec<EventAudit>>,
}

impl RunReport {
    /// A report for a run that could not start.
    pub fn setup_failure(reason: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            verdict: Verdict::Inconclusive(reason.into()),
            started_at: now.clone(),
            finished_at: now,
            stages: Vec::new(),
            audit: BTreeMap::new(),
        }
    }
}
