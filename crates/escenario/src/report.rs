//! Scenario and suite reports.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::assertion::{AssertionFailure, AssertionSummary};
use crate::context::ScenarioState;
use crate::result::{ErrorKind, EscenarioError, EscenarioResult};
use crate::scenario::Step;

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Ran without error
    Passed,
    /// Returned an error or was cut off by the scenario timeout
    Failed,
    /// Not run because an earlier step failed
    Skipped,
}

/// Record of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// `Keyword phrase`
    pub label: String,
    /// Outcome
    pub status: StepStatus,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Error message if failed
    pub error: Option<String>,
    /// Error classification if failed
    pub error_kind: Option<ErrorKind>,
}

impl StepRecord {
    /// A passed step
    #[must_use]
    pub fn passed(step: &Step, duration: Duration) -> Self {
        Self {
            label: step.label(),
            status: StepStatus::Passed,
            duration_ms: duration.as_millis() as u64,
            error: None,
            error_kind: None,
        }
    }

    /// A failed step
    #[must_use]
    pub fn failed(step: &Step, duration: Duration, err: &EscenarioError) -> Self {
        Self {
            label: step.label(),
            status: StepStatus::Failed,
            duration_ms: duration.as_millis() as u64,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }

    /// A skipped step
    #[must_use]
    pub fn skipped(step: &Step) -> Self {
        Self {
            label: step.label(),
            status: StepStatus::Skipped,
            duration_ms: 0,
            error: None,
            error_kind: None,
        }
    }
}

/// First failure of a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Step label, or `before scenario` / `after scenario`
    pub step: String,
    /// Error classification
    pub kind: ErrorKind,
    /// Error message
    pub message: String,
}

/// What happened when the session was closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Teardown {
    /// The browser was quit
    Closed,
    /// The browser was already gone; logged, not an error
    AlreadyClosed,
    /// No session was ever started
    NoSession,
    /// Quitting failed
    Failed {
        /// Error message
        message: String,
    },
}

impl Teardown {
    /// Whether teardown left nothing behind
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Scenario tags
    pub tags: Vec<String>,
    /// Final state
    pub status: ScenarioState,
    /// Every step in order
    pub steps: Vec<StepRecord>,
    /// First failure
    pub failure: Option<FailureRecord>,
    /// Soft assertion failures
    pub soft_failures: Vec<AssertionFailure>,
    /// Soft assertion counts
    pub assertions: AssertionSummary,
    /// Session teardown outcome
    pub teardown: Teardown,
    /// Session id for log correlation
    pub session_id: Option<String>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl ScenarioReport {
    /// Whether the scenario passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == ScenarioState::Passed
    }

    /// Steps with the given status
    #[must_use]
    pub fn steps_with(&self, status: StepStatus) -> Vec<&StepRecord> {
        self.steps.iter().filter(|s| s.status == status).collect()
    }
}

/// Result of running a suite
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite name
    pub name: String,
    /// Reports of scenarios that ran
    pub scenarios: Vec<ScenarioReport>,
    /// Scenarios not run because of fail-fast
    pub skipped: Vec<String>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl SuiteReport {
    /// Check if all scenarios passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.skipped.is_empty() && self.scenarios.iter().all(ScenarioReport::passed)
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|r| r.passed()).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.scenarios.iter().filter(|r| !r.passed()).count()
    }

    /// Total scenarios, including skipped
    #[must_use]
    pub fn total(&self) -> usize {
        self.scenarios.len() + self.skipped.len()
    }

    /// Failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioReport> {
        self.scenarios.iter().filter(|r| !r.passed()).collect()
    }

    /// Pretty JSON
    pub fn to_json(&self) -> EscenarioResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn report(name: &str, status: ScenarioState) -> ScenarioReport {
        ScenarioReport {
            name: name.to_string(),
            tags: vec![],
            status,
            steps: vec![],
            failure: None,
            soft_failures: vec![],
            assertions: AssertionSummary::default(),
            teardown: Teardown::Closed,
            session_id: None,
            duration_ms: 5,
        }
    }

    #[test]
    fn test_suite_counts() {
        let suite = SuiteReport {
            name: "shop".into(),
            scenarios: vec![
                report("a", ScenarioState::Passed),
                report("b", ScenarioState::Failed),
            ],
            skipped: vec!["c".into()],
            duration_ms: 10,
        };
        assert_eq!(suite.passed_count(), 1);
        assert_eq!(suite.failed_count(), 1);
        assert_eq!(suite.total(), 3);
        assert!(!suite.all_passed());
        assert_eq!(suite.failures()[0].name, "b");
    }

    #[test]
    fn test_skipped_scenarios_fail_suite() {
        let suite = SuiteReport {
            name: "shop".into(),
            scenarios: vec![report("a", ScenarioState::Passed)],
            skipped: vec!["b".into()],
            duration_ms: 1,
        };
        assert!(!suite.all_passed());
    }

    #[test]
    fn test_json_shape() {
        let mut r = report("a", ScenarioState::Failed);
        r.teardown = Teardown::AlreadyClosed;
        r.failure = Some(FailureRecord {
            step: "When I log in".into(),
            kind: ErrorKind::ElementNotFoundError,
            message: "Element id=x not found within 10ms".into(),
        });
        let suite = SuiteReport {
            name: "s".into(),
            scenarios: vec![r],
            ..SuiteReport::default()
        };
        let json: serde_json::Value = serde_json::from_str(&suite.to_json().unwrap()).unwrap();
        let sc = &json["scenarios"][0];
        assert_eq!(sc["status"], "failed");
        assert_eq!(sc["teardown"]["outcome"], "already_closed");
        assert_eq!(sc["failure"]["kind"], "element_not_found_error");
    }

    #[test]
    fn test_teardown_clean() {
        assert!(Teardown::AlreadyClosed.is_clean());
        assert!(!Teardown::Failed { message: "x".into() }.is_clean());
    }
}
