//! Soft assertions.
//!
//! Collect assertion failures without stopping the scenario. Collected
//! failures fail the scenario when it is torn down.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::result::{EscenarioError, EscenarioResult};

/// A single assertion failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionFailure {
    /// Message describing the failure
    pub message: String,
    /// Step that was running (e.g. `Then the cart badge shows "1"`)
    pub step: Option<String>,
    /// Index of this failure in the sequence
    pub index: usize,
}

/// Mode for soft assertions behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionMode {
    /// Collect all failures (default)
    #[default]
    Collect,
    /// Stop on first failure (like hard assertions)
    FailFast,
}

/// Soft assertions collector
#[derive(Debug, Default)]
pub struct SoftAssertions {
    failures: Vec<AssertionFailure>,
    mode: AssertionMode,
    assertion_count: usize,
    step: Option<String>,
}

impl SoftAssertions {
    /// Create a new soft assertions collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a specific mode
    #[must_use]
    pub fn with_mode(mode: AssertionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> AssertionMode {
        self.mode
    }

    /// Label later failures with `step`
    pub fn set_step(&mut self, step: Option<String>) {
        self.step = step;
    }

    /// Assert a condition is true
    ///
    /// # Errors
    ///
    /// Only in [`AssertionMode::FailFast`]: returns the failure immediately.
    pub fn check(&mut self, condition: bool, message: &str) -> EscenarioResult<()> {
        self.assertion_count += 1;
        if condition {
            Ok(())
        } else {
            self.record_failure(message.to_string())
        }
    }

    /// Assert two values are equal
    pub fn check_eq<T: PartialEq + Debug>(
        &mut self,
        actual: &T,
        expected: &T,
        message: &str,
    ) -> EscenarioResult<()> {
        self.assertion_count += 1;
        if actual == expected {
            Ok(())
        } else {
            self.record_failure(format!("{message}: expected {expected:?}, got {actual:?}"))
        }
    }

    /// Assert a string contains a substring
    pub fn check_contains(&mut self, haystack: &str, needle: &str, message: &str) -> EscenarioResult<()> {
        self.assertion_count += 1;
        if haystack.contains(needle) {
            Ok(())
        } else {
            self.record_failure(format!(
                "{message}: expected '{haystack}' to contain '{needle}'"
            ))
        }
    }

    /// Record a custom failure
    pub fn fail(&mut self, message: impl Into<String>) -> EscenarioResult<()> {
        self.assertion_count += 1;
        self.record_failure(message.into())
    }

    fn record_failure(&mut self, message: String) -> EscenarioResult<()> {
        tracing::warn!(step = ?self.step, %message, "soft assertion failed");
        let failure = AssertionFailure {
            message: message.clone(),
            step: self.step.clone(),
            index: self.failures.len(),
        };
        self.failures.push(failure);
        match self.mode {
            AssertionMode::Collect => Ok(()),
            AssertionMode::FailFast => Err(EscenarioError::AssertionFailed { message }),
        }
    }

    /// Get all failures
    #[must_use]
    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    /// Get the number of failures
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Get the total number of assertions checked
    #[must_use]
    pub const fn assertion_count(&self) -> usize {
        self.assertion_count
    }

    /// Check if all assertions passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Verify all assertions passed
    ///
    /// # Errors
    ///
    /// Returns [`EscenarioError::AssertionFailed`] listing every failure.
    pub fn verify(&self) -> EscenarioResult<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        let lines: Vec<String> = self
            .failures
            .iter()
            .map(|f| match &f.step {
                Some(step) => format!("{} ({step})", f.message),
                None => f.message.clone(),
            })
            .collect();
        Err(EscenarioError::AssertionFailed {
            message: format!("{} soft assertion(s) failed: {}", lines.len(), lines.join("; ")),
        })
    }

    /// Get a summary of the assertions
    #[must_use]
    pub fn summary(&self) -> AssertionSummary {
        AssertionSummary {
            total: self.assertion_count,
            passed: self.assertion_count - self.failures.len(),
            failed: self.failures.len(),
        }
    }
}

/// Summary of assertion results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionSummary {
    /// Total assertions checked
    pub total: usize,
    /// Assertions that passed
    pub passed: usize,
    /// Assertions that failed
    pub failed: usize,
}
