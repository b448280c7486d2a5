//! Per-scenario execution context.
//!
//! A [`ScenarioContext`] lives for exactly one scenario. It owns the browser
//! [`Session`], the soft assertion collector and the record of every step,
//! and drives the state machine
//!
//! ```text
//! NotStarted ──before_scenario──► Running ──after_scenario──► Passed
//!      │                            │                          Failed
//!      └── launch failure ──────────┴── step error / timeout ──► Failed
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

use crate::assertion::{AssertionMode, SoftAssertions};
use crate::config::RunnerConfig;
use crate::driver::{BrowserKind, DriverLauncher};
use crate::element::ElementHandle;
use crate::locator::Locator;
use crate::report::{FailureRecord, ScenarioReport, StepRecord, StepStatus, Teardown};
use crate::result::{ErrorKind, EscenarioError, EscenarioResult};
use crate::scenario::Step;
use crate::session::{CloseOutcome, Session};
use crate::wait::WaitPolicy;

/// Step label used for failures outside any step
pub const BEFORE_SCENARIO: &str = "before scenario";
/// Step label used for failures found at teardown
pub const AFTER_SCENARIO: &str = "after scenario";

/// Scenario lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    /// `before_scenario` not yet called
    NotStarted,
    /// Steps are executing
    Running,
    /// Every step passed and no soft assertion failed
    Passed,
    /// A step, the launch, a soft assertion or the time budget failed
    Failed,
}

impl ScenarioState {
    /// Whether the state is final
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

impl std::fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Everything one scenario needs while it runs
pub struct ScenarioContext {
    name: String,
    tags: Vec<String>,
    state: ScenarioState,
    launcher: Arc<dyn DriverLauncher>,
    kind: BrowserKind,
    wait: WaitPolicy,
    base_url: Option<String>,
    session: Option<Session>,
    page_hint: Option<String>,
    soft: SoftAssertions,
    steps: Vec<StepRecord>,
    current_step: Option<(String, Instant)>,
    failure: Option<FailureRecord>,
    teardown: Option<Teardown>,
    started: Instant,
}

impl std::fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("session", &self.session)
            .field("page_hint", &self.page_hint)
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}

impl ScenarioContext {
    /// Context for scenario `name`, launching browsers with `launcher`
    #[must_use]
    pub fn new(name: impl Into<String>, launcher: Arc<dyn DriverLauncher>, config: &RunnerConfig) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            state: ScenarioState::NotStarted,
            launcher,
            kind: config.browser.kind,
            wait: config.wait,
            base_url: config.base_url.clone(),
            session: None,
            page_hint: None,
            soft: SoftAssertions::new(),
            steps: Vec::new(),
            current_step: None,
            failure: None,
            teardown: None,
            started: Instant::now(),
        }
    }

    /// Attach tags for the report
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Make soft assertions fail the step immediately
    #[must_use]
    pub fn with_assertion_mode(mut self, mode: AssertionMode) -> Self {
        self.soft = SoftAssertions::with_mode(mode);
        self
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Launch the session and enter `Running`
    ///
    /// # Errors
    ///
    /// Returns the launch error; the scenario is then `Failed`.
    pub async fn before_scenario(&mut self) -> EscenarioResult<()> {
        if self.state != ScenarioState::NotStarted {
            return Err(EscenarioError::InvalidState {
                message: format!("before_scenario called while {}", self.state),
            });
        }
        self.state = ScenarioState::Running;
        self.started = Instant::now();
        tracing::info!(scenario = %self.name, "scenario started");

        match Session::start(self.launcher.as_ref(), self.kind).await {
            Ok(mut session) => {
                session.set_default_wait(self.wait);
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                self.fail(BEFORE_SCENARIO, &e);
                Err(e)
            }
        }
    }

    /// Execute one step
    ///
    /// A step after a failure is recorded as skipped and not run.
    ///
    /// # Errors
    ///
    /// Returns the step's error; the scenario is then `Failed`.
    pub async fn run_step(&mut self, step: &Step) -> EscenarioResult<()> {
        let label = step.label();
        if self.state != ScenarioState::Running {
            self.record_skipped(step);
            return Ok(());
        }

        let span = tracing::info_span!("step", step = %label);
        self.soft.set_step(Some(label.clone()));
        self.current_step = Some((label.clone(), Instant::now()));
        let result = step.run(self).instrument(span).await;
        let started = self.current_step.take().map_or_else(Instant::now, |(_, t)| t);
        self.soft.set_step(None);

        let duration = started.elapsed();
        match result {
            Ok(()) => {
                tracing::info!(step = %label, duration_ms = duration.as_millis() as u64, "step passed");
                self.steps.push(StepRecord::passed(step, duration));
                Ok(())
            }
            Err(e) => {
                tracing::error!(step = %label, error = %e, "step failed");
                self.steps.push(StepRecord::failed(step, duration, &e));
                self.fail(&label, &e);
                Err(e)
            }
        }
    }

    /// Record `step` as skipped without running it
    pub fn record_skipped(&mut self, step: &Step) {
        self.steps.push(StepRecord::skipped(step));
    }

    /// Fail the scenario because its time budget ran out
    ///
    /// The step that was in flight, if any, is recorded as failed.
    pub fn mark_timeout(&mut self, timeout: Duration) {
        let err = EscenarioError::ScenarioTimeout {
            ms: timeout.as_millis() as u64,
        };
        tracing::error!(scenario = %self.name, error = %err, "scenario timed out");
        self.soft.set_step(None);
        let label = match self.current_step.take() {
            Some((label, started)) => {
                self.steps.push(StepRecord {
                    label: label.clone(),
                    status: StepStatus::Failed,
                    duration_ms: started.elapsed().as_millis() as u64,
                    error: Some(err.to_string()),
                    error_kind: Some(err.kind()),
                });
                label
            }
            None => BEFORE_SCENARIO.to_string(),
        };
        self.fail(&label, &err);
    }

    /// Close the session and settle the final state
    ///
    /// Calling this more than once returns the first teardown outcome and
    /// does nothing else.
    pub async fn after_scenario(&mut self) -> Teardown {
        if let Some(teardown) = &self.teardown {
            tracing::debug!(scenario = %self.name, "after_scenario already ran");
            return teardown.clone();
        }

        let teardown = match self.session.as_mut() {
            None => Teardown::NoSession,
            Some(session) => match session.close().await {
                Ok(CloseOutcome::Closed) => Teardown::Closed,
                Ok(CloseOutcome::AlreadyClosed) => Teardown::AlreadyClosed,
                Err(e) => {
                    tracing::error!(scenario = %self.name, error = %e, "teardown failed");
                    Teardown::Failed {
                        message: e.to_string(),
                    }
                }
            },
        };
        self.teardown = Some(teardown.clone());

        if self.state == ScenarioState::Running {
            match self.soft.verify() {
                Ok(()) => self.state = ScenarioState::Passed,
                Err(e) => {
                    let step = self
                        .soft
                        .failures()
                        .first()
                        .and_then(|f| f.step.clone())
                        .unwrap_or_else(|| AFTER_SCENARIO.to_string());
                    self.fail(&step, &e);
                }
            }
        }
        tracing::info!(scenario = %self.name, state = %self.state, teardown = ?teardown, "scenario finished");
        teardown
    }

    fn fail(&mut self, step: &str, err: &EscenarioError) {
        self.state = ScenarioState::Failed;
        if self.failure.is_none() {
            self.failure = Some(FailureRecord {
                step: step.to_string(),
                kind: err.kind(),
                message: err.to_string(),
            });
        }
    }

    /// Build the report; call after [`after_scenario`](Self::after_scenario)
    #[must_use]
    pub fn into_report(self) -> ScenarioReport {
        ScenarioReport {
            name: self.name.clone(),
            tags: self.tags.clone(),
            status: self.state,
            steps: self.steps.clone(),
            failure: self.failure.clone(),
            soft_failures: self.soft.failures().to_vec(),
            assertions: self.soft.summary(),
            teardown: self.teardown.clone().unwrap_or(Teardown::NoSession),
            session_id: self.session.as_ref().map(|s| s.id().to_string()),
            duration_ms: self.started.elapsed().as_millis() as u64,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Scenario name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ScenarioState {
        self.state
    }

    /// Steps recorded so far
    #[must_use]
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// First failure, if any
    #[must_use]
    pub const fn failure(&self) -> Option<&FailureRecord> {
        self.failure.as_ref()
    }

    /// Error kind of the first failure, if any
    #[must_use]
    pub fn failure_kind(&self) -> Option<ErrorKind> {
        self.failure.as_ref().map(|f| f.kind)
    }

    /// Teardown outcome, once `after_scenario` ran
    #[must_use]
    pub const fn teardown(&self) -> Option<&Teardown> {
        self.teardown.as_ref()
    }

    /// Default wait policy for this scenario
    #[must_use]
    pub const fn wait(&self) -> WaitPolicy {
        self.wait
    }

    /// Last URL observed by navigation or a URL wait
    #[must_use]
    pub fn page_hint(&self) -> Option<&str> {
        self.page_hint.as_deref()
    }

    /// Soft assertion collector
    #[must_use]
    pub const fn soft(&self) -> &SoftAssertions {
        &self.soft
    }

    /// The active session
    ///
    /// # Errors
    ///
    /// Returns [`EscenarioError::SessionNotActive`] before `before_scenario`
    /// or after teardown.
    pub fn session(&self) -> EscenarioResult<&Session> {
        match &self.session {
            Some(session) if session.is_active() => Ok(session),
            Some(session) => Err(EscenarioError::SessionNotActive {
                state: session.state().to_string(),
            }),
            None => Err(EscenarioError::SessionNotActive {
                state: "uninitialized".to_string(),
            }),
        }
    }

    /// Resolve `path` against the configured base URL
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no base URL is configured.
    pub fn url_for(&self, path: &str) -> EscenarioResult<String> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| EscenarioError::config("no base_url configured"))?;
        if path.is_empty() {
            return Ok(base.to_string());
        }
        Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    // =========================================================================
    // PAGE SHORTCUTS
    // =========================================================================

    /// Navigate and remember the URL
    pub async fn navigate(&mut self, url: &str) -> EscenarioResult<()> {
        self.session()?.navigate(url).await?;
        self.page_hint = Some(url.to_string());
        Ok(())
    }

    /// Wait for the URL to contain `fragment` and remember it
    pub async fn wait_for_url_contains(&mut self, fragment: &str, policy: WaitPolicy) -> EscenarioResult<String> {
        let url = self.session()?.wait_for_url_contains(fragment, policy).await?;
        self.page_hint = Some(url.clone());
        Ok(url)
    }

    /// [`Session::locate`] with the scenario's default policy
    pub async fn locate(&self, locator: &Locator) -> EscenarioResult<ElementHandle> {
        self.session()?.locate(locator, self.wait).await
    }

    /// [`Session::locate_visible`] with the scenario's default policy
    pub async fn locate_visible(&self, locator: &Locator) -> EscenarioResult<ElementHandle> {
        self.session()?.locate_visible(locator, self.wait).await
    }

    /// Locate, then click once ready
    pub async fn click(&self, locator: &Locator) -> EscenarioResult<()> {
        let session = self.session()?;
        let mut handle = session.locate(locator, self.wait).await?;
        session.click_when_ready(&mut handle).await
    }

    /// Locate, then type `text`
    pub async fn fill(&self, locator: &Locator, text: &str) -> EscenarioResult<()> {
        let session = self.session()?;
        let mut handle = session.locate(locator, self.wait).await?;
        session.type_into(&mut handle, text).await
    }

    /// Locate until visible, then read its text
    pub async fn text(&self, locator: &Locator) -> EscenarioResult<String> {
        let session = self.session()?;
        let mut handle = session.locate_visible(locator, self.wait).await?;
        session.text_of(&mut handle).await
    }

    // =========================================================================
    // ASSERTIONS
    // =========================================================================

    /// Soft assertion: record a failure and keep going
    ///
    /// # Errors
    ///
    /// Only when the context uses [`AssertionMode::FailFast`].
    pub fn check(&mut self, condition: bool, message: &str) -> EscenarioResult<()> {
        self.soft.check(condition, message)
    }

    /// Soft equality assertion
    pub fn check_eq<T: PartialEq + std::fmt::Debug>(
        &mut self,
        actual: &T,
        expected: &T,
        message: &str,
    ) -> EscenarioResult<()> {
        self.soft.check_eq(actual, expected, message)
    }

    /// Hard assertion: fail the step when `condition` is false
    ///
    /// # Errors
    ///
    /// Returns [`EscenarioError::AssertionFailed`] with `message`.
    pub fn ensure(&self, condition: bool, message: &str) -> EscenarioResult<()> {
        if condition {
            Ok(())
        } else {
            Err(EscenarioError::assertion(message))
        }
    }
}
