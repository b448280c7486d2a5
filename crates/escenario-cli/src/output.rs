//! Output formatting and progress reporting

use console::{style, Style, Term};
use escenario::{Scenario, ScenarioReport, StepStatus, SuiteReport, Teardown};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

/// Output format for scenario results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Writes scenario results to the terminal
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            spinner: None,
            use_color,
            quiet,
        }
    }

    /// Show a spinner while scenarios run
    pub fn start_progress(&mut self, total: usize, suite: &str) {
        if self.quiet {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("{suite}: running {total} scenario(s)"));
        pb.enable_steady_tick(Duration::from_millis(120));
        self.spinner = Some(pb);
    }

    /// Remove the spinner
    pub fn finish(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn line(&self, text: &str) {
        match &self.spinner {
            Some(pb) => pb.suspend(|| {
                let _ = self.term.write_line(text);
            }),
            None => {
                let _ = self.term.write_line(text);
            }
        }
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        self.line(&styled);
    }

    /// Print one scenario's outcome; failures print even in quiet mode
    pub fn scenario(&self, report: &ScenarioReport) {
        if self.quiet && report.passed() {
            return;
        }
        self.line(render_scenario(report, self.use_color).trim_end());
    }

    /// Print a fail-fast skip
    pub fn skipped(&self, name: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("-").yellow().bold().to_string()
        } else {
            "SKIP".to_string()
        };
        self.line(&format!("{prefix} {name}"));
    }

    /// Print the suite summary
    pub fn summary(&self, report: &SuiteReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }
        self.line("");
        self.line(&summary_line(report, self.use_color));
    }

    /// Print a whole suite report
    pub fn suite(&self, report: &SuiteReport) {
        self.header(&report.name);
        for scenario in &report.scenarios {
            self.scenario(scenario);
        }
        for name in &report.skipped {
            self.skipped(name);
        }
        self.summary(report);
    }

    /// Print selected scenarios without running them
    pub fn listing(&self, scenarios: &[&Scenario]) {
        for scenario in scenarios {
            self.line(&render_listing(scenario));
        }
    }
}

/// Text block for one scenario
#[must_use]
pub fn render_scenario(report: &ScenarioReport, use_color: bool) -> String {
    let mut out = String::new();
    let prefix = match (report.passed(), use_color) {
        (true, true) => style("✓").green().bold().to_string(),
        (true, false) => "PASS".to_string(),
        (false, true) => style("✗").red().bold().to_string(),
        (false, false) => "FAIL".to_string(),
    };
    let _ = writeln!(out, "{prefix} {} ({} ms)", report.name, report.duration_ms);

    if let Some(failure) = &report.failure {
        let _ = writeln!(out, "    at: {}", failure.step);
        let _ = writeln!(out, "    {}: {}", failure.kind, failure.message);
    }
    for soft in &report.soft_failures {
        let step = soft.step.as_deref().unwrap_or("-");
        let _ = writeln!(out, "    soft [{step}]: {}", soft.message);
    }
    let skipped = report.steps_with(StepStatus::Skipped).len();
    if skipped > 0 {
        let _ = writeln!(out, "    {skipped} step(s) skipped");
    }
    match &report.teardown {
        Teardown::Failed { message } => {
            let _ = writeln!(out, "    warning: browser did not quit cleanly: {message}");
        }
        Teardown::AlreadyClosed => {
            let _ = writeln!(out, "    note: browser was already closed");
        }
        Teardown::Closed | Teardown::NoSession => {}
    }
    out
}

/// One-line suite summary
#[must_use]
pub fn summary_line(report: &SuiteReport, use_color: bool) -> String {
    let passed = report.passed_count();
    let failed = report.failed_count();
    let skipped = report.skipped.len();
    let total = report.total();
    let secs = Duration::from_millis(report.duration_ms).as_secs_f64();

    if use_color {
        let passed_style = Style::new().green().bold();
        let failed_style = Style::new().red().bold();
        let status = if report.all_passed() {
            passed_style.apply_to("PASSED")
        } else {
            failed_style.apply_to("FAILED")
        };
        format!(
            "{status} {total} scenarios in {secs:.2}s ({} passed, {} failed, {} skipped)",
            passed_style.apply_to(passed),
            if failed > 0 {
                failed_style.apply_to(failed).to_string()
            } else {
                failed.to_string()
            },
            Style::new().yellow().apply_to(skipped)
        )
    } else {
        let status = if report.all_passed() { "PASSED" } else { "FAILED" };
        format!("{status} {total} scenarios in {secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)")
    }
}

/// `name [tags]` followed by indented step labels
#[must_use]
pub fn render_listing(scenario: &Scenario) -> String {
    let mut out = scenario.name().to_string();
    if !scenario.tags().is_empty() {
        let tags: Vec<String> = scenario.tags().iter().map(|t| format!("@{t}")).collect();
        let _ = write!(out, " [{}]", tags.join(" "));
    }
    for step in scenario.steps() {
        let _ = write!(out, "\n    {}", step.label());
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use escenario::{
        AssertionFailure, AssertionSummary, ErrorKind, FailureRecord, ScenarioState, StepRecord,
    };

    fn scenario_report(name: &str, status: ScenarioState) -> ScenarioReport {
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
            duration_ms: 12,
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_passed_scenario() {
            let text = render_scenario(&scenario_report("Successful login", ScenarioState::Passed), false);
            assert!(text.starts_with("PASS Successful login (12 ms)"));
            assert_eq!(text.lines().count(), 1);
        }

        #[test]
        fn test_failed_scenario_details() {
            let mut report = scenario_report("Failed login", ScenarioState::Failed);
            report.failure = Some(FailureRecord {
                step: "Then the user sees a failed message".into(),
                kind: ErrorKind::ElementNotVisibleError,
                message: "element css=[data-test=\"error\"] not visible after 15000 ms".into(),
            });
            report.steps = vec![StepRecord {
                label: "And more".into(),
                status: StepStatus::Skipped,
                duration_ms: 0,
                error: None,
                error_kind: None,
            }];
            report.soft_failures = vec![AssertionFailure {
                step: Some("Then x".into()),
                message: "title mismatch".into(),
                index: 0,
            }];
            report.teardown = Teardown::Failed {
                message: "pipe closed".into(),
            };

            let text = render_scenario(&report, false);
            assert!(text.starts_with("FAIL Failed login"));
            assert!(text.contains("at: Then the user sees a failed message"));
            assert!(text.contains("ElementNotVisibleError"));
            assert!(text.contains("soft [Then x]: title mismatch"));
            assert!(text.contains("1 step(s) skipped"));
            assert!(text.contains("did not quit cleanly: pipe closed"));
        }

        #[test]
        fn test_summary_line() {
            let suite = SuiteReport {
                name: "storefront".into(),
                scenarios: vec![
                    scenario_report("a", ScenarioState::Passed),
                    scenario_report("b", ScenarioState::Failed),
                ],
                skipped: vec!["c".into()],
                duration_ms: 1500,
            };
            assert_eq!(
                summary_line(&suite, false),
                "FAILED 3 scenarios in 1.50s (1 passed, 1 failed, 1 skipped)"
            );
        }

        #[test]
        fn test_listing_shows_tags_and_steps() {
            let scenario = Scenario::new("Logout")
                .tag("menu")
                .given("a logged in user", |_ctx| Box::pin(async { Ok(()) }))
                .then("the login page shows", |_ctx| Box::pin(async { Ok(()) }));
            let text = render_listing(&scenario);
            assert_eq!(
                text,
                "Logout [@menu]\n    Given a logged in user\n    Then the login page shows"
            );
        }
    }

    mod reporter_tests {
        use super::*;

        #[test]
        fn test_default_reporter() {
            let reporter = ProgressReporter::default();
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }

        #[test]
        fn test_quiet_mode_suppresses_passes() {
            let mut reporter = ProgressReporter::new(false, true);
            reporter.start_progress(3, "storefront");
            assert!(reporter.spinner.is_none());
            reporter.scenario(&scenario_report("hidden", ScenarioState::Passed));
            reporter.scenario(&scenario_report("shown", ScenarioState::Failed));
            reporter.finish();
        }

        #[test]
        fn test_spinner_lifecycle() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.start_progress(2, "storefront");
            assert!(reporter.spinner.is_some());
            reporter.finish();
            assert!(reporter.spinner.is_none());
        }
    }
}
