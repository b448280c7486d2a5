//! Scenario runner.
//!
//! Runs each scenario in a fresh [`ScenarioContext`]: launch, steps, teardown.
//! Teardown happens on every path, including a launch failure, a failing
//! step and an exhausted scenario time budget.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

use crate::config::RunnerConfig;
use crate::context::ScenarioContext;
use crate::driver::DriverLauncher;
use crate::report::{ScenarioReport, SuiteReport};
use crate::scenario::{Scenario, Suite};

/// Runs scenarios against browsers from one launcher
pub struct Runner {
    launcher: Arc<dyn DriverLauncher>,
    config: RunnerConfig,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Create a runner
    #[must_use]
    pub fn new(launcher: Arc<dyn DriverLauncher>, config: RunnerConfig) -> Self {
        Self { launcher, config }
    }

    /// Runner configuration
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Time budget for `scenario`
    #[must_use]
    pub fn budget_for(&self, scenario: &Scenario) -> Duration {
        Duration::from_millis(
            scenario
                .timeout_ms()
                .unwrap_or(self.config.scenario_timeout_ms),
        )
    }

    /// Run one scenario to completion
    ///
    /// Never fails: every outcome, including teardown, ends up in the
    /// report.
    pub async fn run(&self, scenario: &Scenario) -> ScenarioReport {
        let span = tracing::info_span!("scenario", name = %scenario.name());
        self.run_inner(scenario).instrument(span).await
    }

    async fn run_inner(&self, scenario: &Scenario) -> ScenarioReport {
        let mut ctx = ScenarioContext::new(scenario.name(), Arc::clone(&self.launcher), &self.config)
            .with_tags(scenario.tags().to_vec());
        let budget = self.budget_for(scenario);

        let outcome = tokio::time::timeout(budget, execute(&mut ctx, scenario)).await;
        if outcome.is_err() {
            ctx.mark_timeout(budget);
            let done = ctx.steps().len();
            for step in scenario.steps().iter().skip(done) {
                ctx.record_skipped(step);
            }
        }

        ctx.after_scenario().await;
        ctx.into_report()
    }

    /// Run every scenario of `suite` in order
    ///
    /// With `fail_fast` set, scenarios after the first failure are listed in
    /// [`SuiteReport::skipped`] instead of running.
    pub async fn run_suite(&self, suite: &Suite) -> SuiteReport {
        let started = Instant::now();
        let mut report = SuiteReport {
            name: suite.name().to_string(),
            ..SuiteReport::default()
        };
        tracing::info!(suite = %suite.name(), scenarios = suite.len(), "suite started");

        for scenario in suite.scenarios() {
            if self.config.fail_fast && report.failed_count() > 0 {
                tracing::warn!(scenario = %scenario.name(), "skipped after earlier failure");
                report.skipped.push(scenario.name().to_string());
                continue;
            }
            report.scenarios.push(self.run(scenario).await);
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            suite = %suite.name(),
            passed = report.passed_count(),
            failed = report.failed_count(),
            skipped = report.skipped.len(),
            "suite finished"
        );
        report
    }
}

async fn execute(ctx: &mut ScenarioContext, scenario: &Scenario) {
    if ctx.before_scenario().await.is_err() {
        for step in scenario.steps() {
            ctx.record_skipped(step);
        }
        return;
    }
    for step in scenario.steps() {
        // failures are recorded on the context; later steps are skipped
        if let Err(e) = ctx.run_step(step).await {
            tracing::debug!(error = %e, "continuing to record skipped steps");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::context::{ScenarioState, BEFORE_SCENARIO};
    use crate::locator::Locator;
    use crate::mock::{MockElement, MockLauncher, MockPage};
    use crate::report::{StepStatus, Teardown};
    use crate::result::ErrorKind;

    fn runner(launcher: &MockLauncher) -> Runner {
        Runner::new(
            Arc::new(launcher.clone()),
            RunnerConfig::new().with_base_url("https://shop.test/"),
        )
    }

    fn passing(name: &str) -> Scenario {
        Scenario::new(name).given("nothing", |_ctx| Box::pin(async { Ok(()) }))
    }

    fn failing(name: &str) -> Scenario {
        Scenario::new(name)
            .when("it breaks", |ctx| Box::pin(async move { ctx.ensure(false, "broken") }))
            .then("unreached", |_ctx| Box::pin(async { Ok(()) }))
    }

    mod scenario_tests {
        use super::*;

        #[tokio::test]
        async fn test_one_session_per_scenario() {
            let launcher = MockLauncher::new(MockPage::new());
            let r = runner(&launcher);
            let a = r.run(&passing("a")).await;
            let b = r.run(&failing("b")).await;
            assert!(a.passed());
            assert!(!b.passed());
            assert_eq!(launcher.launch_count(), 2);
            assert_eq!(launcher.quit_count(), 2);
            assert_ne!(a.session_id, b.session_id);
        }

        #[tokio::test]
        async fn test_failure_marks_rest_skipped() {
            let launcher = MockLauncher::new(MockPage::new());
            let report = runner(&launcher).run(&failing("b")).await;
            assert_eq!(report.steps_with(StepStatus::Failed).len(), 1);
            assert_eq!(report.steps_with(StepStatus::Skipped)[0].label, "Then unreached");
            assert_eq!(report.teardown, Teardown::Closed);
        }

        #[tokio::test]
        async fn test_launch_failure_skips_all_steps() {
            let launcher = MockLauncher::failing("chromium not found");
            let report = runner(&launcher).run(&failing("b")).await;
            assert_eq!(report.status, ScenarioState::Failed);
            assert_eq!(report.steps_with(StepStatus::Skipped).len(), 2);
            let failure = report.failure.unwrap();
            assert_eq!(failure.step, BEFORE_SCENARIO);
            assert_eq!(failure.kind, ErrorKind::LaunchError);
            assert_eq!(report.teardown, Teardown::NoSession);
        }

        #[tokio::test]
        async fn test_dead_session_still_passes() {
            let launcher = MockLauncher::new(MockPage::new().quit_with_session_gone());
            let report = runner(&launcher).run(&passing("a")).await;
            assert!(report.passed());
            assert_eq!(report.teardown, Teardown::AlreadyClosed);
        }

        #[tokio::test]
        async fn test_teardown_error_keeps_step_failure() {
            let launcher = MockLauncher::new(MockPage::new().quit_with_error("pipe closed"));
            let report = runner(&launcher).run(&failing("b")).await;
            assert_eq!(report.failure.unwrap().kind, ErrorKind::AssertionFailed);
            assert!(matches!(report.teardown, Teardown::Failed { .. }));
        }
    }

    mod timeout_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_timeout_aborts_hanging_step_and_tears_down() {
            let launcher = MockLauncher::new(MockPage::new());
            let scenario = Scenario::new("hang")
                .with_timeout_ms(500)
                .given("a quick step", |_ctx| Box::pin(async { Ok(()) }))
                .when("something never appears", |ctx| {
                    Box::pin(async move {
                        ctx.locate(&Locator::id("never")).await?;
                        Ok(())
                    })
                })
                .then("unreached", |_ctx| Box::pin(async { Ok(()) }));
            let config = RunnerConfig::new()
                .with_base_url("https://shop.test/")
                .with_wait(crate::wait::WaitPolicy::default().with_timeout(60_000));
            let report = Runner::new(Arc::new(launcher.clone()), config).run(&scenario).await;

            assert_eq!(report.status, ScenarioState::Failed);
            let statuses: Vec<_> = report.steps.iter().map(|s| s.status).collect();
            assert_eq!(
                statuses,
                vec![StepStatus::Passed, StepStatus::Failed, StepStatus::Skipped]
            );
            let failure = report.failure.unwrap();
            assert_eq!(failure.kind, ErrorKind::ScenarioTimeout);
            assert_eq!(failure.step, "When something never appears");
            assert_eq!(launcher.quit_count(), 1);
        }

        #[test]
        fn test_budget_prefers_scenario_override() {
            let launcher = MockLauncher::new(MockPage::new());
            let r = runner(&launcher);
            assert_eq!(r.budget_for(&passing("a")), Duration::from_millis(60_000));
            assert_eq!(
                r.budget_for(&passing("a").with_timeout_ms(10)),
                Duration::from_millis(10)
            );
        }
    }

    mod suite_tests {
        use super::*;

        #[tokio::test]
        async fn test_suite_runs_all_without_fail_fast() {
            let launcher = MockLauncher::new(MockPage::new());
            let suite = Suite::new("shop")
                .scenario(failing("a"))
                .scenario(passing("b"));
            let report = runner(&launcher).run_suite(&suite).await;
            assert_eq!(report.passed_count(), 1);
            assert_eq!(report.failed_count(), 1);
            assert!(report.skipped.is_empty());
        }

        #[tokio::test]
        async fn test_fail_fast_skips_remaining() {
            let launcher = MockLauncher::new(MockPage::new());
            let suite = Suite::new("shop")
                .scenario(failing("a"))
                .scenario(passing("b"))
                .scenario(passing("c"));
            let r = Runner::new(
                Arc::new(launcher.clone()),
                RunnerConfig::new().with_fail_fast(true),
            );
            let report = r.run_suite(&suite).await;
            assert_eq!(report.scenarios.len(), 1);
            assert_eq!(report.skipped, vec!["b".to_string(), "c".to_string()]);
            assert!(!report.all_passed());
            assert_eq!(launcher.launch_count(), 1);
        }

        #[tokio::test]
        async fn test_reads_page_text() {
            let launcher = MockLauncher::new(
                MockPage::new().with_element(MockElement::new(Locator::class_name("title")).with_text("Products")),
            );
            let scenario = Scenario::new("title").then("the title is Products", |ctx| {
                Box::pin(async move {
                    let text = ctx.text(&Locator::class_name("title")).await?;
                    ctx.ensure(text == "Products", "title")
                })
            });
            let report = runner(&launcher).run(&scenario).await;
            assert!(report.passed(), "{report:?}");
        }
    }
}
