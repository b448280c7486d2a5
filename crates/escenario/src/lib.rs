//! Escenario: resilient browser scenario runner
//!
//! Escenario drives one browser per scenario through ordered steps that
//! locate elements, wait for them, interact and assert. Every wait is
//! bounded, a stale element handle is re-resolved exactly once, and the
//! browser is torn down after every scenario whatever the outcome.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       ESCENARIO Architecture                     │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌──────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │   │  Runner  │──►│ ScenarioContext │──►│ Session             │   │
//! │   │ (suite)  │   │ (steps, soft    │   │ + interaction layer │   │
//! │   │          │   │  assertions)    │   │ (Locator, Waiter)   │   │
//! │   └──────────┘   └─────────────────┘   └──────────┬──────────┘   │
//! │                                                   ▼              │
//! │                                  BrowserDriver (Chromium / mock) │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use escenario::prelude::*;
//!
//! let scenario = Scenario::new("Title is shown")
//!     .given("I am on the shop", |ctx| Box::pin(async move {
//!         let url = ctx.url_for("")?;
//!         ctx.navigate(&url).await
//!     }))
//!     .then("I see the title", |ctx| Box::pin(async move {
//!         let title = ctx.text(&Locator::class_name("title")).await?;
//!         ctx.check_eq(&title.as_str(), &"Products", "page title")
//!     }));
//!
//! let runner = Runner::new(Arc::new(launcher), RunnerConfig::default());
//! let report = runner.run(&scenario).await;
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod assertion;
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc)]
mod cdp;
mod config;
mod context;
mod driver;
mod element;
#[allow(clippy::missing_errors_doc)]
mod interaction;
mod locator;
/// Scripted in-memory browser
pub mod mock;
/// Page Object Model support
#[allow(clippy::missing_errors_doc)]
pub mod page_object;
mod report;
mod result;
mod runner;
mod scenario;
#[allow(clippy::missing_errors_doc)]
mod session;
mod wait;

pub use assertion::{AssertionFailure, AssertionMode, AssertionSummary, SoftAssertions};
#[cfg(feature = "browser")]
pub use cdp::{ChromiumDriver, ChromiumLauncher};
pub use config::{BrowserSettings, RunnerConfig, DEFAULT_SCENARIO_TIMEOUT_MS};
pub use context::{ScenarioContext, ScenarioState, AFTER_SCENARIO, BEFORE_SCENARIO};
pub use driver::{
    BrowserDriver, BrowserKind, DriverError, DriverLauncher, DriverResult, ElementId,
};
pub use element::ElementHandle;
pub use locator::{Locator, Strategy};
pub use page_object::PageObject;
pub use report::{
    FailureRecord, ScenarioReport, StepRecord, StepStatus, SuiteReport, Teardown,
};
pub use result::{ErrorKind, EscenarioError, EscenarioResult, InteractionFailure};
pub use runner::Runner;
pub use scenario::{Scenario, ScenarioFilter, Step, StepAction, StepFuture, StepKeyword, Suite};
pub use session::{CloseOutcome, Session, SessionState};
pub use wait::{
    WaitPolicy, WaitResult, Waiter, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
    NAVIGATION_TIMEOUT_MS, SHORT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assertion::*;
    #[cfg(feature = "browser")]
    pub use super::cdp::*;
    pub use super::config::*;
    pub use super::context::*;
    pub use super::driver::*;
    pub use super::element::*;
    pub use super::locator::*;
    pub use super::page_object::PageObject;
    pub use super::report::*;
    pub use super::result::*;
    pub use super::runner::*;
    pub use super::scenario::*;
    pub use super::session::*;
    pub use super::wait::*;
    pub use std::sync::Arc;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::prelude::*;
    use super::mock::{MockElement, MockLauncher, MockPage};

    mod prelude_tests {
        use super::*;

        #[tokio::test]
        async fn test_prelude_covers_a_full_run() {
            let launcher = MockLauncher::new(
                MockPage::new().with_element(MockElement::new(Locator::class_name("title")).with_text("Products")),
            );
            let scenario = Scenario::new("Title is shown")
                .given("I am on the shop", |ctx| {
                    Box::pin(async move {
                        let url = ctx.url_for("")?;
                        ctx.navigate(&url).await
                    })
                })
                .then("I see the title", |ctx| {
                    Box::pin(async move {
                        let title = ctx.text(&Locator::class_name("title")).await?;
                        ctx.check_eq(&title.as_str(), &"Products", "page title")
                    })
                });
            let config = RunnerConfig::default().with_base_url("https://shop.test/");
            let report = Runner::new(Arc::new(launcher), config).run(&scenario).await;
            assert!(report.passed(), "{report:?}");
            assert_eq!(report.assertions.total, 1);
        }
    }
}
