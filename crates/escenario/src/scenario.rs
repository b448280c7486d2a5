//! Scenarios, steps and suites.
//!
//! A step is a keyword, a human-readable phrase and an async action over the
//! [`ScenarioContext`]:
//!
//! ```ignore
//! let scenario = Scenario::new("Successful login")
//!     .tag("smoke")
//!     .given("I am on the login page", |ctx| Box::pin(LoginPage::open(ctx)))
//!     .then("I see the inventory", |ctx| Box::pin(async move {
//!         let url = ctx.wait_for_url_contains("inventory", WaitPolicy::navigation()).await?;
//!         ctx.ensure(url.contains("inventory.html"), "landed on inventory")
//!     }));
//! ```

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::context::ScenarioContext;
use crate::result::EscenarioResult;

/// Future returned by a step action
pub type StepFuture<'a> = BoxFuture<'a, EscenarioResult<()>>;

/// Shared step action
pub type StepAction = Arc<dyn for<'a> Fn(&'a mut ScenarioContext) -> StepFuture<'a> + Send + Sync>;

/// Gherkin-style step keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKeyword {
    /// Precondition
    Given,
    /// Action
    When,
    /// Outcome
    Then,
    /// Continues the previous keyword
    And,
    /// Negative continuation
    But,
}

impl StepKeyword {
    /// Keyword as written in a feature file
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        }
    }
}

impl std::fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a scenario
#[derive(Clone)]
pub struct Step {
    keyword: StepKeyword,
    phrase: String,
    action: StepAction,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("keyword", &self.keyword)
            .field("phrase", &self.phrase)
            .finish_non_exhaustive()
    }
}

impl Step {
    /// Create a step
    pub fn new<F>(keyword: StepKeyword, phrase: impl Into<String>, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut ScenarioContext) -> StepFuture<'a> + Send + Sync + 'static,
    {
        Self {
            keyword,
            phrase: phrase.into(),
            action: Arc::new(action),
        }
    }

    /// Step keyword
    #[must_use]
    pub const fn keyword(&self) -> StepKeyword {
        self.keyword
    }

    /// Step phrase
    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// `Keyword phrase`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.keyword, self.phrase)
    }

    /// Run the action
    pub fn run<'a>(&self, ctx: &'a mut ScenarioContext) -> StepFuture<'a> {
        (self.action)(ctx)
    }
}

/// One independent test case with its own browser session
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    tags: Vec<String>,
    steps: Vec<Step>,
    timeout_ms: Option<u64>,
}

macro_rules! keyword_builder {
    ($(#[$doc:meta] $fn_name:ident => $kw:ident),* $(,)?) => {
        $(
            #[$doc]
            #[must_use]
            pub fn $fn_name<F>(self, phrase: impl Into<String>, action: F) -> Self
            where
                F: for<'a> Fn(&'a mut ScenarioContext) -> StepFuture<'a> + Send + Sync + 'static,
            {
                self.step(Step::new(StepKeyword::$kw, phrase, action))
            }
        )*
    };
}

impl Scenario {
    /// Create an empty scenario
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            steps: Vec::new(),
            timeout_ms: None,
        }
    }

    /// Add a tag (a leading `@` is dropped)
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tags.push(tag.trim_start_matches('@').to_string());
        self
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    keyword_builder! {
        /// Append a `Given` step
        given => Given,
        /// Append a `When` step
        when => When,
        /// Append a `Then` step
        then => Then,
        /// Append an `And` step
        and => And,
        /// Append a `But` step
        but => But,
    }

    /// Override the runner's scenario timeout
    #[must_use]
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms.max(1));
        self
    }

    /// Scenario name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tags without `@`
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Steps in order
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Timeout override in milliseconds
    #[must_use]
    pub const fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    /// Whether the scenario carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('@');
        self.tags.iter().any(|t| t == tag)
    }
}

/// Selects scenarios by name substring and tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioFilter {
    /// Case-insensitive substring of the scenario name
    pub name: Option<String>,
    /// Scenario must carry at least one of these (empty = any)
    pub tags: Vec<String>,
}

impl ScenarioFilter {
    /// Whether `scenario` passes the filter
    #[must_use]
    pub fn matches(&self, scenario: &Scenario) -> bool {
        let name_ok = self.name.as_ref().map_or(true, |needle| {
            scenario
                .name()
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        let tag_ok = self.tags.is_empty() || self.tags.iter().any(|t| scenario.has_tag(t));
        name_ok && tag_ok
    }
}

/// An ordered collection of scenarios
#[derive(Debug, Clone, Default)]
pub struct Suite {
    name: String,
    scenarios: Vec<Scenario>,
}

impl Suite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenarios: Vec::new(),
        }
    }

    /// Append a scenario
    #[must_use]
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Keep only scenarios accepted by `filter`
    #[must_use]
    pub fn filter(mut self, filter: &ScenarioFilter) -> Self {
        self.scenarios.retain(|s| filter.matches(s));
        self
    }

    /// Suite name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scenarios in order
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Number of scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the suite has no scenarios
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
