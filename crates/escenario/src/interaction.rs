//! Resilient element interaction.
//!
//! Every operation that waits goes through a [`Waiter`], so each check is
//! repeated until it holds or the policy's timeout passes. Interactions that
//! find their handle stale re-locate it exactly once; a second stale result
//! is an [`InteractionFailure::Stale`] error.
//!
//! ```text
//! locate ──► ElementHandle ──► click_when_ready / type_into / text_of
//!                 ▲                        │
//!                 └──── stale: re-locate ◄─┘ (once)
//! ```

use crate::driver::{BrowserDriver, DriverError, ElementId};
use crate::element::ElementHandle;
use crate::locator::Locator;
use crate::result::{EscenarioError, EscenarioResult, InteractionFailure};
use crate::session::Session;
use crate::wait::{WaitPolicy, WaitResult, Waiter};

/// Interactions subject to the single stale retry
#[derive(Debug, Clone, Copy)]
enum Action<'a> {
    Click,
    Type(&'a str),
    ReadText,
}

impl Action<'_> {
    const fn name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Type(_) => "type",
            Self::ReadText => "text",
        }
    }

    const fn needs_interactable(&self) -> bool {
        !matches!(self, Self::ReadText)
    }
}

/// Why one attempt failed
#[derive(Debug)]
enum Attempt {
    Stale,
    Failed(EscenarioError),
}

/// Probe result while waiting on a resolved element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    Ready,
    Stale,
}

fn classify(err: DriverError, locator: &Locator) -> Attempt {
    if err.is_stale() {
        Attempt::Stale
    } else if err.is_session_gone() {
        Attempt::Failed(EscenarioError::Driver(err))
    } else {
        tracing::debug!(locator = %locator, error = %err, "driver rejected interaction");
        Attempt::Failed(EscenarioError::Interaction {
            locator: locator.clone(),
            reason: InteractionFailure::Rejected,
        })
    }
}

async fn probe_interactable(driver: &dyn BrowserDriver, id: &ElementId) -> EscenarioResult<Option<Probe>> {
    let ready = async {
        Ok::<_, DriverError>(driver.is_displayed(id).await? && driver.is_enabled(id).await?)
    };
    match ready.await {
        Ok(true) => Ok(Some(Probe::Ready)),
        Ok(false) => Ok(None),
        Err(e) if e.is_stale() => Ok(Some(Probe::Stale)),
        Err(e) => Err(e.into()),
    }
}

async fn probe_visible(driver: &dyn BrowserDriver, id: &ElementId) -> EscenarioResult<Option<Probe>> {
    match driver.is_displayed(id).await {
        Ok(true) => Ok(Some(Probe::Ready)),
        Ok(false) => Ok(None),
        Err(e) if e.is_stale() => Ok(Some(Probe::Stale)),
        Err(e) => Err(e.into()),
    }
}

impl Session {
    fn check_owner(&self, handle: &ElementHandle) -> EscenarioResult<()> {
        if handle.session_id() == self.id() {
            Ok(())
        } else {
            Err(EscenarioError::InvalidState {
                message: format!("handle {handle} belongs to another session"),
            })
        }
    }

    async fn locate_within(&self, waiter: &Waiter, locator: &Locator) -> EscenarioResult<ElementHandle> {
        let driver = self.driver()?;
        let result = waiter
            .until(|| async move {
                let ids = driver.find_elements(locator).await?;
                Ok::<_, EscenarioError>(ids.into_iter().next())
            })
            .await?;
        match result {
            WaitResult::Satisfied {
                value,
                elapsed,
                attempts,
            } => {
                tracing::debug!(
                    locator = %locator,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "element located"
                );
                Ok(ElementHandle::new(value, locator.clone(), *waiter.policy(), self.id()))
            }
            WaitResult::TimedOut { .. } => Err(EscenarioError::ElementNotFound {
                locator: locator.clone(),
                timeout_ms: waiter.policy().timeout_ms(),
            }),
        }
    }

    /// Wait until an element matching `locator` exists
    ///
    /// # Errors
    ///
    /// Returns [`EscenarioError::ElementNotFound`] if nothing matches within
    /// the policy's timeout.
    pub async fn locate(&self, locator: &Locator, policy: WaitPolicy) -> EscenarioResult<ElementHandle> {
        self.locate_within(&Waiter::start(policy), locator).await
    }

    /// Wait until an element matching `locator` exists and is visible
    ///
    /// Both phases share one deadline. A handle that goes stale while
    /// waiting for visibility is re-resolved.
    ///
    /// # Errors
    ///
    /// Returns [`EscenarioError::ElementNotFound`] if nothing matches, or
    /// [`EscenarioError::ElementNotVisible`] if the element never shows.
    pub async fn locate_visible(&self, locator: &Locator, policy: WaitPolicy) -> EscenarioResult<ElementHandle> {
        let waiter = Waiter::start(policy);
        let driver = self.driver()?;
        let not_visible = || EscenarioError::ElementNotVisible {
            locator: locator.clone(),
            timeout_ms: policy.timeout_ms(),
        };

        let mut handle = self.locate_within(&waiter, locator).await?;
        loop {
            let id = handle.id();
            let result = waiter.until(|| async move { probe_visible(driver, id).await }).await?;
            match result {
                WaitResult::Satisfied {
                    value: Probe::Ready, ..
                } => return Ok(handle),
                WaitResult::TimedOut { .. } => return Err(not_visible()),
                WaitResult::Satisfied {
                    value: Probe::Stale, ..
                } => {
                    if waiter.is_expired() {
                        return Err(not_visible());
                    }
                    tracing::debug!(locator = %locator, "stale while waiting for visibility");
                    handle = match self.locate_within(&waiter, locator).await {
                        Ok(h) => h,
                        Err(EscenarioError::ElementNotFound { .. }) => return Err(not_visible()),
                        Err(e) => return Err(e),
                    };
                }
            }
        }
    }

    /// Every element currently matching `locator`, without waiting
    ///
    /// Returns an empty vector when nothing matches.
    pub async fn find_all(&self, locator: &Locator) -> EscenarioResult<Vec<ElementHandle>> {
        let ids = self.driver()?.find_elements(locator).await?;
        tracing::debug!(locator = %locator, count = ids.len(), "find_all");
        Ok(ids
            .into_iter()
            .map(|id| ElementHandle::new(id, locator.clone(), self.default_wait(), self.id()))
            .collect())
    }

    /// Text of every element currently matching `locator`
    ///
    /// Elements that disappear while being read are skipped.
    pub async fn texts_of_all(&self, locator: &Locator) -> EscenarioResult<Vec<String>> {
        let driver = self.driver()?;
        let mut texts = Vec::new();
        for handle in self.find_all(locator).await? {
            match driver.text(handle.id()).await {
                Ok(text) => texts.push(text),
                Err(e) if e.is_stale() => {
                    tracing::debug!(element = %handle, "skipping stale element");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(texts)
    }

    /// Scroll into view, wait until displayed and enabled, then click
    ///
    /// # Errors
    ///
    /// Returns [`EscenarioError::Interaction`] with reason `NotInteractable`
    /// if the element never becomes clickable, or `Stale` if it is stale
    /// again after one re-resolution.
    pub async fn click_when_ready(&self, handle: &mut ElementHandle) -> EscenarioResult<()> {
        self.with_stale_retry(handle, Action::Click).await.map(|_| ())
    }

    /// Clear the element, then type `text` into it
    ///
    /// Same readiness wait and stale retry as
    /// [`click_when_ready`](Self::click_when_ready).
    pub async fn type_into(&self, handle: &mut ElementHandle, text: &str) -> EscenarioResult<()> {
        self.with_stale_retry(handle, Action::Type(text)).await.map(|_| ())
    }

    /// Visible text of the element, with the single stale retry
    pub async fn text_of(&self, handle: &mut ElementHandle) -> EscenarioResult<String> {
        Ok(self
            .with_stale_retry(handle, Action::ReadText)
            .await?
            .unwrap_or_default())
    }

    /// Whether the element is currently displayed; stale counts as hidden
    pub async fn is_displayed(&self, handle: &ElementHandle) -> EscenarioResult<bool> {
        self.check_owner(handle)?;
        match self.driver()?.is_displayed(handle.id()).await {
            Ok(shown) => Ok(shown),
            Err(e) if e.is_stale() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Choose the option labelled `option_text` in a `<select>`
    pub async fn select_option(
        &self,
        select: &Locator,
        option_text: &str,
        policy: WaitPolicy,
    ) -> EscenarioResult<()> {
        self.locate_visible(select, policy).await?;
        let mut option = self.locate(&select.option_with_text(option_text)?, policy).await?;
        tracing::info!(select = %select, option = option_text, "select option");
        self.click_when_ready(&mut option).await
    }

    /// Wait until the current URL contains `fragment` and return it
    ///
    /// # Errors
    ///
    /// Returns [`EscenarioError::NavigationTimeout`] carrying the last URL
    /// seen if the fragment never appears.
    pub async fn wait_for_url_contains(&self, fragment: &str, policy: WaitPolicy) -> EscenarioResult<String> {
        let driver = self.driver()?;
        let waiter = Waiter::start(policy);
        let result = waiter
            .until(|| async move {
                let url = driver.current_url().await?;
                Ok::<_, EscenarioError>(url.contains(fragment).then_some(url))
            })
            .await?;
        match result {
            WaitResult::Satisfied { value, .. } => {
                tracing::debug!(url = %value, fragment, "url matched");
                Ok(value)
            }
            WaitResult::TimedOut { .. } => Err(EscenarioError::NavigationTimeout {
                fragment: fragment.to_string(),
                last_url: driver.current_url().await.unwrap_or_default(),
                timeout_ms: policy.timeout_ms(),
            }),
        }
    }

    async fn with_stale_retry(
        &self,
        handle: &mut ElementHandle,
        action: Action<'_>,
    ) -> EscenarioResult<Option<String>> {
        self.check_owner(handle)?;
        match self.attempt(handle, action).await {
            Ok(out) => return Ok(out),
            Err(Attempt::Failed(e)) => return Err(e),
            Err(Attempt::Stale) => {}
        }

        tracing::warn!(element = %handle, action = action.name(), "stale element, re-locating once");
        *handle = self.locate(handle.locator(), handle.policy()).await?;

        match self.attempt(handle, action).await {
            Ok(out) => Ok(out),
            Err(Attempt::Failed(e)) => Err(e),
            Err(Attempt::Stale) => Err(EscenarioError::Interaction {
                locator: handle.locator().clone(),
                reason: InteractionFailure::Stale,
            }),
        }
    }

    async fn attempt(&self, handle: &ElementHandle, action: Action<'_>) -> Result<Option<String>, Attempt> {
        let driver = self.driver().map_err(Attempt::Failed)?;
        let id = handle.id();
        let locator = handle.locator();

        if action.needs_interactable() {
            driver
                .scroll_into_view(id)
                .await
                .map_err(|e| classify(e, locator))?;
            let waiter = Waiter::start(handle.policy());
            let ready = waiter
                .until(|| async move { probe_interactable(driver, id).await })
                .await
                .map_err(Attempt::Failed)?;
            match ready {
                WaitResult::Satisfied {
                    value: Probe::Ready, ..
                } => {}
                WaitResult::Satisfied {
                    value: Probe::Stale, ..
                } => return Err(Attempt::Stale),
                WaitResult::TimedOut { .. } => {
                    return Err(Attempt::Failed(EscenarioError::Interaction {
                        locator: locator.clone(),
                        reason: InteractionFailure::NotInteractable,
                    }))
                }
            }
        }

        tracing::debug!(element = %handle, action = action.name(), "interact");
        match action {
            Action::Click => {
                driver.click(id).await.map_err(|e| classify(e, locator))?;
                Ok(None)
            }
            Action::Type(text) => {
                driver.clear(id).await.map_err(|e| classify(e, locator))?;
                driver
                    .send_keys(id, text)
                    .await
                    .map_err(|e| classify(e, locator))?;
                Ok(None)
            }
            Action::ReadText => driver
                .text(id)
                .await
                .map(Some)
                .map_err(|e| classify(e, locator)),
        }
    }
}
