//! Scripted in-memory browser for tests.
//!
//! A [`MockPage`] describes elements with timed appearance and visibility,
//! click effects and failure injection. [`MockLauncher`] hands out a fresh
//! [`MockDriver`] built from that page on every launch and keeps a
//! [`MockHandle`] to each so tests can inspect what happened.
//!
//! Time is read from `tokio::time`, so `#[tokio::test(start_paused = true)]`
//! makes appearance delays deterministic.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::driver::{
    BrowserDriver, BrowserKind, DriverError, DriverLauncher, DriverResult, ElementId,
};
use crate::locator::Locator;

// =============================================================================
// PAGE DESCRIPTION
// =============================================================================

/// What happens when a mock element is clicked
#[derive(Debug, Clone)]
pub enum MockEffect {
    /// Change the current URL immediately
    Navigate(String),
    /// Change the current URL after a delay
    NavigateAfter {
        /// Target URL
        url: String,
        /// Delay before the URL changes
        delay: Duration,
    },
    /// Make every element matching the locator present and visible
    Reveal(Locator),
    /// Detach every element matching the locator
    Remove(Locator),
    /// Add a new element to the page
    Insert(MockElement),
    /// Branch on the typed value of an input
    When {
        /// Input whose value is compared
        field: Locator,
        /// Expected value
        equals: String,
        /// Effects when the value matches
        then: Vec<MockEffect>,
        /// Effects otherwise
        otherwise: Vec<MockEffect>,
    },
}

/// One element on the mock page
#[derive(Debug, Clone)]
pub struct MockElement {
    locator: Locator,
    text: String,
    value: String,
    appear_after: Duration,
    visible_after: Option<Duration>,
    enabled: bool,
    detached: bool,
    on_url: Option<String>,
    stale_times: u32,
    on_click: Vec<MockEffect>,
}

impl MockElement {
    /// A present, visible, enabled element matched by `locator`
    #[must_use]
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            text: String::new(),
            value: String::new(),
            appear_after: Duration::ZERO,
            visible_after: Some(Duration::ZERO),
            enabled: true,
            detached: false,
            on_url: None,
            stale_times: 0,
            on_click: Vec::new(),
        }
    }

    /// Set visible text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Element enters the DOM this long after page load
    #[must_use]
    pub const fn appearing_after(mut self, delay: Duration) -> Self {
        self.appear_after = delay;
        self
    }

    /// Element becomes visible this long after page load
    #[must_use]
    pub const fn visible_after(mut self, delay: Duration) -> Self {
        self.visible_after = Some(delay);
        self
    }

    /// Element is in the DOM but never visible
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible_after = None;
        self
    }

    /// Element never accepts input
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Element starts outside the DOM until a [`MockEffect::Reveal`]
    #[must_use]
    pub const fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Element only exists while the URL contains `fragment`
    #[must_use]
    pub fn on_page(mut self, fragment: impl Into<String>) -> Self {
        self.on_url = Some(fragment.into());
        self
    }

    /// The next `times` interactions each re-render the element
    #[must_use]
    pub const fn stale_times(mut self, times: u32) -> Self {
        self.stale_times = times;
        self
    }

    /// Add a click effect
    #[must_use]
    pub fn on_click(mut self, effect: MockEffect) -> Self {
        self.on_click.push(effect);
        self
    }
}

#[derive(Debug, Clone, Default)]
enum QuitBehavior {
    #[default]
    Ok,
    SessionGone,
    Fail(String),
}

/// Initial state of every browser a [`MockLauncher`] starts
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    elements: Vec<MockElement>,
    failing_urls: Vec<String>,
    quit: QuitBehavior,
    maximize_fails: bool,
}

impl MockPage {
    /// Empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element
    #[must_use]
    pub fn with_element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Navigating to any URL containing `fragment` fails
    #[must_use]
    pub fn fail_navigation_to(mut self, fragment: impl Into<String>) -> Self {
        self.failing_urls.push(fragment.into());
        self
    }

    /// `quit` reports that the session is already gone
    #[must_use]
    pub fn quit_with_session_gone(mut self) -> Self {
        self.quit = QuitBehavior::SessionGone;
        self
    }

    /// `quit` fails with an unclassified error
    #[must_use]
    pub fn quit_with_error(mut self, message: impl Into<String>) -> Self {
        self.quit = QuitBehavior::Fail(message.into());
        self
    }

    /// `maximize_window` fails
    #[must_use]
    pub fn fail_maximize(mut self) -> Self {
        self.maximize_fails = true;
        self
    }
}

// =============================================================================
// DRIVER STATE
// =============================================================================

#[derive(Debug)]
struct LiveElement {
    spec: MockElement,
    id: ElementId,
    epoch: Instant,
    removed: bool,
}

#[derive(Debug)]
struct MockState {
    url: String,
    elements: Vec<LiveElement>,
    pending: Option<(Instant, String)>,
    failing_urls: Vec<String>,
    quit: QuitBehavior,
    maximize_fails: bool,
    next_id: u64,
    quits: u32,
    calls: Vec<String>,
}

impl MockState {
    fn from_page(page: MockPage) -> Self {
        let now = Instant::now();
        let mut state = Self {
            url: "about:blank".to_string(),
            elements: Vec::new(),
            pending: None,
            failing_urls: page.failing_urls,
            quit: page.quit,
            maximize_fails: page.maximize_fails,
            next_id: 0,
            quits: 0,
            calls: Vec::new(),
        };
        for spec in page.elements {
            state.insert(spec, now);
        }
        state
    }

    fn fresh_id(&mut self) -> ElementId {
        self.next_id += 1;
        ElementId::new(format!("mock-{}", self.next_id))
    }

    fn insert(&mut self, spec: MockElement, epoch: Instant) {
        let id = self.fresh_id();
        let removed = spec.detached;
        self.elements.push(LiveElement {
            spec,
            id,
            epoch,
            removed,
        });
    }

    fn settle(&mut self, now: Instant) {
        if let Some((due, _)) = &self.pending {
            if now >= *due {
                if let Some((_, url)) = self.pending.take() {
                    self.load(url, now);
                }
            }
        }
    }

    fn load(&mut self, url: String, now: Instant) {
        self.url = url;
        for el in &mut self.elements {
            el.epoch = now;
        }
    }

    fn is_present(&self, el: &LiveElement, now: Instant) -> bool {
        !el.removed
            && el
                .spec
                .on_url
                .as_ref()
                .map_or(true, |fragment| self.url.contains(fragment.as_str()))
            && now >= el.epoch + el.spec.appear_after
    }

    fn is_visible(el: &LiveElement, now: Instant) -> bool {
        el.spec
            .visible_after
            .is_some_and(|delay| now >= el.epoch + delay)
    }

    /// Resolve a live element, consuming one pending re-render if any
    fn resolve(&mut self, id: &ElementId, now: Instant) -> DriverResult<usize> {
        let stale = || DriverError::StaleElement { id: id.clone() };
        let idx = self
            .elements
            .iter()
            .position(|el| &el.id == id)
            .ok_or_else(stale)?;
        if !self.is_present(&self.elements[idx], now) {
            return Err(stale());
        }
        if self.elements[idx].spec.stale_times > 0 {
            let new_id = self.fresh_id();
            let el = &mut self.elements[idx];
            el.spec.stale_times -= 1;
            el.id = new_id;
            return Err(stale());
        }
        Ok(idx)
    }

    fn apply(&mut self, effects: Vec<MockEffect>, now: Instant) {
        for effect in effects {
            match effect {
                MockEffect::Navigate(url) => {
                    self.pending = None;
                    self.load(url, now);
                }
                MockEffect::NavigateAfter { url, delay } => {
                    self.pending = Some((now + delay, url));
                }
                MockEffect::Reveal(locator) => {
                    for el in self.elements.iter_mut().filter(|e| e.spec.locator == locator) {
                        el.removed = false;
                        el.epoch = now;
                        el.spec.appear_after = Duration::ZERO;
                        el.spec.visible_after = Some(Duration::ZERO);
                    }
                }
                MockEffect::Remove(locator) => {
                    for el in self.elements.iter_mut().filter(|e| e.spec.locator == locator) {
                        el.removed = true;
                    }
                }
                MockEffect::Insert(spec) => self.insert(spec, now),
                MockEffect::When {
                    field,
                    equals,
                    then,
                    otherwise,
                } => {
                    let matches = self
                        .elements
                        .iter()
                        .find(|el| el.spec.locator == field && self.is_present(el, now))
                        .is_some_and(|el| el.spec.value == equals);
                    self.apply(if matches { then } else { otherwise }, now);
                }
            }
        }
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// DRIVER
// =============================================================================

/// In-memory [`BrowserDriver`] following a [`MockPage`] script
#[derive(Debug, Clone)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    /// Create a driver showing `page`
    #[must_use]
    pub fn new(page: MockPage) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::from_page(page))),
        }
    }

    /// Inspection handle sharing this driver's state
    #[must_use]
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn record(&self, call: String) -> MutexGuard<'_, MockState> {
        let mut state = lock(&self.state);
        state.settle(Instant::now());
        state.calls.push(call);
        state
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn maximize_window(&self) -> DriverResult<()> {
        let state = self.record("maximize_window".to_string());
        if state.maximize_fails {
            return Err(DriverError::Launch {
                message: "window could not be maximized".to_string(),
            });
        }
        Ok(())
    }

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        let mut state = self.record(format!("navigate:{url}"));
        if state.failing_urls.iter().any(|f| url.contains(f.as_str())) {
            return Err(DriverError::Navigation {
                message: format!("net::ERR_NAME_NOT_RESOLVED at {url}"),
            });
        }
        state.pending = None;
        state.load(url.to_string(), Instant::now());
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        let state = self.record("current_url".to_string());
        Ok(state.url.clone())
    }

    async fn find_elements(&self, locator: &Locator) -> DriverResult<Vec<ElementId>> {
        let state = self.record(format!("find:{locator}"));
        let now = Instant::now();
        Ok(state
            .elements
            .iter()
            .filter(|el| el.spec.locator == *locator && state.is_present(el, now))
            .map(|el| el.id.clone())
            .collect())
    }

    async fn is_displayed(&self, id: &ElementId) -> DriverResult<bool> {
        let mut state = self.record(format!("is_displayed:{id}"));
        let now = Instant::now();
        let idx = state.resolve(id, now)?;
        Ok(MockState::is_visible(&state.elements[idx], now))
    }

    async fn is_enabled(&self, id: &ElementId) -> DriverResult<bool> {
        let mut state = self.record(format!("is_enabled:{id}"));
        let idx = state.resolve(id, Instant::now())?;
        Ok(state.elements[idx].spec.enabled)
    }

    async fn text(&self, id: &ElementId) -> DriverResult<String> {
        let mut state = self.record(format!("text:{id}"));
        let idx = state.resolve(id, Instant::now())?;
        Ok(state.elements[idx].spec.text.clone())
    }

    async fn clear(&self, id: &ElementId) -> DriverResult<()> {
        let mut state = self.record(format!("clear:{id}"));
        let idx = state.resolve(id, Instant::now())?;
        state.elements[idx].spec.value.clear();
        Ok(())
    }

    async fn send_keys(&self, id: &ElementId, text: &str) -> DriverResult<()> {
        let mut state = self.record(format!("send_keys:{id}:{text}"));
        let idx = state.resolve(id, Instant::now())?;
        state.elements[idx].spec.value.push_str(text);
        Ok(())
    }

    async fn click(&self, id: &ElementId) -> DriverResult<()> {
        let mut state = self.record(format!("click:{id}"));
        let now = Instant::now();
        let idx = state.resolve(id, now)?;
        let el = &state.elements[idx];
        if !el.spec.enabled || !MockState::is_visible(el, now) {
            return Err(DriverError::other(format!(
                "element {} is not interactable",
                el.spec.locator
            )));
        }
        let effects = el.spec.on_click.clone();
        state.apply(effects, now);
        Ok(())
    }

    async fn scroll_into_view(&self, id: &ElementId) -> DriverResult<()> {
        let mut state = self.record(format!("scroll_into_view:{id}"));
        state.resolve(id, Instant::now())?;
        Ok(())
    }

    async fn quit(&self) -> DriverResult<()> {
        let mut state = self.record("quit".to_string());
        state.quits += 1;
        match &state.quit {
            QuitBehavior::Ok => Ok(()),
            QuitBehavior::SessionGone => Err(DriverError::SessionGone {
                message: "invalid session id".to_string(),
            }),
            QuitBehavior::Fail(message) => Err(DriverError::other(message.clone())),
        }
    }
}

// =============================================================================
// INSPECTION
// =============================================================================

/// Read access to a [`MockDriver`]'s state after it has been boxed away
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// Every driver call in order, e.g. `navigate:https://…`, `click:mock-3`
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    /// Whether any call starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        lock(&self.state).calls.iter().any(|c| c.starts_with(prefix))
    }

    /// Number of calls starting with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Number of `quit` calls
    #[must_use]
    pub fn quit_count(&self) -> u32 {
        lock(&self.state).quits
    }

    /// Current URL
    #[must_use]
    pub fn url(&self) -> String {
        lock(&self.state).url.clone()
    }

    /// Typed value of the first element matching `locator`
    #[must_use]
    pub fn value_of(&self, locator: &Locator) -> Option<String> {
        lock(&self.state)
            .elements
            .iter()
            .find(|el| el.spec.locator == *locator && !el.removed)
            .map(|el| el.spec.value.clone())
    }
}

// =============================================================================
// LAUNCHER
// =============================================================================

#[derive(Debug, Default)]
struct LauncherState {
    launches: u32,
    kinds: Vec<BrowserKind>,
    drivers: Vec<MockHandle>,
}

/// [`DriverLauncher`] producing [`MockDriver`]s from one page script
#[derive(Debug, Clone)]
pub struct MockLauncher {
    page: MockPage,
    launch_error: Option<String>,
    state: Arc<Mutex<LauncherState>>,
}

impl MockLauncher {
    /// Launcher whose browsers show `page`
    #[must_use]
    pub fn new(page: MockPage) -> Self {
        Self {
            page,
            launch_error: None,
            state: Arc::new(Mutex::new(LauncherState::default())),
        }
    }

    /// Launcher whose every launch fails with `message`
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            launch_error: Some(message.into()),
            ..Self::new(MockPage::new())
        }
    }

    fn inner(&self) -> MutexGuard<'_, LauncherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of launch attempts
    #[must_use]
    pub fn launch_count(&self) -> u32 {
        self.inner().launches
    }

    /// Browser kinds requested, in order
    #[must_use]
    pub fn launched_kinds(&self) -> Vec<BrowserKind> {
        self.inner().kinds.clone()
    }

    /// Handles to every driver started so far
    #[must_use]
    pub fn drivers(&self) -> Vec<MockHandle> {
        self.inner().drivers.clone()
    }

    /// Handle to the most recently started driver
    #[must_use]
    pub fn last_driver(&self) -> Option<MockHandle> {
        self.inner().drivers.last().cloned()
    }

    /// Total `quit` calls across all drivers
    #[must_use]
    pub fn quit_count(&self) -> u32 {
        self.inner().drivers.iter().map(MockHandle::quit_count).sum()
    }
}

#[async_trait]
impl DriverLauncher for MockLauncher {
    async fn launch(&self, kind: BrowserKind) -> DriverResult<Box<dyn BrowserDriver>> {
        let mut inner = self.inner();
        inner.launches += 1;
        inner.kinds.push(kind);
        if let Some(message) = &self.launch_error {
            return Err(DriverError::Launch {
                message: message.clone(),
            });
        }
        let driver = MockDriver::new(self.page.clone());
        inner.drivers.push(driver.handle());
        Ok(Box::new(driver))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn find_one(driver: &MockDriver, locator: &Locator) -> ElementId {
        driver.find_elements(locator).await.unwrap().remove(0)
    }

    mod presence_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_element_appears_after_delay() {
            let loc = Locator::id("late");
            let driver = MockDriver::new(MockPage::new().with_element(
                MockElement::new(loc.clone()).appearing_after(Duration::from_millis(300)),
            ));
            assert!(driver.find_elements(&loc).await.unwrap().is_empty());
            tokio::time::advance(Duration::from_millis(300)).await;
            assert_eq!(driver.find_elements(&loc).await.unwrap().len(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_hidden_element_is_found_but_not_displayed() {
            let loc = Locator::css("[data-test=\"error\"]");
            let driver = MockDriver::new(MockPage::new().with_element(MockElement::new(loc.clone()).hidden()));
            let id = find_one(&driver, &loc).await;
            assert!(!driver.is_displayed(&id).await.unwrap());
        }

        #[tokio::test]
        async fn test_on_page_scoping() {
            let loc = Locator::id("inventory_container");
            let driver = MockDriver::new(
                MockPage::new().with_element(MockElement::new(loc.clone()).on_page("inventory.html")),
            );
            driver.navigate("https://shop.test/").await.unwrap();
            assert!(driver.find_elements(&loc).await.unwrap().is_empty());
            driver.navigate("https://shop.test/inventory.html").await.unwrap();
            assert_eq!(driver.find_elements(&loc).await.unwrap().len(), 1);
        }
    }

    mod staleness_tests {
        use super::*;

        #[tokio::test]
        async fn test_stale_once_then_new_id_works() {
            let loc = Locator::id("btn");
            let driver = MockDriver::new(MockPage::new().with_element(MockElement::new(loc.clone()).stale_times(1)));
            let old = find_one(&driver, &loc).await;
            assert!(driver.click(&old).await.unwrap_err().is_stale());
            let fresh = find_one(&driver, &loc).await;
            assert_ne!(old, fresh);
            driver.click(&fresh).await.unwrap();
        }

        #[tokio::test]
        async fn test_removed_element_is_stale() {
            let btn = Locator::id("remove");
            let target = Locator::id("target");
            let driver = MockDriver::new(
                MockPage::new()
                    .with_element(MockElement::new(btn.clone()).on_click(MockEffect::Remove(target.clone())))
                    .with_element(MockElement::new(target.clone())),
            );
            let target_id = find_one(&driver, &target).await;
            let btn_id = find_one(&driver, &btn).await;
            driver.click(&btn_id).await.unwrap();
            assert!(driver.text(&target_id).await.unwrap_err().is_stale());
            assert!(driver.find_elements(&target).await.unwrap().is_empty());
        }
    }

    mod effect_tests {
        use super::*;

        #[tokio::test]
        async fn test_when_branches_on_typed_value() {
            let field = Locator::id("user");
            let submit = Locator::id("go");
            let page = MockPage::new()
                .with_element(MockElement::new(field.clone()))
                .with_element(MockElement::new(submit.clone()).on_click(MockEffect::When {
                    field: field.clone(),
                    equals: "alice".into(),
                    then: vec![MockEffect::Navigate("https://shop.test/home".into())],
                    otherwise: vec![MockEffect::Insert(
                        MockElement::new(Locator::id("err")).with_text("nope"),
                    )],
                }));
            let driver = MockDriver::new(page);
            let handle = driver.handle();

            let f = find_one(&driver, &field).await;
            driver.send_keys(&f, "bob").await.unwrap();
            driver.click(&find_one(&driver, &submit).await).await.unwrap();
            assert_eq!(driver.find_elements(&Locator::id("err")).await.unwrap().len(), 1);

            driver.clear(&f).await.unwrap();
            driver.send_keys(&f, "alice").await.unwrap();
            driver.click(&find_one(&driver, &submit).await).await.unwrap();
            assert_eq!(handle.url(), "https://shop.test/home");
            assert_eq!(handle.value_of(&field).as_deref(), Some("alice"));
        }

        #[tokio::test]
        async fn test_detached_until_revealed() {
            let add = Locator::id("add");
            let remove = Locator::id("remove");
            let driver = MockDriver::new(
                MockPage::new()
                    .with_element(MockElement::new(add.clone()).on_click(MockEffect::Reveal(remove.clone())))
                    .with_element(MockElement::new(remove.clone()).detached()),
            );
            assert!(driver.find_elements(&remove).await.unwrap().is_empty());
            driver.click(&find_one(&driver, &add).await).await.unwrap();
            let id = find_one(&driver, &remove).await;
            assert!(driver.is_displayed(&id).await.unwrap());
        }

        #[tokio::test(start_paused = true)]
        async fn test_delayed_navigation() {
            let btn = Locator::id("go");
            let driver = MockDriver::new(MockPage::new().with_element(MockElement::new(btn.clone()).on_click(
                MockEffect::NavigateAfter {
                    url: "https://shop.test/inventory.html".into(),
                    delay: Duration::from_millis(500),
                },
            )));
            driver.click(&find_one(&driver, &btn).await).await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "about:blank");
            tokio::time::advance(Duration::from_millis(500)).await;
            assert!(driver.current_url().await.unwrap().contains("inventory"));
        }
    }

    mod launcher_tests {
        use super::*;

        #[tokio::test]
        async fn test_launcher_counts() {
            let launcher = MockLauncher::new(MockPage::new());
            let driver = launcher.launch(BrowserKind::HeadlessChromium).await.unwrap();
            driver.quit().await.unwrap();
            assert_eq!(launcher.launch_count(), 1);
            assert_eq!(launcher.quit_count(), 1);
            assert_eq!(launcher.launched_kinds(), vec![BrowserKind::HeadlessChromium]);
            assert!(launcher.last_driver().unwrap().was_called("quit"));
        }

        #[tokio::test]
        async fn test_failing_launcher() {
            let launcher = MockLauncher::failing("chrome not found");
            let err = launcher.launch(BrowserKind::Chromium).await.err().unwrap();
            assert!(matches!(err, DriverError::Launch { .. }));
            assert_eq!(launcher.launch_count(), 1);
            assert!(launcher.drivers().is_empty());
        }

        #[tokio::test]
        async fn test_quit_session_gone() {
            let launcher = MockLauncher::new(MockPage::new().quit_with_session_gone());
            let driver = launcher.launch(BrowserKind::Chromium).await.unwrap();
            assert!(driver.quit().await.unwrap_err().is_session_gone());
        }
    }
}
