//! Page Object Model support.
//!
//! A page object names a page by the URL path it lives at and by the element
//! that signals it finished rendering. Its other locators are plain data on
//! the implementing type.
//!
//! ```ignore
//! struct InventoryPage;
//!
//! impl PageObject for InventoryPage {
//!     fn url_path(&self) -> &str {
//!         "inventory.html"
//!     }
//!
//!     fn ready_locator(&self) -> Locator {
//!         Locator::id("inventory_container")
//!     }
//! }
//!
//! page_object::open(&InventoryPage, ctx).await?;
//! ```

use crate::context::ScenarioContext;
use crate::element::ElementHandle;
use crate::locator::Locator;
use crate::result::EscenarioResult;
use crate::wait::{WaitPolicy, NAVIGATION_TIMEOUT_MS};

/// A page or component of the application under test
pub trait PageObject {
    /// Path relative to the base URL (empty for the landing page)
    fn url_path(&self) -> &str;

    /// Element that is visible once the page has rendered
    fn ready_locator(&self) -> Locator;

    /// Substring the current URL contains while this page is shown
    fn url_fragment(&self) -> &str {
        self.url_path().trim_matches('/')
    }

    /// How long to wait for the page to render
    fn load_timeout_ms(&self) -> u64 {
        NAVIGATION_TIMEOUT_MS
    }

    /// Page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

fn load_policy<P: PageObject + ?Sized>(page: &P, ctx: &ScenarioContext) -> WaitPolicy {
    ctx.wait().with_timeout(page.load_timeout_ms())
}

/// Navigate to `page` and wait for it to render
///
/// # Errors
///
/// Propagates navigation errors, and [`crate::EscenarioError::ElementNotVisible`]
/// or [`crate::EscenarioError::ElementNotFound`] if the ready element never
/// shows.
pub async fn open<P: PageObject + ?Sized>(page: &P, ctx: &mut ScenarioContext) -> EscenarioResult<ElementHandle> {
    let url = ctx.url_for(page.url_path())?;
    tracing::info!(page = page.page_name(), %url, "opening page");
    ctx.navigate(&url).await?;
    wait_loaded(page, ctx).await
}

/// Wait until `page` is shown: URL first, then the ready element
///
/// # Errors
///
/// [`crate::EscenarioError::NavigationTimeout`] if the URL never matches;
/// otherwise as [`open`].
pub async fn wait_loaded<P: PageObject + ?Sized>(
    page: &P,
    ctx: &mut ScenarioContext,
) -> EscenarioResult<ElementHandle> {
    let policy = load_policy(page, ctx);
    let fragment = page.url_fragment();
    if !fragment.is_empty() {
        ctx.wait_for_url_contains(fragment, policy).await?;
    }
    let handle = ctx.session()?.locate_visible(&page.ready_locator(), policy).await?;
    tracing::debug!(page = page.page_name(), element = %handle, "page ready");
    Ok(handle)
}

/// Whether `page` is shown right now, without waiting
///
/// # Errors
///
/// Only driver and session errors; a missing element is `Ok(false)`.
pub async fn is_loaded<P: PageObject + ?Sized>(page: &P, ctx: &ScenarioContext) -> EscenarioResult<bool> {
    let session = ctx.session()?;
    let url = session.current_url().await?;
    if !url.contains(page.url_fragment()) {
        return Ok(false);
    }
    for handle in session.find_all(&page.ready_locator()).await? {
        if session.is_displayed(&handle).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::mock::{MockElement, MockLauncher, MockPage};
    use crate::result::EscenarioError;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug)]
    struct Inventory;

    impl PageObject for Inventory {
        fn url_path(&self) -> &str {
            "/inventory.html"
        }

        fn ready_locator(&self) -> Locator {
            Locator::id("inventory_container")
        }

        fn load_timeout_ms(&self) -> u64 {
            500
        }
    }

    #[derive(Debug)]
    struct Landing;

    impl PageObject for Landing {
        fn url_path(&self) -> &str {
            ""
        }

        fn ready_locator(&self) -> Locator {
            Locator::id("login-button")
        }
    }

    async fn started(page: MockPage) -> ScenarioContext {
        let config = RunnerConfig::new().with_base_url("https://shop.test/");
        let mut ctx = ScenarioContext::new("pages", Arc::new(MockLauncher::new(page)), &config);
        ctx.before_scenario().await.unwrap();
        ctx
    }

    mod trait_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            assert_eq!(Inventory.url_fragment(), "inventory.html");
            assert_eq!(Landing.url_fragment(), "");
            assert_eq!(Landing.load_timeout_ms(), NAVIGATION_TIMEOUT_MS);
            assert!(Inventory.page_name().ends_with("Inventory"));
        }
    }

    mod load_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_open_waits_for_ready_element() {
            let page = MockPage::new().with_element(
                MockElement::new(Locator::id("inventory_container"))
                    .on_page("inventory.html")
                    .visible_after(Duration::from_millis(200)),
            );
            let mut ctx = started(page).await;
            let handle = open(&Inventory, &mut ctx).await.unwrap();
            assert_eq!(handle.locator(), &Locator::id("inventory_container"));
            assert_eq!(ctx.page_hint(), Some("https://shop.test/inventory.html"));
            assert!(is_loaded(&Inventory, &ctx).await.unwrap());
            ctx.after_scenario().await;
        }

        #[tokio::test(start_paused = true)]
        async fn test_wrong_page_times_out() {
            let page = MockPage::new().with_element(MockElement::new(Locator::id("login-button")));
            let mut ctx = started(page).await;
            open(&Landing, &mut ctx).await.unwrap();
            assert!(!is_loaded(&Inventory, &ctx).await.unwrap());
            let err = wait_loaded(&Inventory, &mut ctx).await.unwrap_err();
            assert!(matches!(err, EscenarioError::NavigationTimeout { .. }));
            ctx.after_scenario().await;
        }
    }
}
