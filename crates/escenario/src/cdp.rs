//! Chromium backend over the Chrome `DevTools` Protocol.
//!
//! Elements are resolved in page JavaScript and tagged with a
//! `data-escenario-id` attribute. Later calls look the node up by that tag;
//! a node that was removed or re-rendered no longer carries it and is
//! reported as [`DriverError::StaleElement`].

#![allow(clippy::significant_drop_tightening)]

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    Bounds, GetWindowForTargetParams, SetWindowBoundsParams, WindowState,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::BrowserSettings;
use crate::driver::{
    BrowserDriver, BrowserKind, DriverError, DriverLauncher, DriverResult, ElementId,
};
use crate::locator::Locator;

const TAG_ATTR: &str = "data-escenario-id";

fn session_or_other(err: CdpError) -> DriverError {
    match err {
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
            DriverError::SessionGone {
                message: err.to_string(),
            }
        }
        other => DriverError::other(other.to_string()),
    }
}

/// Launches Chromium through chromiumoxide
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    /// Launcher using `settings` for every browser
    #[must_use]
    pub const fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl DriverLauncher for ChromiumLauncher {
    async fn launch(&self, kind: BrowserKind) -> DriverResult<Box<dyn BrowserDriver>> {
        let driver = ChromiumDriver::launch(&self.settings, kind).await?;
        Ok(Box::new(driver))
    }
}

/// One Chromium process with one page
#[derive(Debug)]
pub struct ChromiumDriver {
    kind: BrowserKind,
    browser: Arc<Mutex<CdpBrowser>>,
    page: CdpPage,
    handler: tokio::task::JoinHandle<()>,
}

#[derive(Debug, Deserialize)]
struct Reply<T> {
    stale: bool,
    value: Option<T>,
}

impl ChromiumDriver {
    /// Start Chromium and open a blank page
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Launch`] if the process or page cannot be
    /// created.
    pub async fn launch(settings: &BrowserSettings, kind: BrowserKind) -> DriverResult<Self> {
        let launch_err = |message: String| DriverError::Launch { message };

        let mut builder = CdpConfig::builder().window_size(settings.window_width, settings.window_height);
        if !kind.is_headless() {
            builder = builder.with_head().arg("--start-maximized");
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = settings.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(launch_err)?;

        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .map_err(|e| launch_err(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| launch_err(e.to_string()))?;

        Ok(Self {
            kind,
            browser: Arc::new(Mutex::new(browser)),
            page,
            handler,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> DriverResult<T> {
        let result = self.page.evaluate(script).await.map_err(|e| match e {
            CdpError::JavascriptException(_) => DriverError::Script {
                message: e.to_string(),
            },
            other => session_or_other(other),
        })?;
        result.into_value().map_err(|e| DriverError::Script {
            message: e.to_string(),
        })
    }

    /// Run `body` against the tagged element bound to `el`
    async fn on_element<T: DeserializeOwned>(&self, id: &ElementId, body: &str) -> DriverResult<T> {
        let script = format!(
            "(() => {{ const el = document.querySelector('[{TAG_ATTR}=\"' + {id:?} + '\"]'); \
             if (!el || !el.isConnected) {{ return {{ stale: true, value: null }}; }} \
             return {{ stale: false, value: (() => {{ {body} }})() }}; }})()",
            id = id.as_str(),
        );
        let reply: Reply<T> = self.eval(script).await?;
        match (reply.stale, reply.value) {
            (false, Some(value)) => Ok(value),
            (true, _) => Err(DriverError::StaleElement { id: id.clone() }),
            (false, None) => Err(DriverError::Script {
                message: format!("element {id} returned no value"),
            }),
        }
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn maximize_window(&self) -> DriverResult<()> {
        if self.kind.is_headless() {
            return Ok(());
        }
        let window = self
            .page
            .execute(GetWindowForTargetParams::default())
            .await
            .map_err(session_or_other)?;
        let bounds = Bounds {
            window_state: Some(WindowState::Maximized),
            ..Default::default()
        };
        self.page
            .execute(SetWindowBoundsParams::new(window.result.window_id, bounds))
            .await
            .map_err(session_or_other)?;
        Ok(())
    }

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        self.page.goto(url).await.map_err(|e| DriverError::Navigation {
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        let url = self.page.url().await.map_err(session_or_other)?;
        Ok(url.unwrap_or_default())
    }

    async fn find_elements(&self, locator: &Locator) -> DriverResult<Vec<ElementId>> {
        let script = format!(
            "(() => {{ const nodes = {query}; \
             window.__escenarioSeq = window.__escenarioSeq || 0; \
             return nodes.map(n => {{ \
               if (!n.hasAttribute('{TAG_ATTR}')) {{ n.setAttribute('{TAG_ATTR}', 'esc-' + (++window.__escenarioSeq)); }} \
               return n.getAttribute('{TAG_ATTR}'); }}); }})()",
            query = locator.to_query_all(),
        );
        let ids: Vec<String> = self.eval(script).await?;
        Ok(ids.into_iter().map(ElementId::new).collect())
    }

    async fn is_displayed(&self, id: &ElementId) -> DriverResult<bool> {
        self.on_element(
            id,
            "const t = el.tagName === 'OPTION' ? (el.closest('select') || el) : el; \
             const s = window.getComputedStyle(t); const r = t.getBoundingClientRect(); \
             return s.display !== 'none' && s.visibility !== 'hidden' && r.width > 0 && r.height > 0;",
        )
        .await
    }

    async fn is_enabled(&self, id: &ElementId) -> DriverResult<bool> {
        self.on_element(id, "return !el.disabled;").await
    }

    async fn text(&self, id: &ElementId) -> DriverResult<String> {
        self.on_element(id, "return (el.innerText ?? el.textContent ?? '').trim();")
            .await
    }

    async fn clear(&self, id: &ElementId) -> DriverResult<()> {
        let _: bool = self
            .on_element(
                id,
                "const d = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value'); \
                 if (d && d.set) { d.set.call(el, ''); } else { el.value = ''; } \
                 el.dispatchEvent(new Event('input', { bubbles: true })); return true;",
            )
            .await?;
        Ok(())
    }

    async fn send_keys(&self, id: &ElementId, text: &str) -> DriverResult<()> {
        let _: bool = self.on_element(id, "el.focus(); return true;").await?;
        let selector = format!("[{TAG_ATTR}=\"{}\"]", id.as_str());
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::StaleElement { id: id.clone() })?;
        element.type_str(text).await.map_err(session_or_other)?;
        Ok(())
    }

    async fn click(&self, id: &ElementId) -> DriverResult<()> {
        let is_option: bool = self.on_element(id, "return el.tagName === 'OPTION';").await?;
        if is_option {
            let _: bool = self
                .on_element(
                    id,
                    "const sel = el.closest('select'); if (!sel) { el.selected = true; return true; } \
                     const d = Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, 'value'); \
                     d.set.call(sel, el.value); \
                     sel.dispatchEvent(new Event('change', { bubbles: true })); return true;",
                )
                .await?;
            return Ok(());
        }
        let selector = format!("[{TAG_ATTR}=\"{}\"]", id.as_str());
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::StaleElement { id: id.clone() })?;
        element.click().await.map_err(session_or_other)?;
        Ok(())
    }

    async fn scroll_into_view(&self, id: &ElementId) -> DriverResult<()> {
        let _: bool = self
            .on_element(id, "el.scrollIntoView({ block: 'center', inline: 'center' }); return true;")
            .await?;
        Ok(())
    }

    async fn quit(&self) -> DriverResult<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(session_or_other)?;
        // reap the child so it does not linger as a zombie
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "waiting for chromium exit");
        }
        self.handler.abort();
        Ok(())
    }
}
