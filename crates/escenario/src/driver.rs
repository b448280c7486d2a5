//! Browser driver seam.
//!
//! [`BrowserDriver`] is the narrow set of primitives the interaction layer
//! needs. Everything above it (waits, retries, staleness handling) is written
//! once against this trait, so backends only translate calls.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  BrowserDriver (async trait)                                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐      ┌──────────────────────────┐  │
//! │  │  ChromiumDriver      │      │  MockDriver              │  │
//! │  │  (feature "browser") │      │  scripted in-memory page │  │
//! │  │  CDP, chromiumoxide  │      │  used by every test      │  │
//! │  └──────────────────────┘      └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locator::Locator;

/// Opaque, driver-issued identifier of a resolved element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    /// Wrap a driver-issued id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw id string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which browser to launch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrowserKind {
    /// Headed Chromium with a maximized window
    #[default]
    Chromium,
    /// Headless Chromium
    HeadlessChromium,
}

impl BrowserKind {
    /// Whether the browser runs without a window
    #[must_use]
    pub const fn is_headless(self) -> bool {
        matches!(self, Self::HeadlessChromium)
    }

    /// Name used in config files and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::HeadlessChromium => "headless-chromium",
        }
    }
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures reported by a driver backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The element reference no longer points at a live node
    #[error("stale element reference: {id}")]
    StaleElement {
        /// The stale id
        id: ElementId,
    },

    /// The browser session no longer exists
    #[error("browser session is gone: {message}")]
    SessionGone {
        /// Error message
        message: String,
    },

    /// Page load failed
    #[error("navigation failed: {message}")]
    Navigation {
        /// Error message
        message: String,
    },

    /// Browser process could not be started or configured
    #[error("launch failed: {message}")]
    Launch {
        /// Error message
        message: String,
    },

    /// Script evaluation failed
    #[error("script error: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Anything else
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl DriverError {
    /// Create an unclassified driver error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether this error means the element went stale
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }

    /// Whether this error means the session is already gone
    #[must_use]
    pub const fn is_session_gone(&self) -> bool {
        matches!(self, Self::SessionGone { .. })
    }
}

/// Result type for driver calls
pub type DriverResult<T> = Result<T, DriverError>;

/// Primitive browser operations used by a [`Session`](crate::Session).
///
/// Element operations must report a detached or re-rendered node as
/// [`DriverError::StaleElement`] rather than silently acting on a new one.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Maximize the browser window
    async fn maximize_window(&self) -> DriverResult<()>;

    /// Load `url` and wait for the driver's own load signal
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// URL of the current page
    async fn current_url(&self) -> DriverResult<String>;

    /// All elements currently matching `locator`, in document order
    async fn find_elements(&self, locator: &Locator) -> DriverResult<Vec<ElementId>>;

    /// Whether the element is rendered and visible
    async fn is_displayed(&self, id: &ElementId) -> DriverResult<bool>;

    /// Whether the element accepts input
    async fn is_enabled(&self, id: &ElementId) -> DriverResult<bool>;

    /// Visible text of the element
    async fn text(&self, id: &ElementId) -> DriverResult<String>;

    /// Clear an input's value
    async fn clear(&self, id: &ElementId) -> DriverResult<()>;

    /// Type `text` into the element
    async fn send_keys(&self, id: &ElementId, text: &str) -> DriverResult<()>;

    /// Click the element
    async fn click(&self, id: &ElementId) -> DriverResult<()>;

    /// Scroll the element into the viewport
    async fn scroll_into_view(&self, id: &ElementId) -> DriverResult<()>;

    /// End the browser session
    async fn quit(&self) -> DriverResult<()>;
}

/// Starts browsers
#[async_trait]
pub trait DriverLauncher: Send + Sync {
    /// Launch a browser of the given kind
    async fn launch(&self, kind: BrowserKind) -> DriverResult<Box<dyn BrowserDriver>>;
}
