//! Runner configuration.
//!
//! Every field has a default, so an empty YAML document is a valid config.
//!
//! ```yaml
//! base_url: https://www.saucedemo.com/
//! browser:
//!   kind: headless-chromium
//!   sandbox: false
//! wait:
//!   timeout_ms: 15000
//!   poll_interval_ms: 100
//! scenario_timeout_ms: 60000
//! fail_fast: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::driver::BrowserKind;
use crate::result::{EscenarioError, EscenarioResult};
use crate::wait::WaitPolicy;

/// Default per-scenario time budget (60 seconds)
pub const DEFAULT_SCENARIO_TIMEOUT_MS: u64 = 60_000;

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Headed or headless Chromium
    pub kind: BrowserKind,
    /// Path to the chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Initial window width
    pub window_width: u32,
    /// Initial window height
    pub window_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            kind: BrowserKind::Chromium,
            chromium_path: None,
            sandbox: true,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

impl BrowserSettings {
    /// Set browser kind
    #[must_use]
    pub const fn with_kind(mut self, kind: BrowserKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Configuration for a [`Runner`](crate::Runner)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Base URL of the application under test
    pub base_url: Option<String>,
    /// Browser launch settings
    pub browser: BrowserSettings,
    /// Default wait policy for element waits
    pub wait: WaitPolicy,
    /// Per-scenario time budget in milliseconds
    pub scenario_timeout_ms: u64,
    /// Skip remaining scenarios after the first failure
    pub fail_fast: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            browser: BrowserSettings::default(),
            wait: WaitPolicy::default(),
            scenario_timeout_ms: DEFAULT_SCENARIO_TIMEOUT_MS,
            fail_fast: false,
        }
    }
}

impl RunnerConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> EscenarioResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> EscenarioResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded runner config");
        Self::from_yaml_str(&text)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> EscenarioResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> EscenarioResult<()> {
        if self.scenario_timeout_ms == 0 {
            return Err(EscenarioError::config("scenario_timeout_ms must be > 0"));
        }
        if let Some(url) = &self.base_url {
            if url.trim().is_empty() {
                return Err(EscenarioError::config("base_url must not be empty"));
            }
        }
        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(EscenarioError::config("window size must be non-zero"));
        }
        Ok(())
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set browser kind
    #[must_use]
    pub const fn with_browser_kind(mut self, kind: BrowserKind) -> Self {
        self.browser.kind = kind;
        self
    }

    /// Set default wait policy
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Set per-scenario timeout (zero is raised to 1)
    #[must_use]
    pub fn with_scenario_timeout_ms(mut self, ms: u64) -> Self {
        self.scenario_timeout_ms = ms.max(1);
        self
    }

    /// Set fail fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Per-scenario timeout as Duration
    #[must_use]
    pub const fn scenario_timeout(&self) -> Duration {
        Duration::from_millis(self.scenario_timeout_ms)
    }
}
