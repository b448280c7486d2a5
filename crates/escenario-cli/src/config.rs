//! CLI configuration

use escenario::{BrowserKind, RunnerConfig, WaitPolicy};
use serde::{Deserialize, Serialize};

use crate::commands::ConfigOverrides;
use crate::error::{CliError, CliResult};
use crate::storefront::DEFAULT_BASE_URL;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default log directive when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stdout()),
        }
    }
}

/// CLI presentation settings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Effective runner configuration: file (or defaults), then flags and
/// environment
pub fn build_runner_config(overrides: &ConfigOverrides) -> CliResult<RunnerConfig> {
    let mut config = match &overrides.config {
        Some(path) => RunnerConfig::from_file(path)?,
        None => RunnerConfig::default(),
    };

    if let Some(url) = &overrides.base_url {
        config.base_url = Some(url.clone());
    }
    if config.base_url.is_none() {
        config.base_url = Some(DEFAULT_BASE_URL.to_string());
    }

    if overrides.timeout_ms.is_some() || overrides.poll_interval_ms.is_some() {
        let timeout = overrides.timeout_ms.unwrap_or(config.wait.timeout_ms());
        let interval = overrides
            .poll_interval_ms
            .unwrap_or(config.wait.poll_interval_ms());
        config.wait = WaitPolicy::try_new(timeout, interval)
            .map_err(|e| CliError::invalid_argument(e.to_string()))?;
    }
    if let Some(ms) = overrides.scenario_timeout_ms {
        if ms == 0 {
            return Err(CliError::invalid_argument("--scenario-timeout-ms must be > 0"));
        }
        config.scenario_timeout_ms = ms;
    }

    if overrides.headless {
        config.browser.kind = BrowserKind::HeadlessChromium;
    }
    if overrides.no_sandbox {
        config.browser.sandbox = false;
    }
    if let Some(path) = &overrides.chromium_path {
        config.browser.chromium_path = Some(path.clone());
    }
    if overrides.fail_fast {
        config.fail_fast = true;
    }

    config.validate()?;
    Ok(config)
}
