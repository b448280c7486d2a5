//! Result and error types for Escenario.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::driver::DriverError;
use crate::locator::Locator;

/// Result type for Escenario operations
pub type EscenarioResult<T> = Result<T, EscenarioError>;

/// Why an interaction with a resolved element failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionFailure {
    /// The handle went stale, and stayed stale after one re-resolution
    Stale,
    /// The element never became visible and enabled within the wait policy
    NotInteractable,
    /// The driver rejected the interaction
    Rejected,
}

impl std::fmt::Display for InteractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Stale => "element is stale",
            Self::NotInteractable => "element never became interactable",
            Self::Rejected => "driver rejected the interaction",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in Escenario
#[derive(Debug, Error)]
pub enum EscenarioError {
    /// Browser could not be started
    #[error("Failed to launch browser: {message}")]
    Launch {
        /// Error message
        message: String,
    },

    /// Navigation failed (network error or driver timeout)
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// URL never contained the expected fragment
    #[error("URL did not contain {fragment:?} within {timeout_ms}ms (last seen: {last_url})")]
    NavigationTimeout {
        /// Expected fragment
        fragment: String,
        /// Last URL observed while polling
        last_url: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// No element matched the locator before the timeout
    #[error("Element {locator} not found within {timeout_ms}ms")]
    ElementNotFound {
        /// Locator that was polled
        locator: Locator,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Element exists but never became visible before the timeout
    #[error("Element {locator} not visible within {timeout_ms}ms")]
    ElementNotVisible {
        /// Locator that was polled
        locator: Locator,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Click/type could not be performed
    #[error("Interaction with {locator} failed: {reason}")]
    Interaction {
        /// Locator of the element
        locator: Locator,
        /// Failure reason
        reason: InteractionFailure,
    },

    /// Session was already gone when it was closed
    #[error("Session already closed")]
    AlreadyClosed,

    /// Operation called on a session that is not active
    #[error("Session is not active (state: {state})")]
    SessionNotActive {
        /// Current session state
        state: String,
    },

    /// Scenario exceeded its time budget
    #[error("Scenario timed out after {ms}ms")]
    ScenarioTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Hard assertion failed inside a step
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Invalid state error (operation called in wrong state)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Unclassified driver failure
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse error classification used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// [`EscenarioError::Launch`]
    LaunchError,
    /// [`EscenarioError::Navigation`]
    NavigationError,
    /// [`EscenarioError::NavigationTimeout`]
    NavigationTimeoutError,
    /// [`EscenarioError::ElementNotFound`]
    ElementNotFoundError,
    /// [`EscenarioError::ElementNotVisible`]
    ElementNotVisibleError,
    /// [`EscenarioError::Interaction`]
    InteractionError,
    /// [`EscenarioError::AlreadyClosed`]
    AlreadyClosed,
    /// [`EscenarioError::SessionNotActive`]
    SessionNotActive,
    /// [`EscenarioError::ScenarioTimeout`]
    ScenarioTimeout,
    /// [`EscenarioError::AssertionFailed`]
    AssertionFailed,
    /// Anything else
    Other,
}

impl ErrorKind {
    /// Stable name used in text reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LaunchError => "LaunchError",
            Self::NavigationError => "NavigationError",
            Self::NavigationTimeoutError => "NavigationTimeoutError",
            Self::ElementNotFoundError => "ElementNotFoundError",
            Self::ElementNotVisibleError => "ElementNotVisibleError",
            Self::InteractionError => "InteractionError",
            Self::AlreadyClosed => "AlreadyClosed",
            Self::SessionNotActive => "SessionNotActive",
            Self::ScenarioTimeout => "ScenarioTimeout",
            Self::AssertionFailed => "AssertionFailed",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EscenarioError {
    /// Classify this error for reporting
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Launch { .. } => ErrorKind::LaunchError,
            Self::Navigation { .. } => ErrorKind::NavigationError,
            Self::NavigationTimeout { .. } => ErrorKind::NavigationTimeoutError,
            Self::ElementNotFound { .. } => ErrorKind::ElementNotFoundError,
            Self::ElementNotVisible { .. } => ErrorKind::ElementNotVisibleError,
            Self::Interaction { .. } => ErrorKind::InteractionError,
            Self::AlreadyClosed => ErrorKind::AlreadyClosed,
            Self::SessionNotActive { .. } => ErrorKind::SessionNotActive,
            Self::ScenarioTimeout { .. } => ErrorKind::ScenarioTimeout,
            Self::AssertionFailed { .. } => ErrorKind::AssertionFailed,
            Self::InvalidState { .. }
            | Self::Config { .. }
            | Self::Driver(_)
            | Self::Io(_)
            | Self::Yaml(_)
            | Self::Json(_) => ErrorKind::Other,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }
}
