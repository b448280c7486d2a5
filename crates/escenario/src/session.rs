//! Browser session lifecycle.
//!
//! A [`Session`] owns exactly one driver handle and moves through
//! `Uninitialized -> Active -> Closed`. Closing is idempotent: closing an
//! already closed session, or one whose browser is already gone, reports
//! [`CloseOutcome::AlreadyClosed`] instead of failing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::driver::{BrowserDriver, BrowserKind, DriverError, DriverLauncher};
use crate::result::{EscenarioError, EscenarioResult};
use crate::wait::WaitPolicy;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, browser not launched
    Uninitialized,
    /// Browser running
    Active,
    /// Browser released
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// What [`Session::close`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOutcome {
    /// The browser was quit
    Closed,
    /// There was nothing left to quit
    AlreadyClosed,
}

/// One browser instance driven by one scenario
pub struct Session {
    id: Uuid,
    kind: BrowserKind,
    state: SessionState,
    default_wait: WaitPolicy,
    driver: Option<Box<dyn BrowserDriver>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("default_wait", &self.default_wait)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create an uninitialized session
    #[must_use]
    pub fn new(kind: BrowserKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            state: SessionState::Uninitialized,
            default_wait: WaitPolicy::default(),
            driver: None,
        }
    }

    /// Launch a browser and maximize its window
    ///
    /// # Errors
    ///
    /// Returns [`EscenarioError::Launch`] if the browser cannot be started or
    /// its window cannot be maximized. A half-started browser is quit first.
    pub async fn start(launcher: &dyn DriverLauncher, kind: BrowserKind) -> EscenarioResult<Self> {
        let mut session = Self::new(kind);
        session.open(launcher).await?;
        Ok(session)
    }

    /// Launch the browser for an uninitialized session
    pub async fn open(&mut self, launcher: &dyn DriverLauncher) -> EscenarioResult<()> {
        if self.state != SessionState::Uninitialized {
            return Err(EscenarioError::InvalidState {
                message: format!("cannot open a session that is {}", self.state),
            });
        }

        tracing::debug!(session = %self.id, kind = %self.kind, "launching browser");
        let driver = launcher
            .launch(self.kind)
            .await
            .map_err(|e| EscenarioError::Launch {
                message: e.to_string(),
            })?;

        if let Err(e) = driver.maximize_window().await {
            if let Err(quit_err) = driver.quit().await {
                tracing::warn!(session = %self.id, error = %quit_err, "quit after failed maximize");
            }
            self.state = SessionState::Closed;
            return Err(EscenarioError::Launch {
                message: format!("failed to maximize window: {e}"),
            });
        }

        self.driver = Some(driver);
        self.state = SessionState::Active;
        tracing::info!(session = %self.id, kind = %self.kind, "session started");
        Ok(())
    }

    /// Session id used in logs
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Browser kind
    #[must_use]
    pub const fn kind(&self) -> BrowserKind {
        self.kind
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is usable
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Policy attached to handles from [`find_all`](Self::find_all)
    #[must_use]
    pub const fn default_wait(&self) -> WaitPolicy {
        self.default_wait
    }

    /// Set the default wait policy
    pub fn set_default_wait(&mut self, policy: WaitPolicy) {
        self.default_wait = policy;
    }

    /// The driver, if the session is active
    pub(crate) fn driver(&self) -> EscenarioResult<&dyn BrowserDriver> {
        match (&self.driver, self.state) {
            (Some(driver), SessionState::Active) => Ok(driver.as_ref()),
            _ => Err(EscenarioError::SessionNotActive {
                state: self.state.to_string(),
            }),
        }
    }

    /// Load `url`
    ///
    /// # Errors
    ///
    /// Returns [`EscenarioError::Navigation`] for an empty URL or when the
    /// driver reports a load failure.
    pub async fn navigate(&self, url: &str) -> EscenarioResult<()> {
        let driver = self.driver()?;
        if url.trim().is_empty() {
            return Err(EscenarioError::Navigation {
                url: url.to_string(),
                message: "empty URL".to_string(),
            });
        }
        tracing::info!(session = %self.id, url, "navigate");
        driver
            .navigate(url)
            .await
            .map_err(|e| EscenarioError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    /// URL of the current page
    pub async fn current_url(&self) -> EscenarioResult<String> {
        Ok(self.driver()?.current_url().await?)
    }

    /// Release the browser
    ///
    /// The session is `Closed` afterwards whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the driver error if quitting fails for a reason other than
    /// the session already being gone.
    pub async fn close(&mut self) -> EscenarioResult<CloseOutcome> {
        let previous = self.state;
        self.state = SessionState::Closed;
        let Some(driver) = self.driver.take() else {
            tracing::debug!(session = %self.id, state = %previous, "close on inactive session");
            return Ok(CloseOutcome::AlreadyClosed);
        };

        match driver.quit().await.map_err(quit_error) {
            Ok(()) => {
                tracing::info!(session = %self.id, "session closed");
                Ok(CloseOutcome::Closed)
            }
            Err(e @ EscenarioError::AlreadyClosed) => {
                tracing::warn!(session = %self.id, error = %e, "quit on a dead session");
                Ok(CloseOutcome::AlreadyClosed)
            }
            Err(e) => Err(e),
        }
    }
}

/// A quit on a session the browser already dropped is `AlreadyClosed`
fn quit_error(e: DriverError) -> EscenarioError {
    if e.is_session_gone() {
        tracing::debug!(error = %e, "driver reports session gone");
        EscenarioError::AlreadyClosed
    } else {
        EscenarioError::Driver(e)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state == SessionState::Active {
            tracing::warn!(session = %self.id, "session dropped while active");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockLauncher, MockPage};

    mod lifecycle_tests {
        use super::*;

        #[tokio::test]
        async fn test_start_maximizes_and_activates() {
            let launcher = MockLauncher::new(MockPage::new());
            let session = Session::start(&launcher, BrowserKind::Chromium).await.unwrap();
            assert_eq!(session.state(), SessionState::Active);
            assert!(launcher.last_driver().unwrap().was_called("maximize_window"));
        }

        #[tokio::test]
        async fn test_launch_failure() {
            let launcher = MockLauncher::failing("chrome not found");
            let err = Session::start(&launcher, BrowserKind::Chromium).await.unwrap_err();
            assert!(matches!(err, EscenarioError::Launch { .. }));
            assert!(err.to_string().contains("chrome not found"));
        }

        #[tokio::test]
        async fn test_maximize_failure_quits_browser() {
            let launcher = MockLauncher::new(MockPage::new().fail_maximize());
            let err = Session::start(&launcher, BrowserKind::Chromium).await.unwrap_err();
            assert!(matches!(err, EscenarioError::Launch { .. }));
            assert_eq!(launcher.quit_count(), 1);
        }

        #[tokio::test]
        async fn test_open_twice_is_invalid() {
            let launcher = MockLauncher::new(MockPage::new());
            let mut session = Session::start(&launcher, BrowserKind::Chromium).await.unwrap();
            assert!(matches!(
                session.open(&launcher).await,
                Err(EscenarioError::InvalidState { .. })
            ));
            session.close().await.unwrap();
        }
    }

    mod close_tests {
        use super::*;

        #[tokio::test]
        async fn test_close_is_idempotent() {
            let launcher = MockLauncher::new(MockPage::new());
            let mut session = Session::start(&launcher, BrowserKind::Chromium).await.unwrap();
            assert_eq!(session.close().await.unwrap(), CloseOutcome::Closed);
            assert_eq!(session.close().await.unwrap(), CloseOutcome::AlreadyClosed);
            assert_eq!(launcher.quit_count(), 1);
        }

        #[tokio::test]
        async fn test_close_uninitialized() {
            let mut session = Session::new(BrowserKind::HeadlessChromium);
            assert_eq!(session.close().await.unwrap(), CloseOutcome::AlreadyClosed);
            assert_eq!(session.state(), SessionState::Closed);
        }

        #[tokio::test]
        async fn test_dead_session_is_already_closed() {
            let launcher = MockLauncher::new(MockPage::new().quit_with_session_gone());
            let mut session = Session::start(&launcher, BrowserKind::Chromium).await.unwrap();
            assert_eq!(session.close().await.unwrap(), CloseOutcome::AlreadyClosed);
        }

        #[test]
        fn test_session_gone_maps_to_already_closed() {
            let gone = DriverError::SessionGone {
                message: "no such session".into(),
            };
            assert!(matches!(quit_error(gone), EscenarioError::AlreadyClosed));
            let other = DriverError::Other {
                message: "pipe broken".into(),
            };
            assert!(matches!(quit_error(other), EscenarioError::Driver(_)));
        }

        #[tokio::test]
        async fn test_quit_failure_still_closes() {
            let launcher = MockLauncher::new(MockPage::new().quit_with_error("pipe broken"));
            let mut session = Session::start(&launcher, BrowserKind::Chromium).await.unwrap();
            assert!(session.close().await.is_err());
            assert_eq!(session.state(), SessionState::Closed);
            assert_eq!(session.close().await.unwrap(), CloseOutcome::AlreadyClosed);
        }
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_and_current_url() {
            let launcher = MockLauncher::new(MockPage::new());
            let mut session = Session::start(&launcher, BrowserKind::Chromium).await.unwrap();
            session.navigate("https://shop.test/").await.unwrap();
            assert_eq!(session.current_url().await.unwrap(), "https://shop.test/");
            session.close().await.unwrap();
        }

        #[tokio::test]
        async fn test_navigation_errors() {
            let launcher = MockLauncher::new(MockPage::new().fail_navigation_to("offline"));
            let mut session = Session::start(&launcher, BrowserKind::Chromium).await.unwrap();
            let err = session.navigate("https://offline.test/").await.unwrap_err();
            assert!(matches!(err, EscenarioError::Navigation { .. }));
            let err = session.navigate("").await.unwrap_err();
            assert!(matches!(err, EscenarioError::Navigation { .. }));
            session.close().await.unwrap();
        }

        #[tokio::test]
        async fn test_operations_after_close_fail() {
            let launcher = MockLauncher::new(MockPage::new());
            let mut session = Session::start(&launcher, BrowserKind::Chromium).await.unwrap();
            session.close().await.unwrap();
            let err = session.current_url().await.unwrap_err();
            assert!(matches!(err, EscenarioError::SessionNotActive { .. }));
        }
    }
}
