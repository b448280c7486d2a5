//! Resolved element references.

use uuid::Uuid;

use crate::driver::ElementId;
use crate::locator::Locator;
use crate::wait::WaitPolicy;

/// A driver-issued reference to one element, plus what is needed to
/// resolve it again.
///
/// A handle is only valid until the DOM node behind it is removed or
/// re-rendered. Interactions that find it stale re-run the original
/// [`Locator`] once with the same [`WaitPolicy`] and refresh the handle in
/// place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    id: ElementId,
    locator: Locator,
    policy: WaitPolicy,
    session: Uuid,
}

impl ElementHandle {
    pub(crate) fn new(id: ElementId, locator: Locator, policy: WaitPolicy, session: Uuid) -> Self {
        Self {
            id,
            locator,
            policy,
            session,
        }
    }

    /// Driver-issued element id
    #[must_use]
    pub const fn id(&self) -> &ElementId {
        &self.id
    }

    /// Locator this handle was resolved from
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Policy used to resolve it, reused on re-resolution
    #[must_use]
    pub const fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// Id of the owning session
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.locator, self.id)
    }
}
