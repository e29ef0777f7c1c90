//! # Session Controller
//!
//! Authentication lifecycle gating the store's boundary calls: credential
//! acquisition, expiry detection on unauthorized responses, a silent
//! refresh attempt, and hard-expiry fallback to explicit login.
//!
//! Entering `expired` never clears the store's in-memory task set; local
//! state stays readable and editable, just unsynced.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{QuadrantError, QuadrantResult};

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No credential held
    Unauthenticated,
    /// Credential held and believed valid
    Authenticated,
    /// A previously valid credential was rejected by the boundary
    Expired,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Unauthenticated
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// A bearer credential plus optional account label for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCredential {
    pub token: String,
    pub account: Option<String>,
}

impl AccessCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            account: None,
        }
    }

    pub fn with_account(token: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            account: Some(account.into()),
        }
    }

    /// Credential for the offline demo boundary, which ignores tokens.
    pub fn demo() -> Self {
        Self::with_account("demo", "Guest User")
    }
}

/// Events driving session transitions
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Explicit user-driven login granting a credential
    LogIn(AccessCredential),
    /// The boundary signalled an unauthorized response
    Unauthorized,
    /// A silent re-authentication attempt succeeded
    Refreshed(AccessCredential),
    /// Explicit logout
    LogOut,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::LogIn(_) => "log_in",
            Self::Unauthorized => "unauthorized",
            Self::Refreshed(_) => "refreshed",
            Self::LogOut => "log_out",
        }
    }
}

/// Silent re-authentication hook. Implementations exchange a refresh
/// credential (or equivalent) for a fresh access credential without user
/// interaction.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> QuadrantResult<AccessCredential>;
}

/// The session state machine.
///
/// Owns the cached credential; transitions follow a fixed table and invalid
/// combinations are rejected rather than silently ignored.
pub struct SessionController {
    state: SessionState,
    credential: Option<AccessCredential>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("has_credential", &self.credential.is_some())
            .field("has_refresher", &self.refresher.is_some())
            .finish()
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            credential: None,
            refresher: None,
        }
    }

    /// Attach a silent-refresh hook used when the boundary reports an
    /// unauthorized response.
    #[must_use]
    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the store may issue boundary calls.
    pub fn is_authorized(&self) -> bool {
        self.state == SessionState::Authenticated && self.credential.is_some()
    }

    /// Current bearer token, if any usable credential is held.
    pub fn bearer_token(&self) -> Option<String> {
        if self.state == SessionState::Authenticated {
            self.credential.as_ref().map(|c| c.token.clone())
        } else {
            None
        }
    }

    pub fn credential(&self) -> Option<&AccessCredential> {
        self.credential.as_ref()
    }

    fn refresher(&self) -> Option<Arc<dyn TokenRefresher>> {
        self.refresher.clone()
    }

    /// Determine the target state for an event, without applying it.
    fn determine_target_state(
        &self,
        current: SessionState,
        event: &SessionEvent,
    ) -> QuadrantResult<SessionState> {
        let target = match (current, event) {
            (SessionState::Unauthenticated, SessionEvent::LogIn(_)) => SessionState::Authenticated,
            // Re-login replaces the credential; login out of expiry is the
            // hard-expiry fallback.
            (SessionState::Authenticated, SessionEvent::LogIn(_)) => SessionState::Authenticated,
            (SessionState::Expired, SessionEvent::LogIn(_)) => SessionState::Authenticated,

            (SessionState::Authenticated, SessionEvent::Unauthorized) => SessionState::Expired,
            // Repeated unauthorized signals while already expired are benign.
            (SessionState::Expired, SessionEvent::Unauthorized) => SessionState::Expired,

            (SessionState::Expired, SessionEvent::Refreshed(_)) => SessionState::Authenticated,

            (SessionState::Authenticated, SessionEvent::LogOut) => SessionState::Unauthenticated,
            (SessionState::Expired, SessionEvent::LogOut) => SessionState::Unauthenticated,

            (from, event) => {
                return Err(QuadrantError::InvalidTransition {
                    from: from.to_string(),
                    event: event.name().to_string(),
                })
            }
        };
        Ok(target)
    }

    /// Apply an event, updating state and cached credential.
    pub fn apply(&mut self, event: SessionEvent) -> QuadrantResult<SessionState> {
        let target = self.determine_target_state(self.state, &event)?;

        match &event {
            SessionEvent::LogIn(cred) | SessionEvent::Refreshed(cred) => {
                self.credential = Some(cred.clone());
            }
            SessionEvent::LogOut => {
                self.credential = None;
            }
            // Expiry keeps the credential cached so account details remain
            // displayable; it is simply no longer usable.
            SessionEvent::Unauthorized => {}
        }

        info!(
            from = %self.state,
            to = %target,
            event = event.name(),
            "session transition"
        );
        self.state = target;
        Ok(target)
    }
}

/// Read-only view of the current bearer credential, consumed by boundary
/// clients on every call so refreshed tokens take effect immediately.
pub trait CredentialSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Cloneable handle sharing one [`SessionController`] between the store,
/// boundary clients, and the UI layer.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<SessionController>>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.lock().fmt(f)
    }
}

impl SessionHandle {
    pub fn new(controller: SessionController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state()
    }

    pub fn is_authorized(&self) -> bool {
        self.inner.lock().is_authorized()
    }

    pub fn credential(&self) -> Option<AccessCredential> {
        self.inner.lock().credential().cloned()
    }

    pub fn log_in(&self, credential: AccessCredential) -> QuadrantResult<SessionState> {
        self.inner.lock().apply(SessionEvent::LogIn(credential))
    }

    pub fn log_out(&self) -> QuadrantResult<SessionState> {
        self.inner.lock().apply(SessionEvent::LogOut)
    }

    /// Route an unauthorized boundary response: transition to expired, then
    /// attempt a silent refresh. Returns `true` when the refresh succeeded
    /// and the session is authenticated again.
    pub async fn handle_unauthorized(&self) -> bool {
        // Take the refresher out before awaiting; the lock must not be held
        // across an await point.
        let refresher = {
            let mut ctrl = self.inner.lock();
            if let Err(e) = ctrl.apply(SessionEvent::Unauthorized) {
                debug!(error = %e, "unauthorized signal ignored");
                return false;
            }
            ctrl.refresher()
        };

        let Some(refresher) = refresher else {
            warn!("session expired and no silent-refresh hook is configured");
            return false;
        };

        match refresher.refresh().await {
            Ok(credential) => {
                let mut ctrl = self.inner.lock();
                match ctrl.apply(SessionEvent::Refreshed(credential)) {
                    Ok(_) => {
                        info!("silent re-authentication succeeded");
                        true
                    }
                    Err(e) => {
                        debug!(error = %e, "refresh result discarded");
                        false
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "silent re-authentication failed; explicit login required");
                false
            }
        }
    }
}

impl CredentialSource for SessionHandle {
    fn bearer_token(&self) -> Option<String> {
        self.inner.lock().bearer_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticRefresher {
        credential: Option<AccessCredential>,
    }

    #[async_trait]
    impl TokenRefresher for StaticRefresher {
        async fn refresh(&self) -> QuadrantResult<AccessCredential> {
            self.credential
                .clone()
                .ok_or_else(|| QuadrantError::Unauthorized)
        }
    }

    #[test]
    fn test_login_and_logout() {
        let mut ctrl = SessionController::new();
        assert_eq!(ctrl.state(), SessionState::Unauthenticated);
        assert!(!ctrl.is_authorized());

        ctrl.apply(SessionEvent::LogIn(AccessCredential::new("tok")))
            .unwrap();
        assert_eq!(ctrl.state(), SessionState::Authenticated);
        assert!(ctrl.is_authorized());
        assert_eq!(ctrl.bearer_token().as_deref(), Some("tok"));

        ctrl.apply(SessionEvent::LogOut).unwrap();
        assert_eq!(ctrl.state(), SessionState::Unauthenticated);
        assert!(ctrl.credential().is_none());
        assert_eq!(ctrl.bearer_token(), None);
    }

    #[test]
    fn test_unauthorized_expires_but_keeps_credential() {
        let mut ctrl = SessionController::new();
        ctrl.apply(SessionEvent::LogIn(AccessCredential::with_account(
            "tok", "me@example.com",
        )))
        .unwrap();

        ctrl.apply(SessionEvent::Unauthorized).unwrap();
        assert_eq!(ctrl.state(), SessionState::Expired);
        assert!(!ctrl.is_authorized());
        // Account details remain displayable while expired.
        assert_eq!(
            ctrl.credential().and_then(|c| c.account.clone()).as_deref(),
            Some("me@example.com")
        );
        // But the token is no longer usable.
        assert_eq!(ctrl.bearer_token(), None);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut ctrl = SessionController::new();
        // Cannot refresh without being expired.
        assert!(ctrl
            .apply(SessionEvent::Refreshed(AccessCredential::new("tok")))
            .is_err());
        // Cannot expire without a session.
        assert!(ctrl.apply(SessionEvent::Unauthorized).is_err());
        // Cannot log out without a session.
        assert!(ctrl.apply(SessionEvent::LogOut).is_err());
        assert_eq!(ctrl.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_login_from_expired() {
        let mut ctrl = SessionController::new();
        ctrl.apply(SessionEvent::LogIn(AccessCredential::new("old")))
            .unwrap();
        ctrl.apply(SessionEvent::Unauthorized).unwrap();

        ctrl.apply(SessionEvent::LogIn(AccessCredential::new("new")))
            .unwrap();
        assert_eq!(ctrl.state(), SessionState::Authenticated);
        assert_eq!(ctrl.bearer_token().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_silent_refresh_success() {
        let refresher = Arc::new(StaticRefresher {
            credential: Some(AccessCredential::new("fresh")),
        });
        let session = SessionHandle::new(
            SessionController::new().with_refresher(refresher),
        );
        session.log_in(AccessCredential::new("stale")).unwrap();

        assert!(session.handle_unauthorized().await);
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.bearer_token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_silent_refresh_failure_stays_expired() {
        let refresher = Arc::new(StaticRefresher { credential: None });
        let session = SessionHandle::new(
            SessionController::new().with_refresher(refresher),
        );
        session.log_in(AccessCredential::new("stale")).unwrap();

        assert!(!session.handle_unauthorized().await);
        assert_eq!(session.state(), SessionState::Expired);
    }

    #[tokio::test]
    async fn test_no_refresher_stays_expired() {
        let session = SessionHandle::new(SessionController::new());
        session.log_in(AccessCredential::new("tok")).unwrap();

        assert!(!session.handle_unauthorized().await);
        assert_eq!(session.state(), SessionState::Expired);
    }
}
