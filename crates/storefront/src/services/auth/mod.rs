//! Login gate.
//!
//! Tracks whether the session is logged in. The session token returned by
//! the service is kept as a [`SecretString`] and never logged; nothing else
//! about the session (expiry, refresh) is managed.

mod error;

pub use error::{AuthError, GENERIC_LOGIN_FAILURE};

use std::sync::{Arc, PoisonError, RwLock};

use amber_market_core::{UserId, ValidationErrors};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use crate::catalog::{AuthApi, LoginSession};

/// Login state of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    LoggedOut,
    LoggedIn { username: String, user_id: UserId },
}

struct Session {
    username: String,
    user_id: UserId,
    token: SecretString,
}

/// Login gate shared by the route guard and the login views.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct AuthGate {
    inner: Arc<AuthGateInner>,
}

struct AuthGateInner {
    remote: Arc<dyn AuthApi>,
    session: RwLock<Option<Session>>,
}

impl AuthGate {
    /// Create a gate in the logged-out state.
    #[must_use]
    pub fn new(remote: Arc<dyn AuthApi>) -> Self {
        Self {
            inner: Arc::new(AuthGateInner {
                remote,
                session: RwLock::new(None),
            }),
        }
    }

    /// Check the credentials with the service and log in on success.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if either field is blank (no network
    /// call is made), or [`AuthError::InvalidCredentials`] carrying the
    /// service's message, or a generic one, if the check fails. The gate stays
    /// logged out on error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), AuthError> {
        let username = username.trim();
        let mut errors = ValidationErrors::default();
        if username.is_empty() {
            errors.push("username", "Username is required");
        }
        if password.expose_secret().is_empty() {
            errors.push("password", "Password is required");
        }
        errors.into_result()?;

        let session = self
            .inner
            .remote
            .login(username, password)
            .await
            .map_err(|e| {
                warn!(error = %e, "Login failed");
                AuthError::InvalidCredentials(
                    e.remote_message().unwrap_or(GENERIC_LOGIN_FAILURE).to_string(),
                )
            })?;

        info!(user_id = %session.user_id, "Logged in");
        self.set_session(Some(session.into()));
        Ok(())
    }

    /// Return to the logged-out state.
    pub fn logout(&self) {
        if self.is_logged_in() {
            info!("Logged out");
        }
        self.set_session(None);
    }

    /// Whether a login succeeded and no logout followed.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The current login state.
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(AuthStatus::LoggedOut, |s| AuthStatus::LoggedIn {
                username: s.username.clone(),
                user_id: s.user_id,
            })
    }

    /// The session token of the current login, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.token.clone())
    }

    fn set_session(&self, session: Option<Session>) {
        *self
            .inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }
}

impl From<LoginSession> for Session {
    fn from(session: LoginSession) -> Self {
        Self {
            username: session.username,
            user_id: session.user_id,
            token: session.token,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeRemote, VALID_PASSWORD, VALID_USERNAME};

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test]
    async fn test_starts_logged_out() {
        let gate = AuthGate::new(Arc::new(FakeRemote::default()));
        assert!(!gate.is_logged_in());
        assert_eq!(gate.status(), AuthStatus::LoggedOut);
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let gate = AuthGate::new(Arc::new(FakeRemote::default()));

        gate.login(&format!("  {VALID_USERNAME} "), &secret(VALID_PASSWORD))
            .await
            .unwrap();

        assert!(gate.is_logged_in());
        assert_eq!(
            gate.status(),
            AuthStatus::LoggedIn {
                username: VALID_USERNAME.to_string(),
                user_id: UserId::new(1),
            }
        );

        assert_eq!(gate.token().unwrap().expose_secret(), "fake-token");

        gate.logout();
        assert!(!gate.is_logged_in());
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected_locally() {
        let remote = Arc::new(FakeRemote::failing());
        let gate = AuthGate::new(remote);

        let err = gate.login("   ", &secret("")).await.unwrap_err();

        let AuthError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.message_for("username"), Some("Username is required"));
        assert_eq!(errors.message_for("password"), Some("Password is required"));
        assert!(!gate.is_logged_in());
    }

    #[tokio::test]
    async fn test_rejected_login_surfaces_service_message() {
        let gate = AuthGate::new(Arc::new(FakeRemote::default()));

        let err = gate.login(VALID_USERNAME, &secret("wrong")).await.unwrap_err();

        assert_eq!(err.to_string(), "Username and password do not match");
        assert!(!gate.is_logged_in());
    }

    #[tokio::test]
    async fn test_failed_service_keeps_logged_out() {
        let gate = AuthGate::new(Arc::new(FakeRemote::failing()));

        let err = gate
            .login(VALID_USERNAME, &secret(VALID_PASSWORD))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials(_)));
        assert!(!gate.is_logged_in());
        assert!(gate.token().is_none());
    }
}
