//! Login guard.
//!
//! Views behind the guard are only reachable once the [`AuthGate`] reports a
//! login; otherwise the client is redirected to the login view.
//!
//! [`AuthGate`]: crate::services::AuthGate

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::services::AuthStatus;
use crate::state::AppState;

/// Path of the login view.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires a login.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireLogin(username): RequireLogin) -> String {
///     format!("Hello, {username}!")
/// }
/// ```
pub struct RequireLogin(pub String);

/// Rejection sent when the gate is logged out.
pub struct RedirectToLogin;

impl IntoResponse for RedirectToLogin {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

impl FromRequestParts<AppState> for RequireLogin {
    type Rejection = RedirectToLogin;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.auth().status() {
            AuthStatus::LoggedIn { username, .. } => Ok(Self(username)),
            AuthStatus::LoggedOut => {
                tracing::debug!(path = %parts.uri.path(), "Redirecting to login");
                Err(RedirectToLogin)
            }
        }
    }
}

/// Middleware form of [`RequireLogin`], for guarding a whole router.
///
/// Install with `axum::middleware::from_fn_with_state`.
pub async fn require_login(
    _login: RequireLogin,
    request: Request,
    next: Next,
) -> Response {
    next.run(request).await
}
