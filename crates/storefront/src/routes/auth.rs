//! Authentication route handlers.
//!
//! Handles login and logout against the catalog service's auth endpoint.

use axum::{Json, extract::State};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::services::AuthStatus;
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login state as shown to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<AuthStatus> for SessionView {
    fn from(status: AuthStatus) -> Self {
        match status {
            AuthStatus::LoggedOut => Self {
                logged_in: false,
                username: None,
            },
            AuthStatus::LoggedIn { username, .. } => Self {
                logged_in: true,
                username: Some(username),
            },
        }
    }
}

/// Current login state (the login view).
pub async fn login_page(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.auth().status().into())
}

/// Handle login.
#[instrument(skip(state))]
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<Json<SessionView>> {
    let password = SecretString::from(form.password);
    state.auth().login(&form.username, &password).await?;

    let status = state.auth().status();
    if let AuthStatus::LoggedIn { username, user_id } = &status {
        set_sentry_user(user_id, username);
    }
    Ok(Json(status.into()))
}

/// Handle logout.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Json<SessionView> {
    state.auth().logout();
    clear_sentry_user();
    Json(state.auth().status().into())
}
