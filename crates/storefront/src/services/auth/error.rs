//! Authentication error types.

use amber_market_core::ValidationErrors;
use thiserror::Error;

/// Message shown when the service rejects a login without saying why.
pub const GENERIC_LOGIN_FAILURE: &str = "Invalid credentials";

/// Errors that can occur during login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password missing; nothing was sent to the service.
    #[error("invalid login form: {0}")]
    Validation(#[from] ValidationErrors),

    /// The service refused the credentials (or could not be reached).
    #[error("{0}")]
    InvalidCredentials(String),
}
