//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Login guard (on the guarded routes only)

pub mod auth;
pub mod request_id;

pub use auth::{LOGIN_PATH, RequireLogin, require_login};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
