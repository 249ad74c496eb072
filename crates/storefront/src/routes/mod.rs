//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                - Health check
//!
//! # Auth
//! GET    /login                 - Current login state
//! POST   /login                 - Login action
//! POST   /logout                - Logout action
//!
//! # Products (requires login)
//! GET    /products              - Listing (?q= search, ?category= filter)
//! POST   /products              - Create product
//! GET    /products/categories   - Category list
//! GET    /products/{id}         - Product detail
//! PUT    /products/{id}         - Edit product
//! DELETE /products/{id}         - Delete product
//!
//! # Cart (requires login)
//! GET    /cart                  - Cart with totals
//! DELETE /cart                  - Clear cart
//! POST   /cart/items            - Add one unit ({id})
//! PUT    /cart/items/{id}       - Set quantity ({quantity}, <= 0 removes)
//! DELETE /cart/items/{id}       - Remove line
//! POST   /cart/checkout         - Checkout (stub: returns totals, clears cart)
//! GET    /cart/reconcile        - Diff local cart against the remote cart
//!
//! Anything else redirects to /login.
//! ```

pub mod auth;
pub mod cart;
pub mod products;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::middleware::{LOGIN_PATH, require_login};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/categories", get(products::categories))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", axum::routing::put(cart::update).delete(cart::remove))
        .route("/checkout", post(cart::checkout))
        .route("/reconcile", get(cart::reconcile))
}

/// Create all routes for the storefront.
///
/// Product and cart views sit behind the login guard; unknown paths redirect
/// to the login view.
pub fn routes(state: &AppState) -> Router<AppState> {
    let guarded = Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_login,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(guarded)
        .fallback(|| async { Redirect::to(LOGIN_PATH) })
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
