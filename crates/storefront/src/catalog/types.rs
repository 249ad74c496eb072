//! Wire types for the remote catalog service.
//!
//! These mirror the service's JSON payloads and are converted into the
//! domain types from `amber_market_core` at the client boundary.

use amber_market_core::{CartLine, CatalogItem, CategoryInfo, ProductId, UserId};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

// =============================================================================
// Products
// =============================================================================

/// Paged product listing (`/products`, `/products/search`, `/products/category/..`).
#[derive(Debug, Deserialize)]
pub(crate) struct ProductList {
    pub products: Vec<CatalogItem>,
}

/// A category entry in either of the shapes the service has used.
///
/// Newer deployments answer `[{"slug", "name", "url"}]`, older ones a bare
/// list of labels.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawCategory {
    Object { slug: String, name: String },
    Label(String),
}

impl From<RawCategory> for CategoryInfo {
    fn from(raw: RawCategory) -> Self {
        match raw {
            RawCategory::Object { slug, name } => Self { slug, name },
            RawCategory::Label(label) => Self::from_label(&label),
        }
    }
}

// =============================================================================
// Carts
// =============================================================================

/// One `(id, quantity)` pair sent to the cart endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemInput {
    pub id: ProductId,
    pub quantity: u32,
}

impl CartItemInput {
    /// Create a new cart item input.
    #[must_use]
    pub const fn new(id: ProductId, quantity: u32) -> Self {
        Self { id, quantity }
    }
}

impl From<&CartLine> for CartItemInput {
    fn from(line: &CartLine) -> Self {
        Self::new(line.id(), line.quantity)
    }
}

/// `GET /carts/user/{id}` response.
#[derive(Debug, Deserialize)]
pub(crate) struct UserCarts {
    #[serde(default)]
    pub carts: Vec<RemoteCart>,
}

/// A cart as the service stores it.
#[derive(Debug, Deserialize)]
pub(crate) struct RemoteCart {
    #[serde(default)]
    pub products: Vec<RemoteCartProduct>,
}

/// A cart entry: the product's summary fields plus its quantity.
#[derive(Debug, Deserialize)]
pub(crate) struct RemoteCartProduct {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub quantity: u32,
}

impl From<RemoteCartProduct> for CartLine {
    fn from(product: RemoteCartProduct) -> Self {
        Self::new(product.item, product.quantity)
    }
}

/// `POST /carts/add` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCartRequest<'a> {
    pub user_id: UserId,
    pub products: &'a [CartItemInput],
}

/// `PUT /carts/{id}` body.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateCartRequest<'a> {
    pub merge: bool,
    pub products: &'a [CartItemInput],
}

// =============================================================================
// Auth
// =============================================================================

/// `POST /auth/login` body.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// `POST /auth/login` response.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub id: UserId,
    pub username: String,
    #[serde(alias = "token")]
    pub access_token: String,
}

/// A successful credential check.
///
/// Implements `Debug` manually to redact the token.
pub struct LoginSession {
    pub user_id: UserId,
    pub username: String,
    /// Session marker returned by the service.
    pub token: SecretString,
}

impl std::fmt::Debug for LoginSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSession")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl From<LoginResponse> for LoginSession {
    fn from(response: LoginResponse) -> Self {
        Self {
            user_id: response.id,
            username: response.username,
            token: SecretString::from(response.access_token),
        }
    }
}

/// Error body the service attaches to failures.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
