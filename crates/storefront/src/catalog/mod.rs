//! Remote catalog, cart and auth clients.
//!
//! # Architecture
//!
//! - The remote service is the source of truth for products; carts are only
//!   mirrored there on a best-effort basis (see `services::cart`)
//! - Plain JSON over `reqwest`, no retries and no response caching
//! - Every call fails with [`RemoteError`] when the service is unreachable or
//!   answers with a non-success status
//!
//! # APIs
//!
//! ## Catalog
//! - List, fetch, create, update, delete and search products
//! - Categories, normalized to [`CategoryInfo`] whatever shape the service uses
//!
//! ## Carts
//! - One remote cart per user identity
//! - Remove is a read-modify-write (fetch, filter, replace), not an atomic delete
//!
//! ## Auth
//! - Username/password check returning a session token
//!
//! # Example
//!
//! ```rust,ignore
//! use amber_market_storefront::catalog::{CartApi, DummyJsonClient};
//!
//! let client = DummyJsonClient::new(&config.catalog)?;
//!
//! // Search the catalog
//! let phones = client.search_products("phone").await?;
//!
//! // Put the first hit in the demo user's cart
//! client.add_items(UserId::new(1), &[CartItemInput::new(phones[0].id, 1)]).await?;
//! ```

mod client;
pub mod types;

pub use client::DummyJsonClient;
pub use types::{CartItemInput, LoginSession};

use amber_market_core::{CartLine, CatalogItem, CategoryInfo, ProductDraft, ProductId, UserId};
use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur when talking to the remote catalog service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed (connection refused, timeout, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("API error: {status} - {}", .message.as_deref().unwrap_or("(no message)"))]
    Api {
        status: u16,
        /// Human-readable message from the response body, if it carried one.
        message: Option<String>,
    },

    /// Requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl RemoteError {
    /// The human-readable message the service attached to its error, if any.
    #[must_use]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.as_deref().filter(|m| !m.trim().is_empty()),
            Self::NotFound(message) => Some(message.as_str()),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }
}

/// Product catalog operations.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// List products (first page, sized by configuration).
    async fn list_products(&self) -> Result<Vec<CatalogItem>, RemoteError>;

    /// Fetch one product; [`RemoteError::NotFound`] if the id is unknown.
    async fn get_product(&self, id: ProductId) -> Result<CatalogItem, RemoteError>;

    /// Create a product and return the record the service assigned.
    async fn create_product(&self, draft: &ProductDraft) -> Result<CatalogItem, RemoteError>;

    /// Update the fields present in `draft`, returning the merged record.
    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<CatalogItem, RemoteError>;

    /// Delete a product, returning the deleted record.
    async fn delete_product(&self, id: ProductId) -> Result<CatalogItem, RemoteError>;

    /// Full-text search.
    async fn search_products(&self, query: &str) -> Result<Vec<CatalogItem>, RemoteError>;

    /// All categories, normalized.
    async fn list_categories(&self) -> Result<Vec<CategoryInfo>, RemoteError>;

    /// Products in one category.
    async fn list_by_category(&self, slug: &str) -> Result<Vec<CatalogItem>, RemoteError>;
}

/// Remote cart operations, scoped by user identity.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Current remote cart lines; empty if the user has no cart yet.
    async fn fetch_cart(&self, user: UserId) -> Result<Vec<CartLine>, RemoteError>;

    /// Add items with quantities.
    async fn add_items(&self, user: UserId, items: &[CartItemInput]) -> Result<(), RemoteError>;

    /// Replace the cart's items; with `merge` the given pairs are upserted
    /// into the existing lines instead.
    async fn update_items(
        &self,
        user: UserId,
        merge: bool,
        items: &[CartItemInput],
    ) -> Result<(), RemoteError>;

    /// Delete the whole cart resource.
    async fn clear_cart(&self, user: UserId) -> Result<(), RemoteError>;

    /// Remove one item: fetch the current cart, drop `id`, replace the rest.
    ///
    /// Not atomic; an addition made by another session between the fetch
    /// and the replace is lost.
    async fn remove_item(&self, user: UserId, id: ProductId) -> Result<(), RemoteError> {
        let remaining: Vec<CartItemInput> = self
            .fetch_cart(user)
            .await?
            .iter()
            .filter(|line| line.id() != id)
            .map(CartItemInput::from)
            .collect();
        self.update_items(user, false, &remaining).await
    }
}

/// Remote credential check.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Check `username`/`password`; rejected credentials come back as
    /// [`RemoteError::Api`] carrying the service's message.
    async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginSession, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::NotFound("Product with id '999' not found".to_string());
        assert_eq!(err.to_string(), "Not found: Product with id '999' not found");

        let err = RemoteError::Api {
            status: 503,
            message: None,
        };
        assert_eq!(err.to_string(), "API error: 503 - (no message)");
    }

    #[test]
    fn test_remote_message_ignores_blank() {
        let err = RemoteError::Api {
            status: 400,
            message: Some("  ".to_string()),
        };
        assert_eq!(err.remote_message(), None);

        let err = RemoteError::Api {
            status: 400,
            message: Some("Invalid credentials".to_string()),
        };
        assert_eq!(err.remote_message(), Some("Invalid credentials"));

        assert_eq!(RemoteError::Parse("bad".to_string()).remote_message(), None);
    }
}
