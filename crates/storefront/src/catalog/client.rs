//! `reqwest` implementation of the catalog, cart and auth APIs.

use std::sync::Arc;

use amber_market_core::{CartLine, CatalogItem, CategoryInfo, ProductDraft, ProductId, UserId};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::types::{
    AddCartRequest, CartItemInput, ErrorBody, LoginRequest, LoginResponse, LoginSession,
    ProductList, RawCategory, UpdateCartRequest, UserCarts,
};
use super::{AuthApi, CartApi, CatalogApi, RemoteError};
use crate::config::CatalogConfig;

/// Maximum number of body characters kept in logs and error messages.
const BODY_PREVIEW_CHARS: usize = 200;

// =============================================================================
// DummyJsonClient
// =============================================================================

/// Client for the dummyjson-style catalog service.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct DummyJsonClient {
    inner: Arc<DummyJsonClientInner>,
}

struct DummyJsonClientInner {
    client: reqwest::Client,
    base_url: String,
    page_limit: Option<u32>,
}

impl DummyJsonClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(DummyJsonClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                page_limit: config.page_limit,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and decode a JSON response.
    async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut builder = self.inner.client.request(method.clone(), &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let text = response.text().await?;

        if !status.is_success() {
            return Err(error_from_response(status, &text, path));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                %method,
                path,
                body = %preview(&text),
                "Failed to parse catalog response"
            );
            RemoteError::Parse(e.to_string())
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        self.request::<(), T>(Method::GET, path, None).await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.request(method, path, Some(body)).await
    }
}

/// Map a non-success response to a [`RemoteError`].
fn error_from_response(status: StatusCode, body: &str, path: &str) -> RemoteError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .unwrap_or_default()
        .message;

    if status == StatusCode::NOT_FOUND {
        return RemoteError::NotFound(message.unwrap_or_else(|| path.to_string()));
    }

    tracing::warn!(
        status = %status,
        path,
        body = %preview(body),
        "Catalog service returned non-success status"
    );
    RemoteError::Api {
        status: status.as_u16(),
        message,
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
impl CatalogApi for DummyJsonClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<CatalogItem>, RemoteError> {
        let path = self
            .inner
            .page_limit
            .map_or_else(|| "products".to_string(), |limit| format!("products?limit={limit}"));
        let list: ProductList = self.get(&path).await?;
        debug!(count = list.products.len(), "Fetched products");
        Ok(list.products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<CatalogItem, RemoteError> {
        self.get(&format!("products/{id}")).await
    }

    #[instrument(skip(self, draft))]
    async fn create_product(&self, draft: &ProductDraft) -> Result<CatalogItem, RemoteError> {
        self.send(Method::POST, "products/add", draft).await
    }

    #[instrument(skip(self, draft), fields(product_id = %id))]
    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<CatalogItem, RemoteError> {
        self.send(Method::PUT, &format!("products/{id}"), draft)
            .await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: ProductId) -> Result<CatalogItem, RemoteError> {
        self.request::<(), _>(Method::DELETE, &format!("products/{id}"), None)
            .await
    }

    #[instrument(skip(self))]
    async fn search_products(&self, query: &str) -> Result<Vec<CatalogItem>, RemoteError> {
        let path = format!("products/search?q={}", urlencoding::encode(query));
        let list: ProductList = self.get(&path).await?;
        Ok(list.products)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<CategoryInfo>, RemoteError> {
        let raw: Vec<RawCategory> = self.get("products/categories").await?;
        Ok(raw.into_iter().map(CategoryInfo::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_by_category(&self, slug: &str) -> Result<Vec<CatalogItem>, RemoteError> {
        let path = format!("products/category/{}", urlencoding::encode(slug));
        let list: ProductList = self.get(&path).await?;
        Ok(list.products)
    }
}

// =============================================================================
// Carts
// =============================================================================

// The cart resource is addressed by the user identity for updates and
// deletes, matching how the demo identity owns exactly one cart.

#[async_trait]
impl CartApi for DummyJsonClient {
    #[instrument(skip(self), fields(user_id = %user))]
    async fn fetch_cart(&self, user: UserId) -> Result<Vec<CartLine>, RemoteError> {
        let carts: UserCarts = self.get(&format!("carts/user/{user}")).await?;
        let lines: Vec<CartLine> = carts
            .carts
            .into_iter()
            .next()
            .map(|cart| cart.products.into_iter().map(CartLine::from).collect())
            .unwrap_or_default();
        debug!(lines = lines.len(), "Fetched remote cart");
        Ok(lines)
    }

    #[instrument(skip(self, items), fields(user_id = %user, items = items.len()))]
    async fn add_items(&self, user: UserId, items: &[CartItemInput]) -> Result<(), RemoteError> {
        let body = AddCartRequest {
            user_id: user,
            products: items,
        };
        self.send::<_, serde_json::Value>(Method::POST, "carts/add", &body)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, items), fields(user_id = %user, items = items.len()))]
    async fn update_items(
        &self,
        user: UserId,
        merge: bool,
        items: &[CartItemInput],
    ) -> Result<(), RemoteError> {
        let body = UpdateCartRequest {
            merge,
            products: items,
        };
        self.send::<_, serde_json::Value>(Method::PUT, &format!("carts/{user}"), &body)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user))]
    async fn clear_cart(&self, user: UserId) -> Result<(), RemoteError> {
        self.request::<(), serde_json::Value>(Method::DELETE, &format!("carts/{user}"), None)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Auth
// =============================================================================

#[async_trait]
impl AuthApi for DummyJsonClient {
    #[instrument(skip(self, password))]
    async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginSession, RemoteError> {
        let body = LoginRequest {
            username,
            password: password.expose_secret(),
        };
        let response: LoginResponse = self.send(Method::POST, "auth/login", &body).await?;
        Ok(response.into())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client(base_url: &str) -> DummyJsonClient {
        DummyJsonClient::new(&CatalogConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
            page_limit: None,
        })
        .expect("client builds")
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = client("https://dummyjson.com/");
        assert_eq!(client.url("/products/1"), "https://dummyjson.com/products/1");
        assert_eq!(client.url("carts/add"), "https://dummyjson.com/carts/add");
    }

    #[test]
    fn test_not_found_uses_service_message() {
        let err = error_from_response(
            StatusCode::NOT_FOUND,
            r#"{"message": "Product with id '999' not found"}"#,
            "products/999",
        );
        assert!(matches!(err, RemoteError::NotFound(ref m) if m == "Product with id '999' not found"));
    }

    #[test]
    fn test_not_found_without_body_falls_back_to_path() {
        let err = error_from_response(StatusCode::NOT_FOUND, "", "products/999");
        assert!(matches!(err, RemoteError::NotFound(ref m) if m == "products/999"));
    }

    #[test]
    fn test_api_error_keeps_message() {
        let err = error_from_response(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Invalid credentials"}"#,
            "auth/login",
        );
        assert_eq!(err.remote_message(), Some("Invalid credentials"));

        let err = error_from_response(StatusCode::BAD_GATEWAY, "<html>oops</html>", "carts/1");
        assert!(matches!(err, RemoteError::Api { status: 502, message: None }));
    }
}
