//! Product list manager.
//!
//! Holds the product list the views render. Mutations go to the remote
//! catalog first and then splice the single affected entry by id; search and
//! category filtering replace the whole list.

use std::sync::Arc;

use amber_market_core::{CatalogItem, CategoryInfo, ProductDraft, ProductId, ValidationErrors};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{instrument, warn};

use crate::catalog::{CatalogApi, RemoteError};

/// Errors from product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    /// The draft was rejected before any network call.
    #[error("invalid product: {0}")]
    Validation(#[from] ValidationErrors),

    /// No product with this id, locally or remotely.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// The catalog service failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl ProductError {
    fn from_remote(id: ProductId, error: RemoteError) -> Self {
        match error {
            RemoteError::NotFound(_) => Self::NotFound(id),
            other => Self::Remote(other),
        }
    }
}

/// Observable product list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductsState {
    pub products: Vec<CatalogItem>,
    pub loading: bool,
    /// Message of the last failed load, cleared by the next success.
    pub error: Option<String>,
}

/// Product list manager.
///
/// Cheap to clone; clones share the same list.
#[derive(Clone)]
pub struct ProductStore {
    inner: Arc<ProductStoreInner>,
}

struct ProductStoreInner {
    remote: Arc<dyn CatalogApi>,
    state: watch::Sender<ProductsState>,
}

impl ProductStore {
    #[must_use]
    pub fn new(remote: Arc<dyn CatalogApi>) -> Self {
        let (state, _) = watch::channel(ProductsState::default());
        Self {
            inner: Arc::new(ProductStoreInner { remote, state }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ProductsState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProductsState> {
        self.inner.state.subscribe()
    }

    /// The current product list.
    #[must_use]
    pub fn products(&self) -> Vec<CatalogItem> {
        self.inner.state.borrow().products.clone()
    }

    // =========================================================================
    // Whole-list loads
    // =========================================================================

    /// Replace the list with the catalog's default listing.
    ///
    /// # Errors
    ///
    /// Returns the remote error; the previous list is kept.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<CatalogItem>, ProductError> {
        let remote = self.inner.remote.clone();
        self.load(|| async move { remote.list_products().await })
            .await
    }

    /// Replace the list with search results. A blank query reloads the full
    /// listing.
    ///
    /// # Errors
    ///
    /// Returns the remote error; the previous list is kept.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<CatalogItem>, ProductError> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return self.fetch_all().await;
        }
        let remote = self.inner.remote.clone();
        self.load(|| async move { remote.search_products(&query).await })
            .await
    }

    /// Replace the list with one category's products. A blank slug reloads
    /// the full listing.
    ///
    /// # Errors
    ///
    /// Returns the remote error; the previous list is kept.
    #[instrument(skip(self))]
    pub async fn filter_by_category(&self, slug: &str) -> Result<Vec<CatalogItem>, ProductError> {
        let slug = slug.trim().to_string();
        if slug.is_empty() {
            return self.fetch_all().await;
        }
        let remote = self.inner.remote.clone();
        self.load(|| async move { remote.list_by_category(&slug).await })
            .await
    }

    async fn load<F, Fut>(&self, fetch: F) -> Result<Vec<CatalogItem>, ProductError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<CatalogItem>, RemoteError>>,
    {
        self.inner.state.send_modify(|s| s.loading = true);

        match fetch().await {
            Ok(products) => {
                self.inner.state.send_modify(|s| {
                    s.products.clone_from(&products);
                    s.loading = false;
                    s.error = None;
                });
                Ok(products)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load products");
                self.inner.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(e.to_string());
                });
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Single-entry mutations
    // =========================================================================

    /// Create a product and append it to the list. A draft without images
    /// gets the placeholder image.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any network call, or the remote
    /// error.
    #[instrument(skip(self, draft))]
    pub async fn add(&self, draft: ProductDraft) -> Result<CatalogItem, ProductError> {
        draft.validate()?;
        let draft = draft.with_default_image();

        let created = self.inner.remote.create_product(&draft).await?;
        let entry = created.clone();
        self.inner.state.send_modify(|s| s.products.push(entry));
        Ok(created)
    }

    /// Update the fields present in `draft` and replace the entry in place.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any network call,
    /// [`ProductError::NotFound`], or the remote error.
    #[instrument(skip(self, draft), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<CatalogItem, ProductError> {
        draft.validate_update()?;

        let updated = self
            .inner
            .remote
            .update_product(id, &draft)
            .await
            .map_err(|e| ProductError::from_remote(id, e))?;

        let entry = updated.clone();
        self.inner.state.send_if_modified(|s| {
            let Some(slot) = s.products.iter_mut().find(|p| p.id == id) else {
                return false;
            };
            *slot = entry;
            true
        });
        Ok(updated)
    }

    /// Delete a product and drop it from the list.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::NotFound`] or the remote error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<CatalogItem, ProductError> {
        let deleted = self
            .inner
            .remote
            .delete_product(id)
            .await
            .map_err(|e| ProductError::from_remote(id, e))?;

        self.inner.state.send_if_modified(|s| {
            let before = s.products.len();
            s.products.retain(|p| p.id != id);
            s.products.len() != before
        });
        Ok(deleted)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Look up a product in the list, then in the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::NotFound`] if neither has it.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: ProductId) -> Result<CatalogItem, ProductError> {
        let local = self
            .inner
            .state
            .borrow()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned();
        if let Some(item) = local {
            return Ok(item);
        }

        self.inner
            .remote
            .get_product(id)
            .await
            .map_err(|e| ProductError::from_remote(id, e))
    }

    /// The catalog's categories, normalized.
    ///
    /// # Errors
    ///
    /// Returns the remote error.
    pub async fn categories(&self) -> Result<Vec<CategoryInfo>, ProductError> {
        Ok(self.inner.remote.list_categories().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use amber_market_core::PLACEHOLDER_IMAGE;
    use rust_decimal::Decimal;

    use super::*;
    use crate::testing::FakeRemote;

    fn product(id: i32, title: &str, category: &str) -> CatalogItem {
        let mut item = CatalogItem::new(ProductId::new(id), title, Decimal::new(10, 0));
        item.category = category.to_string();
        item
    }

    fn store() -> (Arc<FakeRemote>, ProductStore) {
        let remote = Arc::new(FakeRemote::with_products(vec![
            product(1, "iPhone 9", "smartphones"),
            product(2, "Essence Mascara", "beauty"),
            product(3, "Samsung Phone", "smartphones"),
        ]));
        let store = ProductStore::new(remote.clone());
        (remote, store)
    }

    fn draft() -> ProductDraft {
        ProductDraft {
            title: Some("Desk Lamp".to_string()),
            description: Some("Warm light".to_string()),
            category: Some("home-decoration".to_string()),
            price: Some(Decimal::new(2499, 2)),
            ..ProductDraft::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_all() {
        let (_, store) = store();

        let products = store.fetch_all().await.unwrap();

        assert_eq!(products.len(), 3);
        let state = store.snapshot();
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_list_and_records_error() {
        let (remote, store) = store();
        store.fetch_all().await.unwrap();

        remote.set_failing(true);
        assert!(store.fetch_all().await.is_err());

        let state = store.snapshot();
        assert_eq!(state.products.len(), 3);
        assert!(state.error.is_some());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_search_replaces_list() {
        let (_, store) = store();
        store.fetch_all().await.unwrap();

        store.search("phone").await.unwrap();
        let titles: Vec<_> = store.products().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["iPhone 9", "Samsung Phone"]);

        // Blank query restores the full listing
        store.search("  ").await.unwrap();
        assert_eq!(store.products().len(), 3);
    }

    #[tokio::test]
    async fn test_filter_by_category() {
        let (_, store) = store();

        store.filter_by_category("beauty").await.unwrap();

        let products = store.products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, ProductId::new(2));
    }

    #[tokio::test]
    async fn test_add_validates_before_network() {
        let (remote, store) = store();
        remote.set_failing(true);

        let err = store.add(ProductDraft::default()).await.unwrap_err();

        let ProductError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.errors().len(), 4);
    }

    #[tokio::test]
    async fn test_add_appends_with_placeholder_image() {
        let (_, store) = store();
        store.fetch_all().await.unwrap();

        let created = store.add(draft()).await.unwrap();

        assert_eq!(created.images, vec![PLACEHOLDER_IMAGE.to_string()]);
        let products = store.products();
        assert_eq!(products.len(), 4);
        assert_eq!(products[3].title, "Desk Lamp");
    }

    #[tokio::test]
    async fn test_update_splices_single_entry() {
        let (_, store) = store();
        store.fetch_all().await.unwrap();

        let patch = ProductDraft {
            price: Some(Decimal::new(5, 0)),
            ..ProductDraft::default()
        };
        store.update(ProductId::new(2), patch).await.unwrap();

        let products = store.products();
        assert_eq!(products[1].price, Decimal::new(5, 0));
        assert_eq!(products[1].title, "Essence Mascara");
        assert_eq!(products[0].price, Decimal::new(10, 0));
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let (_, store) = store();
        store.fetch_all().await.unwrap();

        store.delete(ProductId::new(1)).await.unwrap();

        assert!(store.products().iter().all(|p| p.id != ProductId::new(1)));
        assert_eq!(store.products().len(), 2);
    }

    #[tokio::test]
    async fn test_get_falls_back_to_remote_then_not_found() {
        let (_, store) = store();

        // List is empty, so this comes from the catalog
        let item = store.get(ProductId::new(3)).await.unwrap();
        assert_eq!(item.title, "Samsung Phone");

        let err = store.get(ProductId::new(99)).await.unwrap_err();
        assert!(matches!(err, ProductError::NotFound(id) if id == ProductId::new(99)));
    }

    #[tokio::test]
    async fn test_categories() {
        let (_, store) = store();

        let categories = store.categories().await.unwrap();

        let slugs: Vec<_> = categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["smartphones", "beauty"]);
    }
}
