//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::{AuthApi, CartApi, CatalogApi, DummyJsonClient, RemoteError};
use crate::config::StorefrontConfig;
use crate::services::{AuthGate, CartManager, ProductStore};
use crate::storage::LocalCartStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and owns the state managers
/// every view works through.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cart: CartManager,
    products: ProductStore,
    auth: AuthGate,
}

impl AppState {
    /// Create the application state backed by the configured catalog service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, RemoteError> {
        let client = Arc::new(DummyJsonClient::new(&config.catalog)?);
        Ok(Self::with_clients(
            config,
            client.clone(),
            client.clone(),
            client,
        ))
    }

    /// Create the application state over arbitrary service clients.
    #[must_use]
    pub fn with_clients(
        config: StorefrontConfig,
        catalog: Arc<dyn CatalogApi>,
        carts: Arc<dyn CartApi>,
        auth: Arc<dyn AuthApi>,
    ) -> Self {
        let store = config
            .cart
            .store_path
            .clone()
            .map_or_else(LocalCartStore::disabled, LocalCartStore::new);
        let cart = CartManager::new(carts, store, config.cart.user_id);

        Self {
            inner: Arc::new(AppStateInner {
                cart,
                products: ProductStore::new(catalog),
                auth: AuthGate::new(auth),
                config,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The cart state manager.
    #[must_use]
    pub fn cart(&self) -> &CartManager {
        &self.inner.cart
    }

    /// The product list manager.
    #[must_use]
    pub fn products(&self) -> &ProductStore {
        &self.inner.products
    }

    /// The login gate.
    #[must_use]
    pub fn auth(&self) -> &AuthGate {
        &self.inner.auth
    }
}
