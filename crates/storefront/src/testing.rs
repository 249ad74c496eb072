//! In-memory stand-in for the remote catalog service, for unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use amber_market_core::{CartLine, CatalogItem, CategoryInfo, ProductDraft, ProductId, UserId};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Semaphore;

use crate::catalog::{AuthApi, CartApi, CartItemInput, CatalogApi, LoginSession, RemoteError};

pub const VALID_USERNAME: &str = "emilys";
pub const VALID_PASSWORD: &str = "emilyspass";

/// A recorded remote cart call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Fetch,
    Add(Vec<CartItemInput>),
    Update { merge: bool, items: Vec<CartItemInput> },
    Clear,
}

#[derive(Default)]
pub struct FakeRemote {
    cart: Mutex<Vec<CartLine>>,
    products: Mutex<Vec<CatalogItem>>,
    calls: Mutex<Vec<FakeCall>>,
    failing: AtomicBool,
    /// When set, every cart call waits for a permit before answering.
    gate: Option<Semaphore>,
}

impl FakeRemote {
    /// Every call fails with a 503.
    pub fn failing() -> Self {
        let fake = Self::default();
        fake.set_failing(true);
        fake
    }

    /// Cart calls block until [`FakeRemote::release`] hands out permits.
    pub fn held() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn with_products(products: Vec<CatalogItem>) -> Self {
        let fake = Self::default();
        *fake.products.lock().unwrap() = products;
        fake
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_cart(&self, lines: Vec<CartLine>) {
        *self.cart.lock().unwrap() = lines;
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), RemoteError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Api {
                status: 503,
                message: Some("Service Unavailable".to_string()),
            });
        }
        Ok(())
    }

    async fn enter(&self, call: FakeCall) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(call);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.check()
    }

    fn product(&self, id: ProductId) -> Result<CatalogItem, RemoteError> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("Product with id '{id}' not found")))
    }
}

fn apply_draft(item: &mut CatalogItem, draft: &ProductDraft) {
    if let Some(title) = &draft.title {
        item.title.clone_from(title);
    }
    if let Some(description) = &draft.description {
        item.description.clone_from(description);
    }
    if let Some(category) = &draft.category {
        item.category.clone_from(category);
    }
    if let Some(price) = draft.price {
        item.price = price;
    }
    if let Some(stock) = draft.stock {
        item.stock = stock;
    }
    if draft.brand.is_some() {
        item.brand.clone_from(&draft.brand);
    }
    if let Some(images) = &draft.images {
        item.images.clone_from(images);
    }
}

#[async_trait]
impl CartApi for FakeRemote {
    async fn fetch_cart(&self, _user: UserId) -> Result<Vec<CartLine>, RemoteError> {
        self.enter(FakeCall::Fetch).await?;
        Ok(self.cart.lock().unwrap().clone())
    }

    async fn add_items(&self, _user: UserId, items: &[CartItemInput]) -> Result<(), RemoteError> {
        self.enter(FakeCall::Add(items.to_vec())).await
    }

    async fn update_items(
        &self,
        _user: UserId,
        merge: bool,
        items: &[CartItemInput],
    ) -> Result<(), RemoteError> {
        self.enter(FakeCall::Update {
            merge,
            items: items.to_vec(),
        })
        .await?;
        let mut cart = self.cart.lock().unwrap();
        if !merge {
            cart.retain(|line| items.iter().any(|i| i.id == line.id()));
        }
        for input in items {
            if let Some(line) = cart.iter_mut().find(|l| l.id() == input.id) {
                line.quantity = input.quantity;
            }
        }
        Ok(())
    }

    async fn clear_cart(&self, _user: UserId) -> Result<(), RemoteError> {
        self.enter(FakeCall::Clear).await?;
        self.cart.lock().unwrap().clear();
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for FakeRemote {
    async fn list_products(&self) -> Result<Vec<CatalogItem>, RemoteError> {
        self.check()?;
        Ok(self.products.lock().unwrap().clone())
    }

    async fn get_product(&self, id: ProductId) -> Result<CatalogItem, RemoteError> {
        self.check()?;
        self.product(id)
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<CatalogItem, RemoteError> {
        self.check()?;
        let products = self.products.lock().unwrap();
        let next = products.iter().map(|p| p.id.as_i32()).max().unwrap_or(0) + 1;
        let mut item = CatalogItem::new(ProductId::new(next), "", rust_decimal::Decimal::ZERO);
        apply_draft(&mut item, draft);
        // Like the real service, the new record is echoed but not stored
        Ok(item)
    }

    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<CatalogItem, RemoteError> {
        self.check()?;
        let mut item = self.product(id)?;
        apply_draft(&mut item, draft);
        Ok(item)
    }

    async fn delete_product(&self, id: ProductId) -> Result<CatalogItem, RemoteError> {
        self.check()?;
        self.product(id)
    }

    async fn search_products(&self, query: &str) -> Result<Vec<CatalogItem>, RemoteError> {
        self.check()?;
        let query = query.to_lowercase();
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryInfo>, RemoteError> {
        self.check()?;
        let mut categories: Vec<CategoryInfo> = Vec::new();
        for product in self.products.lock().unwrap().iter() {
            let info = CategoryInfo::from_label(&product.category);
            if !categories.contains(&info) {
                categories.push(info);
            }
        }
        Ok(categories)
    }

    async fn list_by_category(&self, slug: &str) -> Result<Vec<CatalogItem>, RemoteError> {
        self.check()?;
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.category == slug)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuthApi for FakeRemote {
    async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginSession, RemoteError> {
        self.check()?;
        if username == VALID_USERNAME && password.expose_secret() == VALID_PASSWORD {
            Ok(LoginSession {
                user_id: UserId::new(1),
                username: username.to_string(),
                token: SecretString::from("fake-token"),
            })
        } else {
            Err(RemoteError::Api {
                status: 400,
                message: Some("Username and password do not match".to_string()),
            })
        }
    }
}
