//! Cart state manager.
//!
//! Holds the authoritative cart view for the session and keeps it loosely in
//! step with the remote cart and the local cart store.
//!
//! # Consistency Model
//!
//! Every mutating operation does three things, in order:
//!
//! 1. Applies its transition to the in-memory state immediately and publishes
//!    it to every subscriber (before the operation's first await point)
//! 2. Sends the matching remote call
//! 3. On success, overwrites the local cart store with the post-transition
//!    line list; on failure, logs and keeps the local state (no rollback)
//!
//! The local view is authoritative; the remote cart is reconciled eventually
//! by later mutations. Remote calls are not serialized, so two rapid
//! mutations may reach the remote service built from different snapshots and
//! leave it undercounting until the next mutation. [`CartManager::reconcile`]
//! reports such drift without fixing it.

mod state;

pub use state::{CartAction, CartState, CartSummary, CartSummaryView, TAX_RATE};

use std::sync::Arc;

use amber_market_core::{CartLine, CatalogItem, ProductId, UserId, ValidationErrors};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::catalog::{CartApi, CartItemInput, RemoteError};
use crate::storage::LocalCartStore;

/// Cart state manager.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct CartManager {
    inner: Arc<CartManagerInner>,
}

struct CartManagerInner {
    remote: Arc<dyn CartApi>,
    store: LocalCartStore,
    user: UserId,
    state: watch::Sender<CartState>,
}

/// A difference between the local cart and the remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartDiscrepancy {
    /// The line exists locally but not remotely.
    MissingRemotely { id: ProductId, local_quantity: u32 },
    /// The line exists remotely but not locally.
    MissingLocally { id: ProductId, remote_quantity: u32 },
    /// Both sides hold the line with different quantities.
    QuantityMismatch {
        id: ProductId,
        local_quantity: u32,
        remote_quantity: u32,
    },
}

impl CartManager {
    /// Create a manager for `user`'s cart. The cart starts empty and loading
    /// until [`CartManager::hydrate`] runs.
    #[must_use]
    pub fn new(remote: Arc<dyn CartApi>, store: LocalCartStore, user: UserId) -> Self {
        let (state, _) = watch::channel(CartState::new());
        Self {
            inner: Arc::new(CartManagerInner {
                remote,
                store,
                user,
                state,
            }),
        }
    }

    /// The identity remote cart calls are made for.
    #[must_use]
    pub fn user(&self) -> UserId {
        self.inner.user
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Watch the state; the receiver sees every published transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    /// Whether a line exists for `id`.
    #[must_use]
    pub fn is_in_cart(&self, id: ProductId) -> bool {
        self.inner.state.borrow().contains(id)
    }

    /// Checkout totals for the current state.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from(&*self.inner.state.borrow())
    }

    /// Apply `action` and publish it; returns the post-transition state if
    /// anything changed.
    fn dispatch(&self, action: CartAction) -> Option<CartState> {
        let mut after = None;
        self.inner.state.send_if_modified(|state| {
            let changed = state.apply(action);
            if changed {
                after = Some(state.clone());
            }
            changed
        });
        after
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    /// Load the cart at session start: remote first, then the local store,
    /// else empty. Always leaves `loading` cleared.
    #[instrument(skip(self), fields(user_id = %self.inner.user))]
    pub async fn hydrate(&self) {
        self.dispatch(CartAction::SetLoading(true));

        match self.inner.remote.fetch_cart(self.inner.user).await {
            Ok(lines) => {
                if let Some(after) = self.dispatch(CartAction::SetCart(lines)) {
                    self.inner.store.write(&after.items);
                    info!(lines = after.items.len(), "Cart hydrated from remote");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to load remote cart, using local store");
                if let Some(lines) = self.inner.store.read() {
                    self.dispatch(CartAction::SetCart(lines));
                    info!(lines = self.snapshot().items.len(), "Cart hydrated from local store");
                } else {
                    self.dispatch(CartAction::SetLoading(false));
                }
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `item`.
    ///
    /// # Errors
    ///
    /// Returns a validation error, without touching the cart, if the item has
    /// no assigned id or a negative price. Remote failures are not errors.
    #[instrument(skip(self, item), fields(product_id = %item.id))]
    pub async fn add_item(&self, item: CatalogItem) -> Result<(), ValidationErrors> {
        item.validate_for_cart()?;
        let id = item.id;

        let Some(after) = self.dispatch(CartAction::Add(item)) else {
            return Ok(());
        };

        let result = self
            .inner
            .remote
            .add_items(self.inner.user, &[CartItemInput::new(id, 1)])
            .await;
        self.finish_sync(result, &after.items, "add");
        Ok(())
    }

    /// Remove the line for `id`. No-op if absent.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_item(&self, id: ProductId) {
        let Some(after) = self.dispatch(CartAction::Remove(id)) else {
            return;
        };

        let result = self.inner.remote.remove_item(self.inner.user, id).await;
        self.finish_sync(result, &after.items, "remove");
    }

    /// Set the quantity for `id`; zero or below removes the line. No-op if
    /// absent.
    ///
    /// A positive quantity is synced as a merge of the whole post-transition
    /// line list; a removal is synced like [`CartManager::remove_item`].
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_quantity(&self, id: ProductId, quantity: i64) {
        let Some(after) = self.dispatch(CartAction::UpdateQuantity { id, quantity }) else {
            return;
        };

        let result = if quantity <= 0 {
            self.inner.remote.remove_item(self.inner.user, id).await
        } else {
            let items: Vec<CartItemInput> = after.items.iter().map(CartItemInput::from).collect();
            self.inner
                .remote
                .update_items(self.inner.user, true, &items)
                .await
        };
        self.finish_sync(result, &after.items, "update");
    }

    /// Empty the cart, then clear the remote cart and the local store.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        self.dispatch(CartAction::Clear);

        if let Err(e) = self.inner.remote.clear_cart(self.inner.user).await {
            warn!(error = %e, "Failed to clear remote cart; keeping local state");
        }
        self.inner.store.erase();
    }

    /// Check out the current cart.
    ///
    /// Payment is not implemented: checkout returns the order totals and
    /// empties the cart.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the cart is empty.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<CartSummary, ValidationErrors> {
        let summary = self.summary();
        if summary.total_items == 0 {
            let mut errors = ValidationErrors::default();
            errors.push("cart", "Cart is empty");
            return Err(errors);
        }

        self.clear().await;
        info!(total = %summary.total, items = summary.total_items, "Checked out cart");
        Ok(summary)
    }

    /// Compare the local cart with the remote cart, line by line.
    ///
    /// Never changes either side.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote cart cannot be fetched.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<Vec<CartDiscrepancy>, RemoteError> {
        let remote = self.inner.remote.fetch_cart(self.inner.user).await?;
        let local = self.snapshot().items;
        let discrepancies = diff_lines(&local, &remote);
        if !discrepancies.is_empty() {
            warn!(count = discrepancies.len(), "Local cart differs from remote cart");
        }
        Ok(discrepancies)
    }

    fn finish_sync(&self, result: Result<(), RemoteError>, lines: &[CartLine], operation: &str) {
        match result {
            Ok(()) => self.inner.store.write(lines),
            Err(e) => warn!(error = %e, operation, "Failed to sync cart; keeping local state"),
        }
    }
}

/// Line-by-line differences between `local` and `remote`, local order first.
fn diff_lines(local: &[CartLine], remote: &[CartLine]) -> Vec<CartDiscrepancy> {
    let mut discrepancies = Vec::new();

    for line in local {
        match remote.iter().find(|r| r.id() == line.id()) {
            None => discrepancies.push(CartDiscrepancy::MissingRemotely {
                id: line.id(),
                local_quantity: line.quantity,
            }),
            Some(r) if r.quantity != line.quantity => {
                discrepancies.push(CartDiscrepancy::QuantityMismatch {
                    id: line.id(),
                    local_quantity: line.quantity,
                    remote_quantity: r.quantity,
                });
            }
            Some(_) => {}
        }
    }

    for r in remote {
        if !local.iter().any(|l| l.id() == r.id()) {
            discrepancies.push(CartDiscrepancy::MissingLocally {
                id: r.id(),
                remote_quantity: r.quantity,
            });
        }
    }

    discrepancies
}
