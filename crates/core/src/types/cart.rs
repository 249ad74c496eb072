//! Cart line type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::catalog::CatalogItem;
use crate::types::id::ProductId;

/// One catalog item held in the cart with its quantity.
///
/// Serialized as `{"product": {...}, "quantity": n}`, which is also the
/// shape persisted by the local cart store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "product")]
    pub item: CatalogItem,
    /// Always at least 1 while the line is in a cart.
    pub quantity: u32,
}

impl CartLine {
    /// Create a line for `item` with the given quantity.
    #[must_use]
    pub const fn new(item: CatalogItem, quantity: u32) -> Self {
        Self { item, quantity }
    }

    /// The catalog id this line refers to.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.item.id
    }

    /// Unit price times quantity, discount not applied.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.item.price * Decimal::from(self.quantity)
    }
}
