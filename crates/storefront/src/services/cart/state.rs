//! Cart state and its transitions.
//!
//! [`CartState::apply`] is the only way the line list changes. Aggregates are
//! recomputed from the lines after every transition, so they can never drift
//! from what the cart holds.

use amber_market_core::{CartLine, CatalogItem, ProductId, format_amount, round_cents};
use rust_decimal::Decimal;
use serde::Serialize;

/// Tax applied in the order summary (10%).
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// The cart as the current session sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct CartState {
    /// Lines in first-insertion order.
    pub items: Vec<CartLine>,
    /// Sum of all quantities.
    pub total_items: u32,
    /// Sum of price x quantity, discount not applied.
    pub total_price: Decimal,
    /// Whether the initial hydration is still outstanding.
    pub loading: bool,
}

/// A transition of [`CartState`].
#[derive(Debug, Clone)]
pub enum CartAction {
    SetLoading(bool),
    /// Replace the lines wholesale (hydration); also clears `loading`.
    SetCart(Vec<CartLine>),
    /// Add one unit of the item.
    Add(CatalogItem),
    Remove(ProductId),
    /// Set a line's quantity; zero or below removes the line.
    UpdateQuantity { id: ProductId, quantity: i64 },
    Clear,
}

impl Default for CartState {
    fn default() -> Self {
        Self::new()
    }
}

impl CartState {
    /// An empty cart waiting for hydration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            total_price: Decimal::ZERO,
            loading: true,
        }
    }

    /// An empty, settled cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            loading: false,
            ..Self::new()
        }
    }

    /// Apply `action`, returning whether anything changed.
    pub fn apply(&mut self, action: CartAction) -> bool {
        match action {
            CartAction::SetLoading(loading) => {
                let changed = self.loading != loading;
                self.loading = loading;
                return changed;
            }
            CartAction::SetCart(lines) => {
                self.items = normalize(lines);
                self.loading = false;
            }
            CartAction::Add(item) => {
                if let Some(line) = self.line_mut(item.id) {
                    line.quantity = line.quantity.saturating_add(1);
                } else {
                    self.items.push(CartLine::new(item, 1));
                }
            }
            CartAction::Remove(id) => {
                let before = self.items.len();
                self.items.retain(|line| line.id() != id);
                if self.items.len() == before {
                    return false;
                }
            }
            CartAction::UpdateQuantity { id, quantity } => {
                if quantity <= 0 {
                    return self.apply(CartAction::Remove(id));
                }
                let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                let Some(line) = self.line_mut(id) else {
                    return false;
                };
                if line.quantity == quantity {
                    return false;
                }
                line.quantity = quantity;
            }
            CartAction::Clear => {
                *self = Self::empty();
                return true;
            }
        }
        self.recompute();
        true
    }

    /// Whether a line exists for `id`.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.iter().any(|line| line.id() == id)
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.items.iter().find(|line| line.id() == id)
    }

    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartLine> {
        self.items.iter_mut().find(|line| line.id() == id)
    }

    fn recompute(&mut self) {
        self.total_items = self
            .items
            .iter()
            .fold(0u32, |sum, line| sum.saturating_add(line.quantity));
        self.total_price = self.items.iter().map(CartLine::line_total).sum();
    }
}

/// Merge duplicate ids (summing quantities, first position wins) and drop
/// zero-quantity lines from an externally sourced line list.
fn normalize(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            continue;
        }
        if let Some(existing) = merged.iter_mut().find(|l| l.id() == line.id()) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            merged.push(line);
        }
    }
    merged
}

// =============================================================================
// Order Summary
// =============================================================================

/// Totals shown at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub total_items: u32,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl From<&CartState> for CartSummary {
    fn from(state: &CartState) -> Self {
        let subtotal = round_cents(state.total_price);
        let tax = round_cents(state.total_price * TAX_RATE);
        Self {
            total_items: state.total_items,
            subtotal,
            shipping: Decimal::ZERO,
            tax,
            total: subtotal + tax,
        }
    }
}

/// Display form of [`CartSummary`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummaryView {
    pub total_items: u32,
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub total: String,
}

impl From<&CartSummary> for CartSummaryView {
    fn from(summary: &CartSummary) -> Self {
        Self {
            total_items: summary.total_items,
            subtotal: format_amount(summary.subtotal),
            shipping: format_amount(summary.shipping),
            tax: format_amount(summary.tax),
            total: format_amount(summary.total),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, price: i64) -> CatalogItem {
        CatalogItem::new(ProductId::new(id), format!("Item {id}"), Decimal::new(price, 0))
    }

    fn settled() -> CartState {
        CartState::empty()
    }

    fn assert_consistent(state: &CartState) {
        let items: u32 = state.items.iter().map(|l| l.quantity).sum();
        let price: Decimal = state.items.iter().map(CartLine::line_total).sum();
        assert_eq!(state.total_items, items);
        assert_eq!(state.total_price, price);
        assert!(state.items.iter().all(|l| l.quantity >= 1));
    }

    #[test]
    fn test_new_is_loading_and_empty() {
        let state = CartState::new();
        assert!(state.loading);
        assert!(state.items.is_empty());
        assert_eq!(state.total_items, 0);
        assert_eq!(state.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_scenarios_a_through_d() {
        let mut state = settled();

        // A: add to empty cart
        assert!(state.apply(CartAction::Add(item(1, 10))));
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].quantity, 1);
        assert_eq!(state.total_items, 1);
        assert_eq!(state.total_price, Decimal::new(10, 0));

        // B: same item again increments
        state.apply(CartAction::Add(item(1, 10)));
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].quantity, 2);
        assert_eq!(state.total_items, 2);
        assert_eq!(state.total_price, Decimal::new(20, 0));

        // C: update quantity
        state.apply(CartAction::UpdateQuantity {
            id: ProductId::new(1),
            quantity: 5,
        });
        assert_eq!(state.total_items, 5);
        assert_eq!(state.total_price, Decimal::new(50, 0));

        // D: remove
        state.apply(CartAction::Remove(ProductId::new(1)));
        assert!(state.items.is_empty());
        assert_eq!(state.total_items, 0);
        assert_eq!(state.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_aggregates_consistent_after_every_add() {
        let mut state = settled();
        for (id, price) in [(1, 3), (2, 7), (3, 11), (4, 0), (5, 2)] {
            state.apply(CartAction::Add(item(id, price)));
            assert_consistent(&state);
        }
        assert_eq!(state.total_items, 5);
        assert_eq!(state.total_price, Decimal::new(23, 0));
    }

    #[test]
    fn test_insertion_order_preserved_on_update() {
        let mut state = settled();
        state.apply(CartAction::Add(item(3, 1)));
        state.apply(CartAction::Add(item(1, 1)));
        state.apply(CartAction::Add(item(2, 1)));
        state.apply(CartAction::Add(item(3, 1)));
        state.apply(CartAction::UpdateQuantity {
            id: ProductId::new(1),
            quantity: 9,
        });

        let ids: Vec<i32> = state.items.iter().map(|l| l.id().as_i32()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_update_to_zero_or_negative_removes_line() {
        for quantity in [0, -1, -50] {
            let mut state = settled();
            state.apply(CartAction::Add(item(1, 10)));
            state.apply(CartAction::Add(item(2, 4)));

            assert!(state.apply(CartAction::UpdateQuantity {
                id: ProductId::new(1),
                quantity,
            }));
            assert!(!state.contains(ProductId::new(1)));
            assert_eq!(state.total_items, 1);
            assert_eq!(state.total_price, Decimal::new(4, 0));
            assert_consistent(&state);
        }
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut state = settled();
        state.apply(CartAction::Add(item(1, 10)));
        let before = state.clone();

        assert!(!state.apply(CartAction::UpdateQuantity {
            id: ProductId::new(99),
            quantity: 3,
        }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_update_same_quantity_reports_no_change() {
        let mut state = settled();
        state.apply(CartAction::Add(item(1, 10)));
        assert!(!state.apply(CartAction::UpdateQuantity {
            id: ProductId::new(1),
            quantity: 1,
        }));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut state = settled();
        state.apply(CartAction::Add(item(1, 10)));
        let before = state.clone();

        assert!(!state.apply(CartAction::Remove(ProductId::new(2))));
        assert_eq!(state, before);
    }

    #[test]
    fn test_clear_always_empties() {
        let mut state = CartState::new();
        state.apply(CartAction::Clear);
        assert_eq!(state, CartState::empty());

        state.apply(CartAction::Add(item(1, 10)));
        state.apply(CartAction::Add(item(2, 5)));
        state.apply(CartAction::Clear);
        assert!(state.items.is_empty());
        assert_eq!(state.total_items, 0);
        assert_eq!(state.total_price, Decimal::ZERO);
        assert!(!state.loading);
    }

    #[test]
    fn test_set_cart_normalizes_and_settles() {
        let mut state = CartState::new();
        state.apply(CartAction::SetCart(vec![
            CartLine::new(item(2, 5), 3),
            CartLine::new(item(4, 1), 0),
            CartLine::new(item(2, 5), 1),
        ]));

        assert!(!state.loading);
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.total_items, 4);
        assert_eq!(state.total_price, Decimal::new(20, 0));
    }

    #[test]
    fn test_set_loading_reports_change() {
        let mut state = CartState::new();
        assert!(!state.apply(CartAction::SetLoading(true)));
        assert!(state.apply(CartAction::SetLoading(false)));
    }

    #[test]
    fn test_summary() {
        let mut state = settled();
        state.apply(CartAction::Add(CatalogItem::new(
            ProductId::new(1),
            "Lamp",
            Decimal::new(1999, 2),
        )));
        state.apply(CartAction::Add(item(2, 5)));

        let summary = CartSummary::from(&state);
        assert_eq!(summary.subtotal, Decimal::new(2499, 2));
        assert_eq!(summary.tax, Decimal::new(250, 2));
        assert_eq!(summary.total, Decimal::new(2749, 2));

        let view = CartSummaryView::from(&summary);
        assert_eq!(view.subtotal, "$24.99");
        assert_eq!(view.shipping, "$0.00");
        assert_eq!(view.tax, "$2.50");
        assert_eq!(view.total, "$27.49");
    }
}
