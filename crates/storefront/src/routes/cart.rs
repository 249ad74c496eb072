//! Cart route handlers.
//!
//! Every mutation answers with the cart as it stands right after the local
//! transition; remote sync failures are not surfaced here.

use amber_market_core::{CartLine, ProductId, format_amount};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::services::CartDiscrepancy;
use crate::services::cart::{CartState, CartSummary, CartSummaryView};
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: ProductId,
    pub title: String,
    pub thumbnail: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total_items: u32,
    pub total_price: String,
    pub loading: bool,
    pub summary: CartSummaryView,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id(),
            title: line.item.title.clone(),
            thumbnail: line.item.thumbnail.clone(),
            quantity: line.quantity,
            price: format_amount(line.item.price),
            line_price: format_amount(line.line_total()),
        }
    }
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        let summary = CartSummary::from(state);
        Self {
            items: state.items.iter().map(CartItemView::from).collect(),
            total_items: state.total_items,
            total_price: format_amount(state.total_price),
            loading: state.loading,
            summary: CartSummaryView::from(&summary),
        }
    }
}

fn current(state: &AppState) -> Json<CartView> {
    Json(CartView::from(&state.cart().snapshot()))
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub id: ProductId,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub message: &'static str,
    pub order: CartSummaryView,
}

/// Reconcile response.
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub in_sync: bool,
    pub discrepancies: Vec<CartDiscrepancy>,
}

/// Display the cart.
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    current(&state)
}

/// Add one unit of a catalog product.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let item = state.products().get(body.id).await?;
    state.cart().add_item(item).await?;

    let product_id = body.id.to_string();
    add_breadcrumb("cart", "Added item", Some(&[("product_id", product_id.as_str())]));
    Ok(current(&state))
}

/// Set a line's quantity; zero or below removes it.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Json<CartView> {
    state.cart().update_quantity(id, body.quantity).await;
    current(&state)
}

/// Remove a line.
#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>, Path(id): Path<ProductId>) -> Json<CartView> {
    state.cart().remove_item(id).await;
    current(&state)
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Json<CartView> {
    state.cart().clear().await;
    current(&state)
}

/// Check out: returns the order totals and empties the cart.
#[instrument(skip(state))]
pub async fn checkout(State(state): State<AppState>) -> Result<Json<CheckoutResponse>> {
    let summary = state.cart().checkout().await?;
    add_breadcrumb("cart", "Checked out", None);

    Ok(Json(CheckoutResponse {
        message: "Order placed",
        order: CartSummaryView::from(&summary),
    }))
}

/// Compare the local cart with the remote cart.
#[instrument(skip(state))]
pub async fn reconcile(State(state): State<AppState>) -> Result<Json<ReconcileResponse>> {
    let discrepancies = state.cart().reconcile().await?;
    Ok(Json(ReconcileResponse {
        in_sync: discrepancies.is_empty(),
        discrepancies,
    }))
}
