//! Product route handlers.

use amber_market_core::{CatalogItem, CategoryInfo, ProductDraft, ProductId, format_amount};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

/// Product display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub item: CatalogItem,
    /// Price formatted for display
    pub display_price: String,
    /// Discounted price, present only when the product advertises a discount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    /// Whether the product already has a cart line
    pub in_cart: bool,
}

/// Product listing query parameters.
///
/// `q` wins over `category` when both are given.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
}

/// Product listing.
#[derive(Debug, Serialize)]
pub struct ProductListView {
    pub products: Vec<ProductView>,
    pub total: usize,
}

fn view(state: &AppState, item: CatalogItem) -> ProductView {
    ProductView {
        display_price: format_amount(item.price),
        sale_price: item
            .discount_percentage
            .filter(|pct| *pct > 0.0)
            .map(|_| format_amount(item.discounted_price())),
        in_cart: state.cart().is_in_cart(item.id),
        item,
    }
}

fn list_view(state: &AppState, items: Vec<CatalogItem>) -> Json<ProductListView> {
    let products: Vec<ProductView> = items.into_iter().map(|i| view(state, i)).collect();
    Json(ProductListView {
        total: products.len(),
        products,
    })
}

/// List, search or filter products. The listing replaces the product list
/// the store holds.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductListView>> {
    let products = state.products();
    let items = match (query.q.as_deref(), query.category.as_deref()) {
        (Some(q), _) if !q.trim().is_empty() => products.search(q).await?,
        (_, Some(category)) => products.filter_by_category(category).await?,
        _ => products.fetch_all().await?,
    };
    Ok(list_view(&state, items))
}

/// List the catalog's categories.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryInfo>>> {
    Ok(Json(state.products().categories().await?))
}

/// Display one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let item = state.products().get(id).await?;
    Ok(Json(view(&state, item)))
}

/// Create a product.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<ProductView>)> {
    let item = state.products().add(draft).await?;
    Ok((StatusCode::CREATED, Json(view(&state, item))))
}

/// Update the submitted fields of a product.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<ProductView>> {
    let item = state.products().update(id, draft).await?;
    Ok(Json(view(&state, item)))
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let item = state.products().delete(id).await?;
    Ok(Json(view(&state, item)))
}
