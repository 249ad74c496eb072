//! Integration tests for Amber Market.
//!
//! The tests run the storefront library against [`FakeCatalog`], an
//! in-process stand-in for the remote catalog service bound to an ephemeral
//! local port. No network access or external services are needed:
//!
//! ```bash
//! cargo test -p amber-market-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog_client` - Wire behavior of `DummyJsonClient`
//! - `cart_sync` - Cart manager against the remote cart and the local file
//! - `routes` - HTTP surface, login guard included

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use amber_market_core::{CartLine, CatalogItem, ProductId, UserId};
use amber_market_storefront::config::{CartConfig, CatalogConfig, StorefrontConfig};
use amber_market_storefront::state::AppState;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Credentials the fake accepts.
pub const USERNAME: &str = "emilys";
pub const PASSWORD: &str = "emilyspass";

// =============================================================================
// Fake catalog service
// =============================================================================

#[derive(Default)]
struct FakeState {
    products: Mutex<Vec<CatalogItem>>,
    carts: Mutex<HashMap<i32, Vec<CartLine>>>,
    requests: Mutex<Vec<String>>,
    legacy_categories: AtomicBool,
    carts_down: AtomicBool,
}

/// A running fake of the remote catalog service.
#[derive(Clone)]
pub struct FakeCatalog {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeCatalog {
    /// Start the fake on `127.0.0.1:0`, seeded with [`seed_products`].
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        *state.products.lock().unwrap() = seed_products();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = fake_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Answer the categories endpoint with bare labels instead of objects.
    pub fn use_legacy_categories(&self) {
        self.state.legacy_categories.store(true, Ordering::SeqCst);
    }

    /// Make every cart endpoint answer 500.
    pub fn set_carts_down(&self, down: bool) {
        self.state.carts_down.store(down, Ordering::SeqCst);
    }

    /// Seed the remote cart of `user`.
    pub fn set_cart(&self, user: i32, lines: Vec<CartLine>) {
        self.state.carts.lock().unwrap().insert(user, lines);
    }

    /// `(id, quantity)` pairs of the remote cart of `user`.
    pub fn cart_pairs(&self, user: i32) -> Vec<(i32, u32)> {
        self.state
            .carts
            .lock()
            .unwrap()
            .get(&user)
            .map(|lines| lines.iter().map(|l| (l.id().as_i32(), l.quantity)).collect())
            .unwrap_or_default()
    }

    /// Every request received so far, as `"METHOD /path"`.
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Catalog configuration pointing at this fake.
    #[must_use]
    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(5),
            page_limit: None,
        }
    }
}

/// The products every fake starts with.
#[must_use]
pub fn seed_products() -> Vec<CatalogItem> {
    vec![
        product(1, "iPhone 9", "smartphones", Decimal::new(549, 0)),
        product(2, "iPhone X", "smartphones", Decimal::new(899, 0)),
        product(3, "Essence Mascara Lash Princess", "beauty", Decimal::new(999, 2)),
        product(4, "Annibale Colombo Bed", "furniture", Decimal::new(189_999, 2)),
    ]
}

fn product(id: i32, title: &str, category: &str, price: Decimal) -> CatalogItem {
    let mut item = CatalogItem::new(ProductId::new(id), title, price);
    item.category = category.to_string();
    item.description = format!("{title} description");
    item.thumbnail = format!("https://cdn.example.com/products/{id}/thumbnail.png");
    item.stock = 10;
    item
}

type Shared = State<Arc<FakeState>>;

fn fake_router(state: Arc<FakeState>) -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/products/categories", get(list_categories))
        .route("/products/category/{slug}", get(list_by_category))
        .route("/products/add", post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/carts/user/{id}", get(user_carts))
        .route("/carts/add", post(add_cart))
        .route("/carts/{id}", put(update_cart).delete(delete_cart))
        .route("/auth/login", post(login))
        .layer(axum::middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(
    State(state): Shared,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    state
        .requests
        .lock()
        .unwrap()
        .push(format!("{} {}", request.method(), request.uri()));
    next.run(request).await
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
}

fn product_page(products: Vec<CatalogItem>) -> Json<Value> {
    let total = products.len();
    Json(json!({ "products": products, "total": total, "skip": 0, "limit": total }))
}

#[derive(Deserialize)]
struct ListParams {
    limit: Option<usize>,
    q: Option<String>,
}

async fn list_products(State(state): Shared, Query(params): Query<ListParams>) -> Json<Value> {
    let mut products = state.products.lock().unwrap().clone();
    if let Some(limit) = params.limit.filter(|l| *l > 0) {
        products.truncate(limit);
    }
    product_page(products)
}

async fn search_products(State(state): Shared, Query(params): Query<ListParams>) -> Json<Value> {
    let q = params.q.unwrap_or_default().to_lowercase();
    let products = state
        .products
        .lock()
        .unwrap()
        .iter()
        .filter(|p| p.title.to_lowercase().contains(&q))
        .cloned()
        .collect();
    product_page(products)
}

async fn list_categories(State(state): Shared) -> Json<Value> {
    let mut labels: Vec<String> = Vec::new();
    for p in state.products.lock().unwrap().iter() {
        if !labels.contains(&p.category) {
            labels.push(p.category.clone());
        }
    }

    if state.legacy_categories.load(Ordering::SeqCst) {
        return Json(json!(labels));
    }
    let objects: Vec<Value> = labels
        .iter()
        .map(|slug| {
            json!({
                "slug": slug,
                "name": title_case(slug),
                "url": format!("https://dummyjson.com/products/category/{slug}"),
            })
        })
        .collect();
    Json(Value::Array(objects))
}

fn title_case(slug: &str) -> String {
    let mut chars = slug.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

async fn list_by_category(State(state): Shared, Path(slug): Path<String>) -> Json<Value> {
    let products = state
        .products
        .lock()
        .unwrap()
        .iter()
        .filter(|p| p.category == slug)
        .cloned()
        .collect();
    product_page(products)
}

fn find_product(state: &FakeState, id: i32) -> Option<CatalogItem> {
    state
        .products
        .lock()
        .unwrap()
        .iter()
        .find(|p| p.id.as_i32() == id)
        .cloned()
}

async fn get_product(State(state): Shared, Path(id): Path<i32>) -> Response {
    find_product(&state, id).map_or_else(
        || not_found(format!("Product with id '{id}' not found")),
        |p| Json(p).into_response(),
    )
}

async fn create_product(State(state): Shared, Json(mut body): Json<Value>) -> Json<Value> {
    // Like the real service: echo with a fresh id, store nothing
    let next = state.products.lock().unwrap().len() + 1;
    body["id"] = json!(next);
    Json(body)
}

async fn update_product(
    State(state): Shared,
    Path(id): Path<i32>,
    Json(patch): Json<Value>,
) -> Response {
    let Some(existing) = find_product(&state, id) else {
        return not_found(format!("Product with id '{id}' not found"));
    };
    let mut merged = serde_json::to_value(existing).unwrap();
    if let (Some(target), Some(fields)) = (merged.as_object_mut(), patch.as_object()) {
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
    }
    Json(merged).into_response()
}

async fn delete_product(State(state): Shared, Path(id): Path<i32>) -> Response {
    let Some(existing) = find_product(&state, id) else {
        return not_found(format!("Product with id '{id}' not found"));
    };
    let mut body = serde_json::to_value(existing).unwrap();
    body["isDeleted"] = json!(true);
    Json(body).into_response()
}

// -----------------------------------------------------------------------------
// Carts
// -----------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCartBody {
    user_id: i32,
    products: Vec<PairBody>,
}

#[derive(Deserialize)]
struct UpdateCartBody {
    #[serde(default)]
    merge: bool,
    products: Vec<PairBody>,
}

#[derive(Deserialize)]
struct PairBody {
    id: i32,
    quantity: u32,
}

fn carts_down(state: &FakeState) -> Option<Response> {
    state.carts_down.load(Ordering::SeqCst).then(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "cart service unavailable" })),
        )
            .into_response()
    })
}

fn cart_json(user: i32, lines: &[CartLine]) -> Value {
    // Cart entries carry only a summary of the product plus its quantity
    let products: Vec<Value> = lines
        .iter()
        .map(|line| {
            let item = serde_json::to_value(&line.item).unwrap();
            json!({
                "id": item["id"],
                "title": item["title"],
                "price": item["price"],
                "quantity": line.quantity,
                "thumbnail": item["thumbnail"],
            })
        })
        .collect();
    json!({ "id": 50 + user, "userId": user, "products": products })
}

fn line_for(state: &FakeState, id: i32, quantity: u32) -> CartLine {
    let item = find_product(state, id)
        .unwrap_or_else(|| CatalogItem::new(ProductId::new(id), "", Decimal::ZERO));
    CartLine::new(item, quantity)
}

async fn user_carts(State(state): Shared, Path(user): Path<i32>) -> Response {
    if let Some(down) = carts_down(&state) {
        return down;
    }
    let carts: Vec<Value> = state
        .carts
        .lock()
        .unwrap()
        .get(&user)
        .map(|lines| vec![cart_json(user, lines)])
        .unwrap_or_default();
    let total = carts.len();
    Json(json!({ "carts": carts, "total": total, "skip": 0, "limit": total })).into_response()
}

async fn add_cart(State(state): Shared, Json(body): Json<AddCartBody>) -> Response {
    if let Some(down) = carts_down(&state) {
        return down;
    }
    let mut carts = state.carts.lock().unwrap();
    let lines = carts.entry(body.user_id).or_default();
    for pair in body.products {
        match lines.iter_mut().find(|l| l.id().as_i32() == pair.id) {
            Some(line) => line.quantity += pair.quantity,
            None => lines.push(line_for(&state, pair.id, pair.quantity)),
        }
    }
    (StatusCode::CREATED, Json(cart_json(body.user_id, lines))).into_response()
}

async fn update_cart(
    State(state): Shared,
    Path(user): Path<i32>,
    Json(body): Json<UpdateCartBody>,
) -> Response {
    if let Some(down) = carts_down(&state) {
        return down;
    }
    let mut carts = state.carts.lock().unwrap();
    let lines = carts.entry(user).or_default();
    if !body.merge {
        lines.clear();
    }
    for pair in body.products {
        match lines.iter_mut().find(|l| l.id().as_i32() == pair.id) {
            Some(line) => line.quantity = pair.quantity,
            None => lines.push(line_for(&state, pair.id, pair.quantity)),
        }
    }
    Json(cart_json(user, lines)).into_response()
}

async fn delete_cart(State(state): Shared, Path(user): Path<i32>) -> Response {
    if let Some(down) = carts_down(&state) {
        return down;
    }
    match state.carts.lock().unwrap().remove(&user) {
        Some(lines) => {
            let mut body = cart_json(user, &lines);
            body["isDeleted"] = json!(true);
            Json(body).into_response()
        }
        None => not_found(format!("Cart with id '{user}' not found")),
    }
}

// -----------------------------------------------------------------------------
// Auth
// -----------------------------------------------------------------------------

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    if body.username == USERNAME && body.password == PASSWORD {
        Json(json!({
            "id": 1,
            "username": body.username,
            "email": "emily.johnson@x.dummyjson.com",
            "accessToken": "fake-access-token",
            "refreshToken": "fake-refresh-token",
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response()
    }
}

// =============================================================================
// Storefront wiring
// =============================================================================

/// A storefront wired to a [`FakeCatalog`], with its local cart file in a
/// temporary directory.
pub struct TestContext {
    pub catalog: FakeCatalog,
    pub state: AppState,
    pub store_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let catalog = FakeCatalog::start().await;
        let store_dir = tempfile::tempdir().unwrap();
        let state = AppState::new(config_for(&catalog, &store_dir)).unwrap();
        Self {
            catalog,
            state,
            store_dir,
        }
    }

    /// Path of the local cart file.
    #[must_use]
    pub fn store_path(&self) -> std::path::PathBuf {
        self.store_dir.path().join("cart.json")
    }
}

/// Storefront configuration for `catalog`, persisting into `store_dir`.
#[must_use]
pub fn config_for(catalog: &FakeCatalog, store_dir: &TempDir) -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        catalog: catalog.catalog_config(),
        cart: CartConfig {
            user_id: UserId::new(1),
            store_path: Some(store_dir.path().join("cart.json")),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}
