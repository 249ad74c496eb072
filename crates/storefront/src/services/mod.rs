//! State managers behind the views.
//!
//! # Services
//!
//! - `cart` - Cart state, remote cart sync and local persistence
//! - `products` - Product list with search, filtering and edits
//! - `auth` - Login gate consulted by the route guard

pub mod auth;
pub mod cart;
pub mod products;

pub use auth::{AuthError, AuthGate, AuthStatus};
pub use cart::{CartDiscrepancy, CartManager, CartState, CartSummary};
pub use products::{ProductError, ProductStore, ProductsState};
