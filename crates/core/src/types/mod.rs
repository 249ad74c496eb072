//! Core types for Amber Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod price;
pub mod validation;

pub use cart::CartLine;
pub use catalog::{CatalogItem, CategoryInfo, PLACEHOLDER_IMAGE, ProductDraft, category_slug};
pub use id::*;
pub use price::{format_amount, round_cents};
pub use validation::{ValidationError, ValidationErrors};
