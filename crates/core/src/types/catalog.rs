//! Catalog records as served by the remote product catalog.
//!
//! The remote catalog returns a rich product record from its product
//! endpoints but only a handful of fields (id, title, price, thumbnail,
//! discount) inside cart payloads, so every field beyond `id` and `price`
//! falls back to its default when absent.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::validation::ValidationErrors;

/// Image used for products submitted without one.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300";

/// A product record sourced from the remote catalog.
///
/// The cart never mutates these fields; it only tracks a quantity next to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Stable identifier assigned by the remote catalog.
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-text category label (usually a slug such as `smartphones`).
    #[serde(default)]
    pub category: String,
    /// Unit price before discount.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Advertised discount, 0-100.
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    /// Average review score, 0-5.
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl CatalogItem {
    /// Create a minimal item with just an id, title and price.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            category: String::new(),
            price,
            discount_percentage: None,
            rating: None,
            stock: 0,
            brand: None,
            thumbnail: String::new(),
            images: Vec::new(),
        }
    }

    /// Check the fields the cart relies on: an assigned id and a non-negative
    /// price.
    ///
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate_for_cart(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if !self.id.is_assigned() {
            errors.push("id", format!("invalid product id {}", self.id));
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            errors.push("price", "Price cannot be negative");
        }
        errors.into_result()
    }

    /// Price after applying the advertised discount.
    #[must_use]
    pub fn discounted_price(&self) -> Decimal {
        let Some(pct) = self
            .discount_percentage
            .and_then(|p| Decimal::try_from(p.clamp(0.0, 100.0)).ok())
        else {
            return self.price;
        };
        self.price - self.price * pct / Decimal::ONE_HUNDRED
    }
}

/// The fields a user may submit when creating or editing a product.
///
/// All fields are optional on the wire so an edit can send a partial update;
/// [`ProductDraft::validate`] enforces what a complete submission needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ProductDraft {
    /// Validate a draft submitted to create a new product.
    ///
    /// Title, description, category and price are required; price must not be
    /// negative.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if is_blank(self.title.as_deref()) {
            errors.push("title", "Title is required");
        }
        if is_blank(self.description.as_deref()) {
            errors.push("description", "Description is required");
        }
        if is_blank(self.category.as_deref()) {
            errors.push("category", "Category is required");
        }
        match self.price {
            None => errors.push("price", "Price is required"),
            Some(price) if price.is_sign_negative() && !price.is_zero() => {
                errors.push("price", "Price cannot be negative");
            }
            Some(_) => {}
        }
        errors.into_result()
    }

    /// Validate a partial update: only the fields present are checked.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate_update(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            errors.push("title", "Title cannot be empty");
        }
        if self.category.as_deref().is_some_and(|c| c.trim().is_empty()) {
            errors.push("category", "Category cannot be empty");
        }
        if self
            .price
            .is_some_and(|p| p.is_sign_negative() && !p.is_zero())
        {
            errors.push("price", "Price cannot be negative");
        }
        errors.into_result()
    }

    /// Fill in the image list with the placeholder when none was given.
    #[must_use]
    pub fn with_default_image(mut self) -> Self {
        let missing = self
            .images
            .as_ref()
            .is_none_or(|imgs| imgs.iter().all(|i| i.trim().is_empty()));
        if missing {
            self.images = Some(vec![PLACEHOLDER_IMAGE.to_string()]);
        }
        self
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// The normalized shape of a catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryInfo {
    /// URL-safe key used to list the category's products.
    pub slug: String,
    /// Display name.
    pub name: String,
}

impl CategoryInfo {
    /// Build a category from a bare label, deriving its slug.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self {
            slug: category_slug(label),
            name: label.to_string(),
        }
    }
}

/// Derive a slug from a category label: lowercase, whitespace runs become `-`.
#[must_use]
pub fn category_slug(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
