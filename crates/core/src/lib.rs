//! Amber Market Core - Shared types library.
//!
//! This crate provides the types shared between the storefront library,
//! its HTTP surface, and the integration tests:
//! - [`CatalogItem`] - a product record sourced from the remote catalog
//! - [`CartLine`] - a catalog item paired with a quantity
//! - [`CategoryInfo`] - the normalized shape of a catalog category
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, catalog items and cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
