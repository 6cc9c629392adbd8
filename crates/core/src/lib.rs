//! DAC Retail Core - Shared domain types.
//!
//! This crate provides the types shared by every DAC Retail component:
//! - `storefront` - Catalog, cart, order and shipment HTTP service
//! - `cli` - Migrations, catalog seeding and shipment operations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! Database encodings are available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, contact details, order numbers and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
