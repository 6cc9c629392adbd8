//! DAC Retail Storefront library.
//!
//! Catalog, cart, order, payment-profile and shipment services behind a JSON
//! API. Exposed as a library so the CLI and the integration tests can drive
//! the same services the server uses.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
