//! Core types for DAC Retail.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod order_number;
pub mod price;
pub mod status;

pub use contact::{ContactError, Email, MobileNumber, PinCode};
pub use id::*;
pub use order_number::{OrderNumber, OrderNumberError};
pub use price::Price;
pub use status::*;
