//! Core types for the Nexus storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod order;
pub mod price;
pub mod status;

pub use id::*;
pub use order::{OrderNumber, OrderNumberError};
pub use price::{CurrencyCode, Price, PriceInput, normalize_price};
pub use status::OrderStatus;
