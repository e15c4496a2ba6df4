//! Nexus Core - Shared types library.
//!
//! This crate provides the value types used by the storefront client:
//! - `storefront` - Cart, catalog, order history and session state
//! - `integration-tests` - Cross-module behaviour checks
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! persistence, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, order numbers and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
