//! Nexus storefront client library.
//!
//! Client-side state and data access for the Nexus marketplace storefront.
//!
//! # Architecture
//!
//! - [`store`] - durable key-value persistence behind a typed adapter
//! - [`cart`] - the cart manager, sole owner of the persisted cart
//! - [`catalog`] - HTTP catalog client and paginated listing aggregation
//! - [`orders`] - checkout and order history
//! - [`auth`] - signup validation, login/logout and the persisted session
//! - [`config`], [`error`], [`telemetry`] - configuration, errors and logging
//!
//! # Example
//!
//! ```rust,ignore
//! let config = StorefrontConfig::from_env()?;
//! let _guard = telemetry::init(&config.telemetry);
//!
//! let store = PersistentStore::new(FileStore::open(&config.state_dir)?);
//! let mut cart = CartManager::new(store.clone());
//!
//! let aggregator = CatalogAggregator::new(CatalogClient::new(&config.catalog)?)
//!     .with_max_pages(config.catalog.max_pages);
//! let listing = aggregator.fetch_all(&CatalogQuery::all()).await;
//! if let Some(product) = listing.items.first() {
//!     cart.add_item(product.into())?;
//! }
//!
//! let order = OrderHistory::new(store).place_order(&mut cart)?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod orders;
pub mod store;
pub mod telemetry;

pub use auth::{AuthClient, AuthError, Session, SignupForm};
pub use cart::{Cart, CartManager, LineItem, ProductInput};
pub use catalog::{
    AggregatedCatalog, CatalogAggregator, CatalogClient, CatalogError, CatalogQuery,
    CatalogSource, Product,
};
pub use config::StorefrontConfig;
pub use error::{AppError, Result};
pub use orders::{Order, OrderHistory};
pub use store::{FileStore, MemoryStore, PersistentStore, StoreError};
