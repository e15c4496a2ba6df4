//! Client-side shopping cart.
//!
//! [`CartManager`] owns the in-memory [`Cart`] for a session and mirrors
//! every mutation into the [`PersistentStore`] under [`keys::CART`]. It is
//! the only writer of that key.
//!
//! # Invariants
//!
//! - At most one [`LineItem`] per product id; adding an id again bumps its
//!   quantity and keeps the first-seen name, price and image.
//! - Line items stay in insertion order.
//! - Quantities are at least 1.
//! - The total is always recomputed from the lines, never cached.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use nexus_core::{CurrencyCode, Price, PriceInput, ProductId, normalize_price};

use crate::catalog::ProductImage;
use crate::error::add_breadcrumb;
use crate::store::{PersistentStore, StoreError, keys};

// =============================================================================
// Input
// =============================================================================

/// A product as handed to [`CartManager::add_item`].
///
/// The price may be a formatted string or a number; it is normalized on
/// ingestion and never stored in this loose form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    /// Product id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unnormalized price.
    pub price: PriceInput,
    /// Display image, if any.
    #[serde(default, alias = "primary_image")]
    pub image: Option<ProductImage>,
}

impl ProductInput {
    /// Build an input with no image.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: impl Into<PriceInput>) -> Self {
        Self {
            id,
            name: name.into(),
            price: price.into(),
            image: None,
        }
    }

    /// Attach a display image.
    #[must_use]
    pub fn with_image(mut self, image: ProductImage) -> Self {
        self.image = Some(image);
        self
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One product and its quantity in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Normalized, non-negative unit price.
    #[serde(alias = "price", default, deserialize_with = "stored_unit_price")]
    pub unit_price: Decimal,
    /// Display image. Not used for any cart logic.
    #[serde(default, alias = "primary_image")]
    pub image: Option<ProductImage>,
    /// Number of units, at least 1.
    pub quantity: u32,
}

impl LineItem {
    fn from_input(input: ProductInput) -> Self {
        Self {
            unit_price: normalize_price(&input.price),
            id: input.id,
            name: input.name,
            image: input.image,
            quantity: 1,
        }
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Read a stored unit price. Null or unreadable prices load as zero so one
/// bad line does not discard the rest of the snapshot.
fn stored_unit_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<PriceInput>::deserialize(deserializer)?;
    Ok(match raw {
        None => Decimal::ZERO,
        Some(PriceInput::Text(text)) => text
            .trim()
            .parse::<Decimal>()
            .unwrap_or_else(|_| normalize_price(&PriceInput::Text(text))),
        Some(amount) => normalize_price(&amount),
    })
}

/// Ordered collection of line items.
///
/// Serialized as a plain JSON array of line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Iterate over line items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `unit_price * quantity` over all lines; zero when empty.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .fold(Decimal::ZERO, |sum, item| sum.saturating_add(item.line_total()))
    }

    /// Total in the store currency, for display.
    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::new(self.total(), CurrencyCode::default())
    }

    /// Restore the invariants on a snapshot read back from storage.
    ///
    /// Duplicate ids are merged into the first occurrence, zero-quantity
    /// lines are dropped and negative prices are clamped to zero.
    fn sanitized(self) -> Self {
        let mut items: Vec<LineItem> = Vec::with_capacity(self.items.len());
        for mut item in self.items {
            if item.quantity == 0 {
                continue;
            }
            if item.unit_price.is_sign_negative() {
                item.unit_price = Decimal::ZERO;
            }
            match items.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => items.push(item),
            }
        }
        Self { items }
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// =============================================================================
// CartManager
// =============================================================================

/// Owns the session cart and keeps the persisted snapshot in sync.
///
/// All mutation goes through [`add_item`](Self::add_item),
/// [`remove_item`](Self::remove_item) and [`clear`](Self::clear). Each one
/// updates memory first and then persists; if persisting fails the in-memory
/// change stands and the error is returned.
#[derive(Debug)]
pub struct CartManager {
    store: PersistentStore,
    cart: Cart,
}

impl CartManager {
    /// Load the persisted cart, or start empty if it is absent or malformed.
    #[must_use]
    pub fn new(store: PersistentStore) -> Self {
        let cart = store
            .read::<Cart>(keys::CART)
            .map(Cart::sanitized)
            .unwrap_or_default();

        debug!(lines = cart.len(), "Cart loaded");
        Self { store, cart }
    }

    /// Add one unit of a product.
    ///
    /// A new product is appended with quantity 1. A product already in the
    /// cart has its quantity incremented; its stored name, price and image
    /// are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated cart cannot be persisted.
    pub fn add_item(&mut self, input: ProductInput) -> Result<(), StoreError> {
        let id = input.id;

        if let Some(existing) = self.cart.items.iter_mut().find(|item| item.id == id) {
            existing.quantity = existing.quantity.saturating_add(1);
            debug!(product_id = %id, quantity = existing.quantity, "Cart quantity incremented");
        } else {
            let item = LineItem::from_input(input);
            debug!(product_id = %id, unit_price = %item.unit_price, "Cart line added");
            self.cart.items.push(item);
        }

        add_breadcrumb("cart", "Added item", Some(&[("product_id", id.to_string().as_str())]));
        self.persist()
    }

    /// Remove the line for `id`. Removing an absent id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated cart cannot be persisted.
    pub fn remove_item(&mut self, id: ProductId) -> Result<(), StoreError> {
        let before = self.cart.items.len();
        self.cart.items.retain(|item| item.id != id);

        if self.cart.items.len() < before {
            debug!(product_id = %id, "Cart line removed");
            add_breadcrumb("cart", "Removed item", Some(&[("product_id", id.to_string().as_str())]));
        }

        self.persist()
    }

    /// Empty the cart and delete the persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored key cannot be deleted.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.cart.items.clear();
        info!("Cart cleared");
        add_breadcrumb("cart", "Cleared cart", None);
        self.store.clear(keys::CART)
    }

    /// Read-only view of the current cart.
    #[must_use]
    pub const fn snapshot(&self) -> &Cart {
        &self.cart
    }

    /// Sum of `unit_price * quantity`; zero for an empty cart.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.cart.total()
    }

    /// An empty cart is stored as an absent key, never as `[]`.
    fn persist(&self) -> Result<(), StoreError> {
        if self.cart.is_empty() {
            self.store.clear(keys::CART)
        } else {
            self.store.write(keys::CART, &self.cart)
        }
    }
}
