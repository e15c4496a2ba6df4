//! Placed orders and checkout.
//!
//! Orders are kept as a JSON list under [`keys::ORDERS`], oldest first.
//! Checkout snapshots the cart into a new [`Order`], appends it, then
//! empties the cart.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::info;

use nexus_core::{CurrencyCode, OrderNumber, OrderStatus, Price};

use crate::cart::{CartManager, LineItem};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::store::{PersistentStore, keys};

/// Message shown when checking out an empty cart.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty.";

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// `ORD` followed by six digits.
    pub id: OrderNumber,
    /// Calendar date the order was placed (UTC).
    pub date: NaiveDate,
    /// Cart total at checkout, rounded to cents.
    pub total: Decimal,
    /// Fulfillment status.
    #[serde(default)]
    pub status: OrderStatus,
    /// Line items as they were in the cart.
    #[serde(default)]
    pub products: Vec<LineItem>,
}

impl Order {
    /// Total as a displayable price.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::new(self.total, CurrencyCode::KES)
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.products.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

/// Persisted order list.
#[derive(Debug, Clone)]
pub struct OrderHistory {
    store: PersistentStore,
}

impl OrderHistory {
    /// Order history over `store`.
    #[must_use]
    pub const fn new(store: PersistentStore) -> Self {
        Self { store }
    }

    /// All orders, oldest first. Unreadable data reads as no orders.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.store.read(keys::ORDERS).unwrap_or_default()
    }

    /// Look up an order by number. Numbers can collide; the oldest match
    /// wins.
    #[must_use]
    pub fn get(&self, id: &OrderNumber) -> Option<Order> {
        self.orders().into_iter().find(|o| &o.id == id)
    }

    /// Check out the cart now.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the cart is empty, or a store error
    /// if the order or the emptied cart cannot be persisted.
    pub fn place_order(&self, cart: &mut CartManager) -> Result<Order> {
        self.place_order_at(cart, Utc::now())
    }

    /// Check out the cart at `now`.
    ///
    /// The order is recorded before the cart is cleared, so a failed order
    /// write leaves the cart untouched.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the cart is empty, or a store error
    /// if the order or the emptied cart cannot be persisted.
    pub fn place_order_at(&self, cart: &mut CartManager, now: DateTime<Utc>) -> Result<Order> {
        let snapshot = cart.snapshot();
        if snapshot.is_empty() {
            return Err(AppError::Validation(EMPTY_CART_MESSAGE.to_string()));
        }

        let order = Order {
            id: OrderNumber::from_timestamp(now),
            date: now.date_naive(),
            total: snapshot
                .total()
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            status: OrderStatus::Pending,
            products: snapshot.items().to_vec(),
        };

        let mut orders = self.orders();
        orders.push(order.clone());
        self.store.write(keys::ORDERS, &orders)?;

        cart.clear()?;

        info!(
            order_id = %order.id,
            total = %order.total,
            items = order.item_count(),
            "Order placed"
        );
        add_breadcrumb(
            "checkout",
            "Placed order",
            Some(&[("order_id", order.id.as_str())]),
        );

        Ok(order)
    }
}
