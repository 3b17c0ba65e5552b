//! crates/storefront_core/src/domain.rs
//!
//! Defines the pure, core data structures for the storefront.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ports::{PortError, PortResult};

/// A catalog product as seen through the Catalog Reader boundary.
///
/// The catalog component owns this data; the cart and order paths only
/// read it, never mutate it.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub available_stock: i32,
}

/// Lifecycle state of a cart. `Active` carts accept mutation and checkout;
/// `Ordered` carts are a frozen historical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    Active,
    Ordered,
}

impl CartStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CartStatus::Active => "active",
            CartStatus::Ordered => "ordered",
        }
    }

    pub fn parse(s: &str) -> PortResult<Self> {
        match s {
            "active" => Ok(CartStatus::Active),
            "ordered" => Ok(CartStatus::Ordered),
            other => Err(PortError::Unavailable(format!(
                "unknown cart status '{other}' in store"
            ))),
        }
    }
}

/// One shopping session. At most one cart per user is `Active` at a time.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One (cart, product) pair. Quantity is always >= 1; a line that would
/// reach zero is deleted instead.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A cart line joined with live catalog data for display.
#[derive(Debug, Clone)]
pub struct EnrichedLine {
    pub line_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub title: String,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
    pub available_stock: i32,
}

/// The full read view of a user's active cart. `cart_id` is `None` when the
/// user has no active cart, in which case `lines` is empty.
#[derive(Debug, Clone, Default)]
pub struct CartView {
    pub cart_id: Option<Uuid>,
    pub lines: Vec<EnrichedLine>,
}

impl CartView {
    /// Sum of `quantity * unit_price` over all lines, before discounts,
    /// tax, and shipping.
    pub fn subtotal(&self) -> Decimal {
        self.lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Fulfillment state of an order. Only `Pending` is ever written by
/// checkout; later transitions are driven by the payment and fulfillment
/// components, which are outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> PortResult<Self> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(PortError::Unavailable(format!(
                "unknown order status '{other}' in store"
            ))),
        }
    }
}

/// An order header. Immutable after creation except for `status`, which the
/// out-of-scope fulfillment processes advance.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub status: OrderStatus,
    pub shipping_info: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Frozen snapshot of one purchased line. Copied from the enriched cart
/// line at checkout time; later catalog changes never touch it.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_percent: Decimal,
}

/// An order together with its line snapshots, as the Order Reader returns it.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    pub order: Order,
    pub items: Vec<OrderLine>,
}

/// Caller-supplied checkout input. Totals are trusted as computed upstream;
/// this type only guarantees they are all present and non-negative before
/// any write happens.
#[derive(Debug, Clone)]
pub struct CheckoutDraft {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub shipping_info: serde_json::Value,
}

impl CheckoutDraft {
    /// Rejects the draft before any write occurs, naming every offending
    /// field in one message.
    pub fn validate(&self) -> PortResult<()> {
        let mut bad_fields = Vec::new();
        if self.subtotal < Decimal::ZERO {
            bad_fields.push("subtotal");
        }
        if self.tax < Decimal::ZERO {
            bad_fields.push("tax");
        }
        if self.shipping < Decimal::ZERO {
            bad_fields.push("shipping");
        }
        if self.total_amount < Decimal::ZERO {
            bad_fields.push("totalAmount");
        }
        if self.payment_method.trim().is_empty() {
            bad_fields.push("paymentMethod");
        }
        if self.shipping_info.is_null() {
            bad_fields.push("shippingInfo");
        }
        if bad_fields.is_empty() {
            Ok(())
        } else {
            Err(PortError::InvalidArgument(format!(
                "missing or invalid order fields: {}",
                bad_fields.join(", ")
            )))
        }
    }
}

/// One enriched wishlist entry.
#[derive(Debug, Clone)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub available_stock: i32,
}

/// What a wishlist toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistAction {
    Added,
    Removed,
}

impl WishlistAction {
    pub fn as_str(self) -> &'static str {
        match self {
            WishlistAction::Added => "added",
            WishlistAction::Removed => "removed",
        }
    }
}
