//! crates/storefront_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the storefront's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    CartView, CheckoutDraft, OrderReceipt, Product, WishlistAction, WishlistEntry,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy every port operation reports in.
///
/// `InvalidArgument`, `NotFound`, and `EmptyCart` are caller errors and are
/// never retried; `Conflict` means a concurrent checkout won the race and the
/// caller may re-read and retry; `Unavailable` means the backing store failed
/// before anything was committed, so the whole operation is safe to retry.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("cart is empty")]
    EmptyCart,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("backing store unavailable: {0}")]
    Unavailable(String),
    #[error("unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read-only product lookup. Owned by the catalog component; the cart path
/// consults it to resolve product ids and never writes through it.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Resolves a product id to its current display data, or `NotFound`.
    async fn lookup_product(&self, product_id: Uuid) -> PortResult<Product>;
}

/// Maintains the single active cart per user and its lines.
///
/// Every operation returns the refreshed enriched view so callers can render
/// the cart without a second round trip.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The enriched view of the user's active cart; an empty view when no
    /// active cart exists. Read-only.
    async fn active_cart(&self, user_id: Uuid) -> PortResult<CartView>;

    /// Adds `quantity` of a product, creating the active cart lazily and
    /// merging into an existing line for the same product (the line keeps
    /// its id). `InvalidArgument` if `quantity < 1`, `NotFound` if the
    /// product does not resolve.
    async fn add_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> PortResult<CartView>;

    /// Sets a line's quantity to an absolute value; a value <= 0 deletes the
    /// line. `NotFound` if the line is not in the caller's active cart.
    async fn update_line(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> PortResult<CartView>;

    /// Deletes a line from the caller's active cart. A repeat call reports
    /// `NotFound`.
    async fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> PortResult<CartView>;

    /// Deletes all lines of the active cart without changing its status.
    /// Used by abandonment flows only; checkout retires the cart instead.
    async fn clear(&self, user_id: Uuid) -> PortResult<CartView>;
}

/// The sole path by which an active cart becomes an order.
#[async_trait]
pub trait OrderWriter: Send + Sync {
    /// Atomically snapshots the caller's active cart into a new order and
    /// retires the cart to `ordered`. Returns the new order's id.
    ///
    /// Fails with `EmptyCart` when there is no active cart or it has no
    /// lines, `InvalidArgument` when the draft is incomplete, and `Conflict`
    /// when a concurrent checkout wins the race; any failure rolls the whole
    /// transition back, leaving the cart exactly as it was.
    async fn checkout(&self, user_id: Uuid, draft: CheckoutDraft) -> PortResult<Uuid>;
}

/// Read-only order history. Never touches the cart tables.
#[async_trait]
pub trait OrderReader: Send + Sync {
    /// All of the user's orders, newest first, each with its line snapshots.
    async fn list_orders(&self, user_id: Uuid) -> PortResult<Vec<OrderReceipt>>;

    /// One order with its lines. `NotFound` when the order does not exist
    /// or belongs to someone else; the two cases are indistinguishable to
    /// the caller.
    async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> PortResult<OrderReceipt>;
}

/// Per-user wishlist with toggle semantics.
#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// The user's wishlist, enriched with current catalog data.
    async fn wishlist(&self, user_id: Uuid) -> PortResult<Vec<WishlistEntry>>;

    /// Adds the product when absent, removes it when present. `NotFound` if
    /// the product does not resolve.
    async fn toggle(&self, user_id: Uuid, product_id: Uuid) -> PortResult<WishlistAction>;

    /// Removes an entry by its id. `NotFound` if it is not the caller's.
    async fn remove(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()>;
}

/// Maps an already-issued session token to a user id. Session issuance
/// belongs to the auth component; this service only resolves.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// `Unauthorized` for unknown or expired tokens.
    async fn resolve_session(&self, token: &str) -> PortResult<Uuid>;
}
