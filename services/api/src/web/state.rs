//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use storefront_core::ports::{
    CartStore, CatalogReader, IdentityService, OrderReader, OrderWriter, WishlistStore,
};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Each field is one port; in production they all point at the same
/// PostgreSQL-backed adapters, while tests swap in the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<dyn CatalogReader>,
    pub cart: Arc<dyn CartStore>,
    pub order_writer: Arc<dyn OrderWriter>,
    pub order_reader: Arc<dyn OrderReader>,
    pub wishlist: Arc<dyn WishlistStore>,
    pub identity: Arc<dyn IdentityService>,
}
