pub mod domain;
pub mod ports;

pub use domain::{
    Cart, CartLine, CartStatus, CartView, CheckoutDraft, EnrichedLine, Order, OrderLine,
    OrderReceipt, OrderStatus, Product, WishlistAction, WishlistEntry,
};
pub use ports::{
    CartStore, CatalogReader, IdentityService, OrderReader, OrderWriter, PortError, PortResult,
    WishlistStore,
};
