pub mod cart;
pub mod middleware;
pub mod orders;
pub mod rest;
pub mod state;
pub mod wishlist;

// Re-export the router assembly to make it easily accessible to the
// binary that builds the web server.
pub use middleware::require_auth;
pub use rest::{api_router, ApiDoc};
