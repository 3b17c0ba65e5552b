//! services/api/src/web/rest.rs
//!
//! Assembles the API router and holds the master definition for the
//! OpenAPI specification.

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::web::middleware::require_auth;
use crate::web::state::AppState;
use crate::web::{cart, orders, wishlist};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        cart::get_cart_handler,
        cart::add_to_cart_handler,
        cart::update_cart_handler,
        cart::remove_from_cart_handler,
        cart::clear_cart_handler,
        orders::checkout_handler,
        orders::list_orders_handler,
        orders::get_order_handler,
        wishlist::get_wishlist_handler,
        wishlist::toggle_wishlist_handler,
        wishlist::remove_wishlist_handler,
    ),
    components(
        schemas(
            cart::AddLineRequest,
            cart::UpdateLineRequest,
            cart::CartLineBody,
            cart::CartResponse,
            orders::CheckoutRequest,
            orders::CheckoutResponse,
            orders::OrderLineBody,
            orders::OrderBody,
            orders::OrdersListResponse,
            orders::OrderResponse,
            wishlist::ToggleWishlistRequest,
            wishlist::WishlistItemBody,
            wishlist::WishlistResponse,
            wishlist::ToggleWishlistResponse,
            wishlist::MessageResponse,
        )
    ),
    tags(
        (name = "cart", description = "The authenticated user's active cart."),
        (name = "orders", description = "Checkout and order history."),
        (name = "wishlist", description = "The authenticated user's wishlist.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router Assembly
//=========================================================================================

/// Builds the `/api` router with every route behind the auth middleware.
///
/// The binary layers CORS and the Swagger UI on top; tests drive this
/// router directly.
pub fn api_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route(
            "/cart/{id}",
            get(cart::get_cart_handler)
                .put(cart::update_cart_handler)
                .delete(cart::remove_from_cart_handler),
        )
        .route("/cart", post(cart::add_to_cart_handler))
        .route("/cart/clear/all", delete(cart::clear_cart_handler))
        .route(
            "/orders",
            post(orders::checkout_handler).get(orders::list_orders_handler),
        )
        .route("/orders/{id}", get(orders::get_order_handler))
        .route("/wishlist/user/{id}", get(wishlist::get_wishlist_handler))
        .route("/wishlist/toggle", post(wishlist::toggle_wishlist_handler))
        .route("/wishlist/{id}", delete(wishlist::remove_wishlist_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new().nest("/api", protected).with_state(state)
}
