//! services/api/src/web/cart.rs
//!
//! Axum handlers for the cart endpoints. Every mutation responds with the
//! refreshed cart body so the client never needs a follow-up read.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storefront_core::domain::CartView;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::middleware::AuthedUser;
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The payload for adding a product to the cart.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddLineRequest {
    pub product_id: Uuid,
    /// Defaults to 1 when omitted.
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// The payload for setting a cart line's quantity.
#[derive(Deserialize, ToSchema)]
pub struct UpdateLineRequest {
    pub quantity: i32,
}

/// One cart line, enriched with live catalog data.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineBody {
    pub line_id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub discount_percentage: Decimal,
    pub quantity: i32,
    pub available_stock: i32,
}

/// The cart body every cart endpoint responds with.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_id: Option<Uuid>,
    pub items: Vec<CartLineBody>,
    pub subtotal: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CartResponse {
    fn from_view(view: CartView, message: Option<&str>) -> Self {
        let subtotal = view.subtotal();
        Self {
            success: true,
            cart_id: view.cart_id,
            items: view
                .lines
                .into_iter()
                .map(|line| CartLineBody {
                    line_id: line.line_id,
                    product_id: line.product_id,
                    title: line.title,
                    price: line.unit_price,
                    discount_percentage: line.discount_percent,
                    quantity: line.quantity,
                    available_stock: line.available_stock,
                })
                .collect(),
            subtotal,
            message: message.map(str::to_string),
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Read the authenticated user's active cart.
///
/// The path parameter is kept for wire compatibility; the authenticated
/// user is authoritative.
#[utoipa::path(
    get,
    path = "/api/cart/{id}",
    responses(
        (status = 200, description = "The enriched cart", body = CartResponse),
        (status = 401, description = "Not authenticated")
    ),
    params(
        ("id" = Uuid, Path, description = "The user whose cart to read.")
    ),
    tag = "cart"
)]
pub async fn get_cart_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(_id): Path<Uuid>,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state.cart.active_cart(user_id).await?;
    Ok(Json(CartResponse::from_view(view, None)))
}

/// Add a product to the active cart, creating the cart if needed.
///
/// Adding a product already in the cart merges into the existing line.
#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddLineRequest,
    responses(
        (status = 200, description = "The refreshed cart", body = CartResponse),
        (status = 400, description = "Quantity below 1"),
        (status = 404, description = "Product not found")
    ),
    tag = "cart"
)]
pub async fn add_to_cart_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Json(body): Json<AddLineRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    // Resolve the product up front so a dangling id reads as a 404 rather
    // than a store-level failure.
    state.catalog.lookup_product(body.product_id).await?;

    let view = state
        .cart
        .add_line(user_id, body.product_id, body.quantity)
        .await?;
    Ok(Json(CartResponse::from_view(
        view,
        Some("Product added to cart."),
    )))
}

/// Set a cart line's quantity. A value below 1 removes the line.
#[utoipa::path(
    put,
    path = "/api/cart/{id}",
    request_body = UpdateLineRequest,
    responses(
        (status = 200, description = "The refreshed cart", body = CartResponse),
        (status = 404, description = "Line not in the active cart")
    ),
    params(
        ("id" = Uuid, Path, description = "The cart line to update.")
    ),
    tag = "cart"
)]
pub async fn update_cart_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(line_id): Path<Uuid>,
    Json(body): Json<UpdateLineRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state
        .cart
        .update_line(user_id, line_id, body.quantity)
        .await?;
    Ok(Json(CartResponse::from_view(
        view,
        Some("Cart updated successfully."),
    )))
}

/// Remove a line from the active cart.
#[utoipa::path(
    delete,
    path = "/api/cart/{id}",
    responses(
        (status = 200, description = "The refreshed cart", body = CartResponse),
        (status = 404, description = "Line not in the active cart")
    ),
    params(
        ("id" = Uuid, Path, description = "The cart line to remove.")
    ),
    tag = "cart"
)]
pub async fn remove_from_cart_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(line_id): Path<Uuid>,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state.cart.remove_line(user_id, line_id).await?;
    Ok(Json(CartResponse::from_view(view, Some("Cart item removed."))))
}

/// Remove every line from the active cart.
#[utoipa::path(
    delete,
    path = "/api/cart/clear/all",
    responses(
        (status = 200, description = "The emptied cart", body = CartResponse)
    ),
    tag = "cart"
)]
pub async fn clear_cart_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state.cart.clear(user_id).await?;
    Ok(Json(CartResponse::from_view(view, Some("Cart cleared."))))
}
