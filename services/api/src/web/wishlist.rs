//! services/api/src/web/wishlist.rs
//!
//! Axum handlers for the wishlist endpoints.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storefront_core::domain::WishlistAction;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::middleware::AuthedUser;
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The payload for toggling a product on the wishlist.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleWishlistRequest {
    pub product_id: Uuid,
}

/// One wishlist entry, enriched with live catalog data.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItemBody {
    pub wishlist_id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub discount_percentage: Decimal,
    pub available_stock: i32,
}

/// The response payload for the wishlist listing.
#[derive(Serialize, ToSchema)]
pub struct WishlistResponse {
    pub success: bool,
    pub data: Vec<WishlistItemBody>,
}

/// The response payload for a wishlist toggle.
#[derive(Serialize, ToSchema)]
pub struct ToggleWishlistResponse {
    pub success: bool,
    pub message: String,
    pub action: String,
}

/// A bare success acknowledgement.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Read the authenticated user's wishlist.
///
/// The path parameter is kept for wire compatibility; the authenticated
/// user is authoritative.
#[utoipa::path(
    get,
    path = "/api/wishlist/user/{id}",
    responses(
        (status = 200, description = "The wishlist", body = WishlistResponse),
        (status = 401, description = "Not authenticated")
    ),
    params(
        ("id" = Uuid, Path, description = "The user whose wishlist to read.")
    ),
    tag = "wishlist"
)]
pub async fn get_wishlist_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(_id): Path<Uuid>,
) -> Result<Json<WishlistResponse>, ApiError> {
    let entries = state.wishlist.wishlist(user_id).await?;
    Ok(Json(WishlistResponse {
        success: true,
        data: entries
            .into_iter()
            .map(|entry| WishlistItemBody {
                wishlist_id: entry.id,
                product_id: entry.product_id,
                title: entry.title,
                price: entry.price,
                discount_percentage: entry.discount_percent,
                available_stock: entry.available_stock,
            })
            .collect(),
    }))
}

/// Toggle a product on the wishlist: absent adds it, present removes it.
#[utoipa::path(
    post,
    path = "/api/wishlist/toggle",
    request_body = ToggleWishlistRequest,
    responses(
        (status = 200, description = "What the toggle did", body = ToggleWishlistResponse),
        (status = 404, description = "Product not found")
    ),
    tag = "wishlist"
)]
pub async fn toggle_wishlist_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Json(body): Json<ToggleWishlistRequest>,
) -> Result<Json<ToggleWishlistResponse>, ApiError> {
    state.catalog.lookup_product(body.product_id).await?;

    let action = state.wishlist.toggle(user_id, body.product_id).await?;
    let message = match action {
        WishlistAction::Added => "Added to wishlist",
        WishlistAction::Removed => "Removed from wishlist",
    };
    Ok(Json(ToggleWishlistResponse {
        success: true,
        message: message.to_string(),
        action: action.as_str().to_string(),
    }))
}

/// Remove a wishlist entry by its id.
#[utoipa::path(
    delete,
    path = "/api/wishlist/{id}",
    responses(
        (status = 200, description = "Entry removed", body = MessageResponse),
        (status = 404, description = "Entry not found for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "The wishlist entry to remove.")
    ),
    tag = "wishlist"
)]
pub async fn remove_wishlist_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.wishlist.remove(user_id, entry_id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Removed from wishlist".to_string(),
    }))
}
