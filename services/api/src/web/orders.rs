//! services/api/src/web/orders.rs
//!
//! Axum handlers for checkout and order history.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storefront_core::domain::{CheckoutDraft, OrderReceipt};
use storefront_core::ports::{PortError, PortResult};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::middleware::AuthedUser;
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The checkout payload. Every field is required; absent fields are
/// reported together rather than one at a time.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub shipping_info: Option<serde_json::Value>,
}

impl CheckoutRequest {
    fn into_draft(self) -> PortResult<CheckoutDraft> {
        let mut missing = Vec::new();
        if self.subtotal.is_none() {
            missing.push("subtotal");
        }
        if self.tax.is_none() {
            missing.push("tax");
        }
        if self.shipping.is_none() {
            missing.push("shipping");
        }
        if self.total_amount.is_none() {
            missing.push("totalAmount");
        }
        if self.payment_method.is_none() {
            missing.push("paymentMethod");
        }
        if self.shipping_info.is_none() {
            missing.push("shippingInfo");
        }

        if let (
            Some(subtotal),
            Some(tax),
            Some(shipping),
            Some(total_amount),
            Some(payment_method),
            Some(shipping_info),
        ) = (
            self.subtotal,
            self.tax,
            self.shipping,
            self.total_amount,
            self.payment_method,
            self.shipping_info,
        ) {
            Ok(CheckoutDraft {
                subtotal,
                tax,
                shipping,
                total_amount,
                payment_method,
                shipping_info,
            })
        } else {
            Err(PortError::InvalidArgument(format!(
                "Missing required order fields: {}",
                missing.join(", ")
            )))
        }
    }
}

/// The response payload sent after a successful checkout.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub order_id: Uuid,
    pub message: String,
}

/// One purchased line, as snapshotted at checkout time.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineBody {
    pub id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub quantity: i32,
    pub price: Decimal,
    pub discount_percentage: Decimal,
}

/// One order with its line snapshots.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub status: String,
    pub shipping_info: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineBody>,
}

impl OrderBody {
    fn from_receipt(receipt: OrderReceipt) -> Self {
        let OrderReceipt { order, items } = receipt;
        Self {
            id: order.id,
            user_id: order.user_id,
            subtotal: order.subtotal,
            tax: order.tax,
            shipping: order.shipping,
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            status: order.status.as_str().to_string(),
            shipping_info: order.shipping_info,
            created_at: order.created_at,
            items: items
                .into_iter()
                .map(|line| OrderLineBody {
                    id: line.id,
                    product_id: line.product_id,
                    title: line.title,
                    quantity: line.quantity,
                    price: line.unit_price,
                    discount_percentage: line.discount_percent,
                })
                .collect(),
        }
    }
}

/// The response payload for the order listing.
#[derive(Serialize, ToSchema)]
pub struct OrdersListResponse {
    pub success: bool,
    pub data: Vec<OrderBody>,
}

/// The response payload for a single order.
#[derive(Serialize, ToSchema)]
pub struct OrderResponse {
    pub success: bool,
    pub data: OrderBody,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Convert the active cart into an order.
///
/// The conversion is atomic: on any failure the cart is left untouched and
/// no order exists.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created", body = CheckoutResponse),
        (status = 400, description = "Cart empty or fields missing/invalid"),
        (status = 409, description = "A concurrent checkout won"),
        (status = 503, description = "Store failure, safe to retry")
    ),
    tag = "orders"
)]
pub async fn checkout_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let draft = body.into_draft().map_err(ApiError::Port)?;
    let order_id = state.order_writer.checkout(user_id, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            success: true,
            order_id,
            message: "Order created successfully".to_string(),
        }),
    ))
}

/// List the authenticated user's orders, newest first.
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "The user's orders", body = OrdersListResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<OrdersListResponse>, ApiError> {
    let receipts = state.order_reader.list_orders(user_id).await?;
    Ok(Json(OrdersListResponse {
        success: true,
        data: receipts.into_iter().map(OrderBody::from_receipt).collect(),
    }))
}

/// Read one of the authenticated user's orders.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    responses(
        (status = 200, description = "The order", body = OrderResponse),
        (status = 404, description = "No such order for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "The order to read.")
    ),
    tag = "orders"
)]
pub async fn get_order_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let receipt = state.order_reader.get_order(user_id, order_id).await?;
    Ok(Json(OrderResponse {
        success: true,
        data: OrderBody::from_receipt(receipt),
    }))
}
