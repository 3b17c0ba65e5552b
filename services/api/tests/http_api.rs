//! Handler-level tests: the assembled router driven through `oneshot`,
//! with the in-memory store behind every port.

use std::sync::Arc;
use std::time::Duration;

use api_lib::adapters::MemoryStore;
use api_lib::config::Config;
use api_lib::web::{api_router, state::AppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use storefront_core::domain::Product;
use tower::ServiceExt;
use uuid::Uuid;

const TOKEN: &str = "test-session-token";

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        cors_origin: "http://localhost:3000".to_string(),
        db_max_connections: 1,
        checkout_timeout: Duration::from_secs(5),
    }
}

/// Builds a router over one shared in-memory store, with a session already
/// issued for the returned user.
fn test_app() -> (Router, MemoryStore, Uuid) {
    let store = MemoryStore::new();
    let user = Uuid::new_v4();
    store.insert_session(TOKEN, user);

    let ports = Arc::new(store.clone());
    let state = Arc::new(AppState {
        config: Arc::new(test_config()),
        catalog: ports.clone(),
        cart: ports.clone(),
        order_writer: ports.clone(),
        order_reader: ports.clone(),
        wishlist: ports.clone(),
        identity: ports,
    });
    (api_router(state), store, user)
}

fn seed_product(store: &MemoryStore) -> Uuid {
    let product_id = Uuid::new_v4();
    store.insert_product(Product {
        id: product_id,
        title: "Mechanical Keyboard".to_string(),
        price: dec!(89.99),
        discount_percent: dec!(10),
        available_stock: 25,
    });
    product_id
}

fn authed(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("session={}", TOKEN))
}

fn with_json(builder: axum::http::request::Builder, body: Value) -> Request<Body> {
    builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

//=========================================================================================
// Authentication
//=========================================================================================

#[tokio::test]
async fn requests_without_a_session_are_rejected() {
    let (app, _, user) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/cart/{}", user))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Unauthorized"));
}

#[tokio::test]
async fn unknown_tokens_are_rejected() {
    let (app, _, user) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/cart/{}", user))
                .header(header::COOKIE, "session=not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bearer_tokens_are_accepted_as_fallback() {
    let (app, _, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/orders")
                .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"], json!([]));
}

//=========================================================================================
// Cart Routes
//=========================================================================================

#[tokio::test]
async fn add_and_read_cart_over_http() {
    let (app, store, user) = test_app();
    let product_id = seed_product(&store);

    let response = app
        .clone()
        .oneshot(with_json(
            authed(Method::POST, "/api/cart"),
            json!({ "productId": product_id, "quantity": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Product added to cart."));
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["quantity"], json!(2));
    assert_eq!(body["items"][0]["price"], json!("89.99"));
    assert_eq!(body["items"][0]["title"], json!("Mechanical Keyboard"));
    assert_eq!(body["subtotal"], json!("179.98"));

    // The read endpoint reports the same cart, without a message.
    let response = app
        .oneshot(
            authed(Method::GET, &format!("/api/cart/{}", user))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn add_defaults_the_quantity_to_one() {
    let (app, store, _) = test_app();
    let product_id = seed_product(&store);

    let response = app
        .oneshot(with_json(
            authed(Method::POST, "/api/cart"),
            json!({ "productId": product_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["items"][0]["quantity"], json!(1));
}

#[tokio::test]
async fn adding_an_unknown_product_is_a_404() {
    let (app, _, _) = test_app();

    let response = app
        .oneshot(with_json(
            authed(Method::POST, "/api/cart"),
            json!({ "productId": Uuid::new_v4() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn zero_quantity_update_removes_the_line() {
    let (app, store, _) = test_app();
    let product_id = seed_product(&store);

    let response = app
        .clone()
        .oneshot(with_json(
            authed(Method::POST, "/api/cart"),
            json!({ "productId": product_id, "quantity": 3 }),
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    let line_id = body["items"][0]["lineId"].as_str().unwrap().to_string();

    let response = app
        .oneshot(with_json(
            authed(Method::PUT, &format!("/api/cart/{}", line_id)),
            json!({ "quantity": 0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], json!("Cart updated successfully."));
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn removing_a_line_twice_is_a_404() {
    let (app, store, _) = test_app();
    let product_id = seed_product(&store);

    let response = app
        .clone()
        .oneshot(with_json(
            authed(Method::POST, "/api/cart"),
            json!({ "productId": product_id }),
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    let line_id = body["items"][0]["lineId"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            authed(Method::DELETE, &format!("/api/cart/{}", line_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], json!("Cart item removed."));

    let response = app
        .oneshot(
            authed(Method::DELETE, &format!("/api/cart/{}", line_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clear_route_empties_the_cart() {
    let (app, store, _) = test_app();
    let product_id = seed_product(&store);

    app.clone()
        .oneshot(with_json(
            authed(Method::POST, "/api/cart"),
            json!({ "productId": product_id, "quantity": 5 }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(
            authed(Method::DELETE, "/api/cart/clear/all")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], json!("Cart cleared."));
    assert_eq!(body["items"], json!([]));
}

//=========================================================================================
// Order Routes
//=========================================================================================

fn checkout_body() -> Value {
    json!({
        "subtotal": "179.98",
        "tax": "14.40",
        "shipping": "0",
        "totalAmount": "194.38",
        "paymentMethod": "card",
        "shippingInfo": { "name": "Sam Doe", "city": "Springfield" },
    })
}

#[tokio::test]
async fn checkout_and_order_history_over_http() {
    let (app, store, user) = test_app();
    let product_id = seed_product(&store);

    app.clone()
        .oneshot(with_json(
            authed(Method::POST, "/api/cart"),
            json!({ "productId": product_id, "quantity": 2 }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(with_json(
            authed(Method::POST, "/api/orders"),
            checkout_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Order created successfully"));
    let order_id = body["orderId"].as_str().unwrap().to_string();

    // The listing embeds the snapshot lines.
    let response = app
        .clone()
        .oneshot(
            authed(Method::GET, "/api/orders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], json!(order_id));
    assert_eq!(body["data"][0]["status"], json!("pending"));
    assert_eq!(body["data"][0]["totalAmount"], json!("194.38"));
    assert_eq!(body["data"][0]["shippingInfo"]["city"], json!("Springfield"));
    assert_eq!(body["data"][0]["items"][0]["price"], json!("89.99"));
    assert_eq!(body["data"][0]["items"][0]["quantity"], json!(2));

    // The single-order read returns the same receipt.
    let response = app
        .clone()
        .oneshot(
            authed(Method::GET, &format!("/api/orders/{}", order_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["id"], json!(order_id));

    // And the cart is empty again.
    let response = app
        .oneshot(
            authed(Method::GET, &format!("/api/cart/{}", user))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn checkout_with_an_empty_cart_is_a_400() {
    let (app, _, _) = test_app();

    let response = app
        .oneshot(with_json(
            authed(Method::POST, "/api/orders"),
            checkout_body(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Cart is empty"));
}

#[tokio::test]
async fn checkout_names_every_missing_field() {
    let (app, store, _) = test_app();
    let product_id = seed_product(&store);

    app.clone()
        .oneshot(with_json(
            authed(Method::POST, "/api/cart"),
            json!({ "productId": product_id }),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(with_json(
            authed(Method::POST, "/api/orders"),
            json!({ "tax": "1.00" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Missing required order fields:"));
    for field in ["subtotal", "shipping", "totalAmount", "paymentMethod", "shippingInfo"] {
        assert!(message.contains(field), "missing {field} in: {message}");
    }
    assert!(!message.contains("tax"), "tax was provided: {message}");
}

#[tokio::test]
async fn foreign_orders_read_as_404() {
    let (app, store, _) = test_app();
    let product_id = seed_product(&store);

    app.clone()
        .oneshot(with_json(
            authed(Method::POST, "/api/cart"),
            json!({ "productId": product_id }),
        ))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(with_json(
            authed(Method::POST, "/api/orders"),
            checkout_body(),
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    let order_id = body["orderId"].as_str().unwrap().to_string();

    // A different session cannot see the order.
    let other_user = Uuid::new_v4();
    store.insert_session("other-token", other_user);
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/orders/{}", order_id))
                .header(header::COOKIE, "session=other-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

//=========================================================================================
// Wishlist Routes
//=========================================================================================

#[tokio::test]
async fn wishlist_toggle_list_and_remove_over_http() {
    let (app, store, user) = test_app();
    let product_id = seed_product(&store);

    // First toggle adds.
    let response = app
        .clone()
        .oneshot(with_json(
            authed(Method::POST, "/api/wishlist/toggle"),
            json!({ "productId": product_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["action"], json!("added"));
    assert_eq!(body["message"], json!("Added to wishlist"));

    // The listing carries the enriched entry.
    let response = app
        .clone()
        .oneshot(
            authed(Method::GET, &format!("/api/wishlist/user/{}", user))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["title"], json!("Mechanical Keyboard"));
    let entry_id = body["data"][0]["wishlistId"].as_str().unwrap().to_string();

    // Removal by entry id; a second attempt is a 404.
    let response = app
        .clone()
        .oneshot(
            authed(Method::DELETE, &format!("/api/wishlist/{}", entry_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], json!("Removed from wishlist"));

    let response = app
        .oneshot(
            authed(Method::DELETE, &format!("/api/wishlist/{}", entry_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_toggle_removes_the_product() {
    let (app, store, _) = test_app();
    let product_id = seed_product(&store);

    for expected in ["added", "removed"] {
        let response = app
            .clone()
            .oneshot(with_json(
                authed(Method::POST, "/api/wishlist/toggle"),
                json!({ "productId": product_id }),
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["action"], json!(expected));
    }
}
