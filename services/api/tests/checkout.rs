//! Integration tests for the checkout path: atomic cart-to-order
//! conversion, rollback behavior, and order history reads.

use api_lib::adapters::MemoryStore;
use rust_decimal_macros::dec;
use storefront_core::domain::{CheckoutDraft, OrderStatus, Product};
use storefront_core::ports::{CartStore, OrderReader, OrderWriter, PortError};
use uuid::Uuid;

fn store_with_two_products() -> (MemoryStore, Uuid, Uuid) {
    let store = MemoryStore::new();
    let keyboard = Uuid::new_v4();
    let mouse = Uuid::new_v4();
    store.insert_product(Product {
        id: keyboard,
        title: "Mechanical Keyboard".to_string(),
        price: dec!(89.99),
        discount_percent: dec!(10),
        available_stock: 25,
    });
    store.insert_product(Product {
        id: mouse,
        title: "Wireless Mouse".to_string(),
        price: dec!(35.00),
        discount_percent: dec!(0),
        available_stock: 40,
    });
    (store, keyboard, mouse)
}

fn draft() -> CheckoutDraft {
    CheckoutDraft {
        subtotal: dec!(100.00),
        tax: dec!(8.00),
        shipping: dec!(5.00),
        total_amount: dec!(113.00),
        payment_method: "card".to_string(),
        shipping_info: serde_json::json!({
            "name": "Sam Doe",
            "street": "12 Elm St",
            "city": "Springfield",
        }),
    }
}

#[tokio::test]
async fn checkout_snapshots_cart_and_retires_it() {
    let (store, keyboard, mouse) = store_with_two_products();
    let user = Uuid::new_v4();

    store.add_line(user, keyboard, 2).await.unwrap();
    store.add_line(user, mouse, 1).await.unwrap();

    let order_id = store.checkout(user, draft()).await.unwrap();

    // The cart slot is free again.
    let view = store.active_cart(user).await.unwrap();
    assert!(view.cart_id.is_none());

    // The order carries the full snapshot.
    let receipt = store.get_order(user, order_id).await.unwrap();
    assert_eq!(receipt.order.status, OrderStatus::Pending);
    assert_eq!(receipt.order.total_amount, dec!(113.00));
    assert_eq!(receipt.order.payment_method, "card");
    assert_eq!(receipt.items.len(), 2);

    let kb = receipt
        .items
        .iter()
        .find(|l| l.product_id == keyboard)
        .unwrap();
    assert_eq!(kb.quantity, 2);
    assert_eq!(kb.unit_price, dec!(89.99));
    assert_eq!(kb.title, "Mechanical Keyboard");
    assert_eq!(kb.discount_percent, dec!(10));
}

#[tokio::test]
async fn checkout_without_cart_is_rejected() {
    let (store, _, _) = store_with_two_products();
    let user = Uuid::new_v4();

    let err = store.checkout(user, draft()).await.unwrap_err();
    assert!(matches!(err, PortError::EmptyCart));
}

#[tokio::test]
async fn checkout_of_cleared_cart_is_rejected() {
    let (store, keyboard, _) = store_with_two_products();
    let user = Uuid::new_v4();

    store.add_line(user, keyboard, 1).await.unwrap();
    store.clear(user).await.unwrap();

    let err = store.checkout(user, draft()).await.unwrap_err();
    assert!(matches!(err, PortError::EmptyCart));
    assert!(store.list_orders(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_draft_writes_nothing() {
    let (store, keyboard, _) = store_with_two_products();
    let user = Uuid::new_v4();

    store.add_line(user, keyboard, 1).await.unwrap();

    let mut bad = draft();
    bad.total_amount = dec!(-5);
    let err = store.checkout(user, bad).await.unwrap_err();
    assert!(matches!(err, PortError::InvalidArgument(_)));

    // The cart survived and no order exists.
    let view = store.active_cart(user).await.unwrap();
    assert_eq!(view.lines.len(), 1);
    assert!(store.list_orders(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn store_failure_rolls_the_whole_checkout_back() {
    let (store, keyboard, mouse) = store_with_two_products();
    let user = Uuid::new_v4();

    store.add_line(user, keyboard, 2).await.unwrap();
    store.add_line(user, mouse, 1).await.unwrap();

    store.fail_next_checkout();
    let err = store.checkout(user, draft()).await.unwrap_err();
    assert!(matches!(err, PortError::Unavailable(_)));

    // All-or-nothing: the cart is untouched and no order was written.
    let view = store.active_cart(user).await.unwrap();
    assert_eq!(view.lines.len(), 2);
    assert!(store.list_orders(user).await.unwrap().is_empty());

    // The retry succeeds with the same cart.
    let order_id = store.checkout(user, draft()).await.unwrap();
    let receipt = store.get_order(user, order_id).await.unwrap();
    assert_eq!(receipt.items.len(), 2);
    assert!(store.active_cart(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_checkouts_produce_exactly_one_order() {
    let (store, keyboard, _) = store_with_two_products();
    let user = Uuid::new_v4();

    store.add_line(user, keyboard, 1).await.unwrap();

    let (a, b) = tokio::join!(
        store.checkout(user, draft()),
        store.checkout(user, draft())
    );

    let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(oks, 1, "exactly one checkout may win");
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(
        loser.unwrap_err(),
        PortError::EmptyCart | PortError::Conflict(_)
    ));

    assert_eq!(store.list_orders(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn cart_edits_cannot_straddle_a_checkout() {
    let (store, keyboard, _) = store_with_two_products();
    let user = Uuid::new_v4();

    let view = store.add_line(user, keyboard, 2).await.unwrap();
    let line_id = view.lines[0].line_id;

    let (edit, checked_out) = tokio::join!(
        store.update_line(user, line_id, 5),
        store.checkout(user, draft())
    );

    let order_id = checked_out.expect("a populated cart must check out");
    let receipt = store.get_order(user, order_id).await.unwrap();

    match edit {
        // The edit landed before the snapshot, so the order carries it.
        Ok(view) => {
            assert_eq!(view.lines[0].quantity, 5);
            assert_eq!(receipt.items[0].quantity, 5);
        }
        // The checkout won and retired the cart before the edit.
        Err(PortError::NotFound(_)) => assert_eq!(receipt.items[0].quantity, 2),
        Err(other) => panic!("unexpected edit outcome: {other:?}"),
    }

    // The retired cart rejects further edits either way.
    let err = store.update_line(user, line_id, 9).await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
}

#[tokio::test]
async fn order_snapshot_survives_catalog_changes() {
    let (store, keyboard, _) = store_with_two_products();
    let user = Uuid::new_v4();

    store.add_line(user, keyboard, 1).await.unwrap();
    let order_id = store.checkout(user, draft()).await.unwrap();

    // Reprice the product after the sale.
    store.insert_product(Product {
        id: keyboard,
        title: "Mechanical Keyboard (v2)".to_string(),
        price: dec!(129.99),
        discount_percent: dec!(0),
        available_stock: 5,
    });

    let receipt = store.get_order(user, order_id).await.unwrap();
    assert_eq!(receipt.items[0].unit_price, dec!(89.99));
    assert_eq!(receipt.items[0].title, "Mechanical Keyboard");

    // A new cart, by contrast, sees the live price.
    let view = store.add_line(user, keyboard, 1).await.unwrap();
    assert_eq!(view.lines[0].unit_price, dec!(129.99));
}

#[tokio::test]
async fn full_shopping_scenario_checks_out_the_edited_cart() {
    let (store, keyboard, mouse) = store_with_two_products();
    let user = Uuid::new_v4();

    // Add two units of A and one of B, grow B to 3, drop A.
    store.add_line(user, keyboard, 2).await.unwrap();
    let view = store.add_line(user, mouse, 1).await.unwrap();
    let mouse_line = view
        .lines
        .iter()
        .find(|l| l.product_id == mouse)
        .unwrap()
        .line_id;
    let keyboard_line = view
        .lines
        .iter()
        .find(|l| l.product_id == keyboard)
        .unwrap()
        .line_id;

    store.update_line(user, mouse_line, 3).await.unwrap();
    store.remove_line(user, keyboard_line).await.unwrap();

    let order_id = store.checkout(user, draft()).await.unwrap();
    let receipt = store.get_order(user, order_id).await.unwrap();
    assert_eq!(receipt.items.len(), 1);
    assert_eq!(receipt.items[0].product_id, mouse);
    assert_eq!(receipt.items[0].quantity, 3);

    // The next shopping session starts from a clean slate.
    let view = store.active_cart(user).await.unwrap();
    assert!(view.cart_id.is_none());
    let view = store.add_line(user, keyboard, 1).await.unwrap();
    assert_eq!(view.lines.len(), 1);
}

#[tokio::test]
async fn orders_list_newest_first_and_stay_private() {
    let (store, keyboard, mouse) = store_with_two_products();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    store.add_line(alice, keyboard, 1).await.unwrap();
    let first = store.checkout(alice, draft()).await.unwrap();
    store.add_line(alice, mouse, 2).await.unwrap();
    let second = store.checkout(alice, draft()).await.unwrap();

    let receipts = store.list_orders(alice).await.unwrap();
    assert_eq!(receipts.len(), 2);
    assert_eq!(receipts[0].order.id, second, "newest first");
    assert_eq!(receipts[1].order.id, first);

    // Another user sees nothing, and cannot read the order directly.
    assert!(store.list_orders(bob).await.unwrap().is_empty());
    let err = store.get_order(bob, first).await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
}
