//! services/api/src/adapters/memory.rs
//!
//! In-memory implementations of every port, for use in unit and
//! integration tests. State is shared across clones, so the same store can
//! back several ports of one `AppState` at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use storefront_core::domain::{
    Cart, CartLine, CartStatus, CartView, CheckoutDraft, EnrichedLine, Order, OrderLine,
    OrderReceipt, OrderStatus, Product, WishlistAction, WishlistEntry,
};
use storefront_core::ports::{
    CartStore, CatalogReader, IdentityService, OrderReader, OrderWriter, PortError, PortResult,
    WishlistStore,
};
use uuid::Uuid;

struct WishlistRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
}

#[derive(Default)]
struct MemoryState {
    products: HashMap<Uuid, Product>,
    carts: HashMap<Uuid, Cart>,
    cart_lines: Vec<CartLine>,
    orders: Vec<Order>,
    order_lines: Vec<OrderLine>,
    sessions: HashMap<String, Uuid>,
    wishlist: Vec<WishlistRow>,
}

impl MemoryState {
    fn active_cart_id(&self, user_id: Uuid) -> Option<Uuid> {
        self.carts
            .values()
            .find(|c| c.user_id == user_id && c.status == CartStatus::Active)
            .map(|c| c.id)
    }

    fn view_for(&self, cart_id: Uuid) -> PortResult<CartView> {
        let mut lines = Vec::new();
        for line in self.cart_lines.iter().filter(|l| l.cart_id == cart_id) {
            let product = self.products.get(&line.product_id).ok_or_else(|| {
                PortError::Unavailable(format!("product {} missing from catalog", line.product_id))
            })?;
            lines.push(EnrichedLine {
                line_id: line.id,
                product_id: line.product_id,
                quantity: line.quantity,
                title: product.title.clone(),
                unit_price: product.price,
                discount_percent: product.discount_percent,
                available_stock: product.available_stock,
            });
        }
        Ok(CartView {
            cart_id: Some(cart_id),
            lines,
        })
    }

    fn active_view(&self, user_id: Uuid) -> PortResult<CartView> {
        match self.active_cart_id(user_id) {
            Some(cart_id) => self.view_for(cart_id),
            None => Ok(CartView::default()),
        }
    }
}

/// An in-memory store implementing every port at once.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_next_checkout: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a catalog product.
    pub fn insert_product(&self, product: Product) {
        let mut state = self.state.lock().unwrap();
        state.products.insert(product.id, product);
    }

    /// Seeds a resolvable session token.
    pub fn insert_session(&self, token: &str, user_id: Uuid) {
        let mut state = self.state.lock().unwrap();
        state.sessions.insert(token.to_string(), user_id);
    }

    /// Arms the fault hook: the next checkout fails after inserting the
    /// order but before the cart is retired, and the error path undoes the
    /// insert, as a mid-transaction store failure and rollback would.
    pub fn fail_next_checkout(&self) {
        self.fail_next_checkout.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogReader for MemoryStore {
    async fn lookup_product(&self, product_id: Uuid) -> PortResult<Product> {
        let state = self.state.lock().unwrap();
        state
            .products
            .get(&product_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Product {} not found", product_id)))
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn active_cart(&self, user_id: Uuid) -> PortResult<CartView> {
        let state = self.state.lock().unwrap();
        state.active_view(user_id)
    }

    async fn add_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> PortResult<CartView> {
        if quantity < 1 {
            return Err(PortError::InvalidArgument(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let mut state = self.state.lock().unwrap();
        if !state.products.contains_key(&product_id) {
            return Err(PortError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        let cart_id = match state.active_cart_id(user_id) {
            Some(id) => id,
            None => {
                let cart = Cart {
                    id: Uuid::new_v4(),
                    user_id,
                    status: CartStatus::Active,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                };
                let id = cart.id;
                state.carts.insert(id, cart);
                id
            }
        };

        match state
            .cart_lines
            .iter_mut()
            .find(|l| l.cart_id == cart_id && l.product_id == product_id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => state.cart_lines.push(CartLine {
                id: Uuid::new_v4(),
                cart_id,
                product_id,
                quantity,
            }),
        }
        if let Some(cart) = state.carts.get_mut(&cart_id) {
            cart.updated_at = Utc::now();
        }

        state.view_for(cart_id)
    }

    async fn update_line(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> PortResult<CartView> {
        if quantity < 1 {
            return self.remove_line(user_id, line_id).await;
        }

        let mut state = self.state.lock().unwrap();
        let cart_id = state
            .active_cart_id(user_id)
            .ok_or_else(|| PortError::NotFound(format!("Cart item {} not found", line_id)))?;
        let line = state
            .cart_lines
            .iter_mut()
            .find(|l| l.id == line_id && l.cart_id == cart_id)
            .ok_or_else(|| PortError::NotFound(format!("Cart item {} not found", line_id)))?;
        line.quantity = quantity;
        state.view_for(cart_id)
    }

    async fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> PortResult<CartView> {
        let mut state = self.state.lock().unwrap();
        let cart_id = state
            .active_cart_id(user_id)
            .ok_or_else(|| PortError::NotFound(format!("Cart item {} not found", line_id)))?;
        let before = state.cart_lines.len();
        state
            .cart_lines
            .retain(|l| !(l.id == line_id && l.cart_id == cart_id));
        if state.cart_lines.len() == before {
            return Err(PortError::NotFound(format!(
                "Cart item {} not found",
                line_id
            )));
        }
        state.view_for(cart_id)
    }

    async fn clear(&self, user_id: Uuid) -> PortResult<CartView> {
        let mut state = self.state.lock().unwrap();
        if let Some(cart_id) = state.active_cart_id(user_id) {
            state.cart_lines.retain(|l| l.cart_id != cart_id);
        }
        state.active_view(user_id)
    }
}

#[async_trait]
impl OrderWriter for MemoryStore {
    async fn checkout(&self, user_id: Uuid, draft: CheckoutDraft) -> PortResult<Uuid> {
        draft.validate()?;

        let mut state = self.state.lock().unwrap();
        let cart_id = state.active_cart_id(user_id).ok_or(PortError::EmptyCart)?;
        let view = state.view_for(cart_id)?;
        if view.is_empty() {
            return Err(PortError::EmptyCart);
        }

        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            subtotal: draft.subtotal,
            tax: draft.tax,
            shipping: draft.shipping,
            total_amount: draft.total_amount,
            payment_method: draft.payment_method,
            status: OrderStatus::Pending,
            shipping_info: draft.shipping_info,
            created_at: Utc::now(),
        };
        let lines: Vec<OrderLine> = view
            .lines
            .iter()
            .map(|l| OrderLine {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: l.product_id,
                title: l.title.clone(),
                quantity: l.quantity,
                unit_price: l.unit_price,
                discount_percent: l.discount_percent,
            })
            .collect();

        let order_id = order.id;
        state.orders.push(order);
        state.order_lines.extend(lines);

        // The fault fires between the order insert and the cart flip; the
        // error path removes the inserted rows the way a transaction
        // rollback would.
        if self.fail_next_checkout.swap(false, Ordering::SeqCst) {
            state.orders.retain(|o| o.id != order_id);
            state.order_lines.retain(|l| l.order_id != order_id);
            return Err(PortError::Unavailable(
                "injected store failure".to_string(),
            ));
        }

        if let Some(cart) = state.carts.get_mut(&cart_id) {
            cart.status = CartStatus::Ordered;
            cart.updated_at = Utc::now();
        }
        Ok(order_id)
    }
}

#[async_trait]
impl OrderReader for MemoryStore {
    async fn list_orders(&self, user_id: Uuid) -> PortResult<Vec<OrderReceipt>> {
        let state = self.state.lock().unwrap();
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        // Newest first; the stable sort over the reversed insertion order
        // keeps same-instant orders newest-insertion-first.
        orders.reverse();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let receipts = orders
            .into_iter()
            .map(|order| {
                let items = state
                    .order_lines
                    .iter()
                    .filter(|l| l.order_id == order.id)
                    .cloned()
                    .collect();
                OrderReceipt { order, items }
            })
            .collect();
        Ok(receipts)
    }

    async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> PortResult<OrderReceipt> {
        let state = self.state.lock().unwrap();
        let order = state
            .orders
            .iter()
            .find(|o| o.id == order_id && o.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Order {} not found", order_id)))?;
        let items = state
            .order_lines
            .iter()
            .filter(|l| l.order_id == order.id)
            .cloned()
            .collect();
        Ok(OrderReceipt { order, items })
    }
}

#[async_trait]
impl WishlistStore for MemoryStore {
    async fn wishlist(&self, user_id: Uuid) -> PortResult<Vec<WishlistEntry>> {
        let state = self.state.lock().unwrap();
        let mut entries = Vec::new();
        for row in state.wishlist.iter().filter(|r| r.user_id == user_id) {
            let product = state.products.get(&row.product_id).ok_or_else(|| {
                PortError::Unavailable(format!("product {} missing from catalog", row.product_id))
            })?;
            entries.push(WishlistEntry {
                id: row.id,
                product_id: row.product_id,
                title: product.title.clone(),
                price: product.price,
                discount_percent: product.discount_percent,
                available_stock: product.available_stock,
            });
        }
        Ok(entries)
    }

    async fn toggle(&self, user_id: Uuid, product_id: Uuid) -> PortResult<WishlistAction> {
        let mut state = self.state.lock().unwrap();
        if !state.products.contains_key(&product_id) {
            return Err(PortError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        let before = state.wishlist.len();
        state
            .wishlist
            .retain(|r| !(r.user_id == user_id && r.product_id == product_id));
        if state.wishlist.len() < before {
            return Ok(WishlistAction::Removed);
        }

        state.wishlist.push(WishlistRow {
            id: Uuid::new_v4(),
            user_id,
            product_id,
        });
        Ok(WishlistAction::Added)
    }

    async fn remove(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.wishlist.len();
        state
            .wishlist
            .retain(|r| !(r.id == entry_id && r.user_id == user_id));
        if state.wishlist.len() == before {
            return Err(PortError::NotFound(format!(
                "Wishlist item {} not found",
                entry_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityService for MemoryStore {
    async fn resolve_session(&self, token: &str) -> PortResult<Uuid> {
        let state = self.state.lock().unwrap();
        state
            .sessions
            .get(token)
            .copied()
            .ok_or(PortError::Unauthorized)
    }
}
