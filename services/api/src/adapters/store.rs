//! services/api/src/adapters/store.rs
//!
//! PostgreSQL adapter for the cart, order, and wishlist ports. All storefront
//! writes go through this module. Every cart mutation and the checkout path
//! lock the active cart row first, so edits and checkout serialize on that
//! row and an order snapshot can never interleave with an edit.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use storefront_core::domain::{
    CartView, CheckoutDraft, EnrichedLine, Order, OrderLine, OrderReceipt, OrderStatus,
    WishlistAction, WishlistEntry,
};
use storefront_core::ports::{
    CartStore, OrderReader, OrderWriter, PortError, PortResult, WishlistStore,
};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `CartStore`, `OrderWriter`,
/// `OrderReader`, and `WishlistStore` ports.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    checkout_timeout: Duration,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool, checkout_timeout: Duration) -> Self {
        Self {
            pool,
            checkout_timeout,
        }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps an infrastructure failure onto the port taxonomy. Nothing was
/// committed when this fires, so the caller may retry.
fn store_err(e: sqlx::Error) -> PortError {
    PortError::Unavailable(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct LineRecord {
    id: Uuid,
    product_id: Uuid,
    quantity: i32,
    title: String,
    price: Decimal,
    discount_percent: Decimal,
    available_stock: i32,
}
impl LineRecord {
    fn to_domain(self) -> EnrichedLine {
        EnrichedLine {
            line_id: self.id,
            product_id: self.product_id,
            quantity: self.quantity,
            title: self.title,
            unit_price: self.price,
            discount_percent: self.discount_percent,
            available_stock: self.available_stock,
        }
    }
}

#[derive(FromRow)]
struct OrderRecord {
    id: Uuid,
    user_id: Uuid,
    subtotal: Decimal,
    tax: Decimal,
    shipping: Decimal,
    total_amount: Decimal,
    payment_method: String,
    status: String,
    shipping_info: serde_json::Value,
    created_at: DateTime<Utc>,
}
impl OrderRecord {
    fn to_domain(self) -> PortResult<Order> {
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            subtotal: self.subtotal,
            tax: self.tax,
            shipping: self.shipping,
            total_amount: self.total_amount,
            payment_method: self.payment_method,
            status: OrderStatus::parse(&self.status)?,
            shipping_info: self.shipping_info,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct OrderLineRecord {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    title: String,
    quantity: i32,
    unit_price: Decimal,
    discount_percent: Decimal,
}
impl OrderLineRecord {
    fn to_domain(self) -> OrderLine {
        OrderLine {
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            title: self.title,
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount_percent: self.discount_percent,
        }
    }
}

#[derive(FromRow)]
struct WishlistRecord {
    id: Uuid,
    product_id: Uuid,
    title: String,
    price: Decimal,
    discount_percent: Decimal,
    available_stock: i32,
}
impl WishlistRecord {
    fn to_domain(self) -> WishlistEntry {
        WishlistEntry {
            id: self.id,
            product_id: self.product_id,
            title: self.title,
            price: self.price,
            discount_percent: self.discount_percent,
            available_stock: self.available_stock,
        }
    }
}

//=========================================================================================
// Shared Query Helpers
//=========================================================================================

const ENRICHED_LINES_SQL: &str = "SELECT cl.id, cl.product_id, cl.quantity, \
     p.title, p.price, p.discount_percent, p.available_stock \
     FROM cart_lines cl JOIN products p ON p.id = cl.product_id \
     WHERE cl.cart_id = $1 ORDER BY cl.created_at, cl.id";

/// Reads the enriched view of one cart. Generic over the executor so the
/// checkout transaction can reuse it for its in-transaction snapshot.
async fn fetch_view<'e, E>(executor: E, cart_id: Uuid) -> PortResult<CartView>
where
    E: sqlx::PgExecutor<'e>,
{
    let records = sqlx::query_as::<_, LineRecord>(ENRICHED_LINES_SQL)
        .bind(cart_id)
        .fetch_all(executor)
        .await
        .map_err(store_err)?;
    Ok(CartView {
        cart_id: Some(cart_id),
        lines: records.into_iter().map(LineRecord::to_domain).collect(),
    })
}

/// Locks the user's active cart row and returns its id. Must run inside a
/// transaction; the lock is held until that transaction ends, which is what
/// serializes cart mutations and checkout against each other. After a
/// concurrent checkout commits, the re-evaluated status predicate sees the
/// retired cart and this returns `None`.
async fn lock_active_cart<'e, E>(executor: E, user_id: Uuid) -> PortResult<Option<Uuid>>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM carts WHERE user_id = $1 AND status = 'active' FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(store_err)
}

impl PgStore {
    /// The user's active cart id, if any, without locking it.
    async fn active_cart_id(&self, user_id: Uuid) -> PortResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM carts WHERE user_id = $1 AND status = 'active'",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn product_exists(&self, product_id: Uuid) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)
    }

    /// Runs the actual checkout transaction. Split out so the trait method
    /// can wrap it in the configured timeout.
    async fn checkout_tx(&self, user_id: Uuid, draft: &CheckoutDraft) -> PortResult<Uuid> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        // The cart row lock is the serialization point: a concurrent checkout
        // or cart edit for the same user blocks here until we commit.
        let cart_id = lock_active_cart(&mut *tx, user_id)
            .await?
            .ok_or(PortError::EmptyCart)?;

        let view = fetch_view(&mut *tx, cart_id).await?;
        if view.is_empty() {
            return Err(PortError::EmptyCart);
        }

        let order_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO orders (user_id, subtotal, tax, shipping, total_amount, \
             payment_method, status, shipping_info) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(user_id)
        .bind(draft.subtotal)
        .bind(draft.tax)
        .bind(draft.shipping)
        .bind(draft.total_amount)
        .bind(&draft.payment_method)
        .bind(OrderStatus::Pending.as_str())
        .bind(&draft.shipping_info)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        for line in &view.lines {
            sqlx::query(
                "INSERT INTO order_lines (order_id, product_id, title, quantity, \
                 unit_price, discount_percent) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.title)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.discount_percent)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        // Retiring the cart frees the one-active-cart slot. The status
        // predicate is a backstop: zero affected rows means another
        // transaction retired it first.
        let flipped = sqlx::query(
            "UPDATE carts SET status = 'ordered', updated_at = now() \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(cart_id)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;
        if flipped.rows_affected() != 1 {
            return Err(PortError::Conflict(
                "cart was checked out concurrently".to_string(),
            ));
        }

        tx.commit().await.map_err(store_err)?;
        Ok(order_id)
    }
}

//=========================================================================================
// `CartStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CartStore for PgStore {
    async fn active_cart(&self, user_id: Uuid) -> PortResult<CartView> {
        match self.active_cart_id(user_id).await? {
            Some(cart_id) => fetch_view(&self.pool, cart_id).await,
            None => Ok(CartView::default()),
        }
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

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        // Create the active cart lazily, then lock it. The second pass covers
        // the window where a concurrent checkout retires the cart between our
        // insert and the lock: the fresh statement snapshot then sees no
        // active cart and the insert succeeds.
        let mut cart_id: Option<Uuid> = None;
        for _ in 0..2 {
            sqlx::query(
                "INSERT INTO carts (user_id) VALUES ($1) \
                 ON CONFLICT (user_id) WHERE status = 'active' DO NOTHING",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

            cart_id = lock_active_cart(&mut *tx, user_id).await?;
            if cart_id.is_some() {
                break;
            }
        }
        let cart_id = cart_id.ok_or_else(|| {
            PortError::Conflict("active cart is being retired, retry the add".to_string())
        })?;

        // Merging keeps the existing line's id; only its quantity grows.
        sqlx::query(
            "INSERT INTO cart_lines (cart_id, product_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (cart_id, product_id) DO UPDATE \
             SET quantity = cart_lines.quantity + EXCLUDED.quantity, updated_at = now()",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db) = e {
                if matches!(db.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) {
                    return PortError::NotFound(format!("Product {} not found", product_id));
                }
            }
            store_err(e)
        })?;

        sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        let view = fetch_view(&mut *tx, cart_id).await?;
        tx.commit().await.map_err(store_err)?;
        Ok(view)
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

        // Lock the cart row before touching its lines. A checkout holding
        // the lock finishes first and this then sees the retired cart as
        // NotFound; an edit holding it first lands in the snapshot.
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        let cart_id = lock_active_cart(&mut *tx, user_id)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Cart item {} not found", line_id)))?;

        let updated = sqlx::query(
            "UPDATE cart_lines SET quantity = $3, updated_at = now() \
             WHERE cart_id = $1 AND id = $2",
        )
        .bind(cart_id)
        .bind(line_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;
        if updated.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Cart item {} not found",
                line_id
            )));
        }

        let view = fetch_view(&mut *tx, cart_id).await?;
        tx.commit().await.map_err(store_err)?;
        Ok(view)
    }

    async fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> PortResult<CartView> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        let cart_id = lock_active_cart(&mut *tx, user_id)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Cart item {} not found", line_id)))?;

        let deleted = sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1 AND id = $2")
            .bind(cart_id)
            .bind(line_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        if deleted.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Cart item {} not found",
                line_id
            )));
        }

        let view = fetch_view(&mut *tx, cart_id).await?;
        tx.commit().await.map_err(store_err)?;
        Ok(view)
    }

    async fn clear(&self, user_id: Uuid) -> PortResult<CartView> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        // Clearing a cart that does not exist or is already empty succeeds.
        let cart_id = match lock_active_cart(&mut *tx, user_id).await? {
            Some(id) => id,
            None => return Ok(CartView::default()),
        };

        sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        let view = fetch_view(&mut *tx, cart_id).await?;
        tx.commit().await.map_err(store_err)?;
        Ok(view)
    }
}

//=========================================================================================
// `OrderWriter` Trait Implementation
//=========================================================================================

#[async_trait]
impl OrderWriter for PgStore {
    async fn checkout(&self, user_id: Uuid, draft: CheckoutDraft) -> PortResult<Uuid> {
        draft.validate()?;

        // Dropping the future on expiry drops the transaction, which rolls
        // every statement back; the cart is left exactly as it was.
        match tokio::time::timeout(self.checkout_timeout, self.checkout_tx(user_id, &draft))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(PortError::Unavailable("checkout timed out".to_string())),
        }
    }
}

//=========================================================================================
// `OrderReader` Trait Implementation
//=========================================================================================

const ORDER_COLUMNS: &str = "id, user_id, subtotal, tax, shipping, total_amount, \
     payment_method, status, shipping_info, created_at";

#[async_trait]
impl OrderReader for PgStore {
    async fn list_orders(&self, user_id: Uuid) -> PortResult<Vec<OrderReceipt>> {
        let order_records = sqlx::query_as::<_, OrderRecord>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let order_ids: Vec<Uuid> = order_records.iter().map(|r| r.id).collect();
        let line_records = sqlx::query_as::<_, OrderLineRecord>(
            "SELECT id, order_id, product_id, title, quantity, unit_price, discount_percent \
             FROM order_lines WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut lines_by_order: std::collections::HashMap<Uuid, Vec<OrderLine>> =
            std::collections::HashMap::new();
        for record in line_records {
            lines_by_order
                .entry(record.order_id)
                .or_default()
                .push(record.to_domain());
        }

        let mut receipts = Vec::with_capacity(order_records.len());
        for record in order_records {
            let order = record.to_domain()?;
            let items = lines_by_order.remove(&order.id).unwrap_or_default();
            receipts.push(OrderReceipt { order, items });
        }
        Ok(receipts)
    }

    async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> PortResult<OrderReceipt> {
        let record = sqlx::query_as::<_, OrderRecord>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| PortError::NotFound(format!("Order {} not found", order_id)))?;

        let items = sqlx::query_as::<_, OrderLineRecord>(
            "SELECT id, order_id, product_id, title, quantity, unit_price, discount_percent \
             FROM order_lines WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?
        .into_iter()
        .map(OrderLineRecord::to_domain)
        .collect();

        Ok(OrderReceipt {
            order: record.to_domain()?,
            items,
        })
    }
}

//=========================================================================================
// `WishlistStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl WishlistStore for PgStore {
    async fn wishlist(&self, user_id: Uuid) -> PortResult<Vec<WishlistEntry>> {
        let records = sqlx::query_as::<_, WishlistRecord>(
            "SELECT w.id, w.product_id, p.title, p.price, p.discount_percent, \
             p.available_stock \
             FROM wishlist_entries w JOIN products p ON p.id = w.product_id \
             WHERE w.user_id = $1 ORDER BY w.created_at, w.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(records.into_iter().map(WishlistRecord::to_domain).collect())
    }

    async fn toggle(&self, user_id: Uuid, product_id: Uuid) -> PortResult<WishlistAction> {
        if !self.product_exists(product_id).await? {
            return Err(PortError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        // Delete-first makes the toggle a single round trip in the common
        // removal case and leaves the insert as the add case.
        let removed = sqlx::query(
            "DELETE FROM wishlist_entries WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        if removed.rows_affected() > 0 {
            return Ok(WishlistAction::Removed);
        }

        sqlx::query(
            "INSERT INTO wishlist_entries (user_id, product_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, product_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(WishlistAction::Added)
    }

    async fn remove(&self, user_id: Uuid, entry_id: Uuid) -> PortResult<()> {
        let deleted = sqlx::query("DELETE FROM wishlist_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        if deleted.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Wishlist item {} not found",
                entry_id
            )));
        }
        Ok(())
    }
}
