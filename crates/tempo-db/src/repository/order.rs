//! # Order Repository
//!
//! Reads and lifecycle transitions for placed orders.
//!
//! Order CREATION does not live here: the checkout service owns it,
//! because an order insert is inseparable from stock decrements and coupon
//! consumption. This repository covers everything after that commit.
//!
//! ## Cancellation
//! Cancelling an order is itself transactional: the status flips and every
//! line's stock returns to the shelf in one commit.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use tempo_core::{Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str = r#"
    id, user_id, status, subtotal_cents, tax_cents, tax_name,
    shipping_cents, discount_cents, gift_wrap, gift_wrap_cents, total_cents,
    coupon_code, currency_code, currency_symbol, payment_method,
    shipping_name, shipping_address, shipping_city, shipping_postal_code,
    shipping_phone, shipping_country, notes, created_at, updated_at
"#;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets the line items of an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, name_snapshot, unit_price_cents,
                   quantity, line_total_cents, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists a customer's orders, newest first.
    pub async fn list_by_user(&self, user_id: &str, limit: u32) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Lists orders in a given status, oldest first (admin work queue).
    pub async fn list_by_status(&self, status: OrderStatus, limit: u32) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ?1 ORDER BY created_at LIMIT ?2"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Moves an order to a new lifecycle status.
    ///
    /// The transition is validated against the state machine. Cancellation
    /// goes through [`Self::cancel`] instead, which also restores stock.
    pub async fn update_status(&self, id: &str, next: OrderStatus) -> DbResult<Order> {
        if next == OrderStatus::Cancelled {
            return self.cancel(id).await;
        }

        let order = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?;

        if !order.status.can_transition_to(next) {
            return Err(DbError::QueryFailed(format!(
                "invalid status transition {:?} -> {:?} for order {}",
                order.status, next, id
            )));
        }

        let now = Utc::now();
        sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(next)
            .bind(now)
            .execute(&self.pool)
            .await?;

        info!(order_id = %id, from = ?order.status, to = ?next, "Order status updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Cancels an order and returns every line's stock to the shelf.
    ///
    /// Runs as one transaction so a crash cannot leave the order cancelled
    /// with stock still consumed.
    pub async fn cancel(&self, id: &str) -> DbResult<Order> {
        let order = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?;

        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(DbError::QueryFailed(format!(
                "order {} in status {:?} cannot be cancelled",
                id, order.status
            )));
        }

        let items = self.get_items(id).await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(OrderStatus::Cancelled)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        for item in &items {
            debug!(product_id = %item.product_id, quantity = item.quantity, "Restoring stock");
            sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&item.product_id)
                .bind(item.quantity)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(order_id = %id, items = items.len(), "Order cancelled, stock restored");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    /// Counts orders, for diagnostics and tests.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
