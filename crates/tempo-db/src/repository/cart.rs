//! # Cart Repository
//!
//! Persistent cart storage, one row per (user, product).
//!
//! Cart lines always join against the live catalog: prices shown in the
//! cart follow catalog updates and only freeze into snapshots at checkout.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tempo_core::{validation, CartItem};

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Returns a user's cart joined with current product data.
    ///
    /// Lines whose product was deactivated are excluded; they are stale
    /// leftovers, not purchasable items.
    pub async fn get_items(&self, user_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT c.id, c.product_id, c.quantity,
                   p.name, p.price_cents, p.stock, p.image
            FROM cart_items c
            INNER JOIN products p ON p.id = c.product_id
            WHERE c.user_id = ?1 AND p.is_active = 1
            ORDER BY c.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Adds a product to the cart, or bumps the quantity if already there.
    pub async fn add_item(&self, user_id: &str, product_id: &str, quantity: i64) -> DbResult<()> {
        validation::validate_quantity(quantity)
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;

        debug!(user_id = %user_id, product_id = %product_id, quantity, "Adding to cart");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = quantity + excluded.quantity, updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets the quantity of a cart line, removing it at zero.
    pub async fn set_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        if quantity == 0 {
            return self.remove_item(user_id, product_id).await;
        }
        validation::validate_quantity(quantity)
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE cart_items SET quantity = ?3, updated_at = ?4
            WHERE user_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CartItem", product_id));
        }

        Ok(())
    }

    /// Removes one product from the cart.
    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = ?1 AND product_id = ?2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Total units across a user's purchasable cart lines (badge counter).
    pub async fn item_count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT CAST(COALESCE(SUM(c.quantity), 0) AS INTEGER)
            FROM cart_items c
            INNER JOIN products p ON p.id = c.product_id
            WHERE c.user_id = ?1 AND p.is_active = 1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Empties a user's cart. The checkout transaction clears the cart
    /// itself; this covers the explicit "empty cart" action.
    pub async fn clear(&self, user_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
