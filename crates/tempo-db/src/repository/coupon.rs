//! # Coupon Repository
//!
//! Database operations for coupons and their redemption history.
//!
//! The repository covers lookup and bookkeeping reads. The write path that
//! consumes a redemption (incrementing `used_count`, inserting the usage
//! row) lives inside the checkout transaction, not here, so it commits or
//! rolls back atomically with the order.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tempo_core::{Coupon, DiscountType};

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Looks up an active coupon by code, case-insensitively.
    ///
    /// Codes are stored uppercase; the input is uppercased before lookup.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let normalized = code.trim().to_uppercase();

        debug!(code = %normalized, "Looking up coupon");

        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT id, code, name, discount_type, value, max_discount_cents,
                   min_purchase_cents, max_uses, used_count, one_per_user,
                   restricted_email, expires_at, is_active, created_at
            FROM coupons
            WHERE code = ?1 AND is_active = 1
            "#,
        )
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Checks whether a user has redeemed this coupon before.
    pub async fn has_user_redeemed(&self, coupon_id: &str, user_id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM coupon_usage WHERE coupon_id = ?1 AND user_id = ?2",
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Inserts a new coupon. The code is uppercased before storage.
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(code = %coupon.code, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, name, discount_type, value, max_discount_cents,
                min_purchase_cents, max_uses, used_count, one_per_user,
                restricted_email, expires_at, is_active, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&coupon.id)
        .bind(coupon.code.to_uppercase())
        .bind(&coupon.name)
        .bind(coupon.discount_type)
        .bind(coupon.value)
        .bind(coupon.max_discount_cents)
        .bind(coupon.min_purchase_cents)
        .bind(coupon.max_uses)
        .bind(coupon.used_count)
        .bind(coupon.one_per_user)
        .bind(&coupon.restricted_email)
        .bind(coupon.expires_at)
        .bind(coupon.is_active)
        .bind(coupon.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deactivates a coupon (soft delete).
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        sqlx::query("UPDATE coupons SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Builds a coupon with generated ID, for seeding and admin creation.
    pub fn new_coupon(code: impl Into<String>, discount_type: DiscountType, value: i64) -> Coupon {
        let code: String = code.into();
        Coupon {
            id: Uuid::new_v4().to_string(),
            code: code.to_uppercase(),
            name: code.to_uppercase(),
            discount_type,
            value,
            max_discount_cents: None,
            min_purchase_cents: 0,
            max_uses: None,
            used_count: 0,
            one_per_user: false,
            restricted_email: None,
            expires_at: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
