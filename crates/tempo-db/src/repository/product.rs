//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Listing and lookup
//! - CRUD operations
//! - Conditional stock adjustments (checkout relies on these)

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tempo_core::Product;

/// Aggregate totals over the sales ledger.
#[derive(Debug, Clone, Copy, serde::Serialize, sqlx::FromRow)]
pub struct SalesSummary {
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// Per-product row of the best-sellers report.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: String,
    pub name: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let products = repo.list_active(20).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, category, price_cents, stock,
                   image, is_featured, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active products in a category.
    pub async fn list_by_category(&self, category: &str, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, category, price_cents, stock,
                   image, is_featured, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1 AND category = ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists products flagged for the storefront landing page.
    pub async fn list_featured(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, category, price_cents, stock,
                   image, is_featured, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1 AND is_featured = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, category, price_cents, stock,
                   image, is_featured, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, category, price_cents, stock,
                image, is_featured, is_active, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.image)
        .bind(product.is_featured)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates price, stock, and flags of an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, description = ?3, category = ?4, price_cents = ?5,
                stock = ?6, image = ?7, is_featured = ?8, is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.image)
        .bind(product.is_featured)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Restores stock for a cancelled order line.
    ///
    /// The decrement path lives inside the checkout transaction; this is
    /// the compensating increment used by order cancellation.
    pub async fn restore_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(product_id = %id, quantity, "Restoring stock");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Hard-deletes a product.
    ///
    /// Products with sales history are protected by an `ON DELETE RESTRICT`
    /// foreign key; the resulting `ForeignKeyViolation` tells the caller to
    /// deactivate instead.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Sums units and revenue over the whole sales ledger.
    pub async fn total_sales(&self) -> DbResult<SalesSummary> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT CAST(COALESCE(SUM(quantity), 0) AS INTEGER) AS units_sold,
                   CAST(COALESCE(SUM(total_cents), 0) AS INTEGER) AS revenue_cents
            FROM sales
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Best-selling products by units sold.
    pub async fn most_sold(&self, limit: u32) -> DbResult<Vec<ProductSales>> {
        let rows = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT s.product_id,
                   p.name,
                   CAST(SUM(s.quantity) AS INTEGER) AS units_sold,
                   CAST(SUM(s.total_cents) AS INTEGER) AS revenue_cents
            FROM sales s
            INNER JOIN products p ON p.id = s.product_id
            GROUP BY s.product_id, p.name
            ORDER BY units_sold DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Counts all products (including inactive).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Builds a product with generated ID and timestamps, for seeding and
    /// admin creation paths.
    pub fn new_product(
        name: impl Into<String>,
        category: impl Into<String>,
        price_cents: i64,
        stock: i64,
    ) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            category: category.into(),
            price_cents,
            stock,
            image: None,
            is_featured: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
