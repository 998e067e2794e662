//! # Checkout Service
//!
//! The one write path that turns a cart into an order.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     process_order (single SQLite tx)                    │
//! │                                                                         │
//! │  load user + cart + coupon          ← reads, outside the tx            │
//! │  price the order (tempo-core)       ← pure math, no I/O                │
//! │       │                                                                 │
//! │       ▼  BEGIN                                                          │
//! │  1. stock decrement per line        UPDATE .. WHERE stock >= qty       │
//! │  2. insert order + order_items                                         │
//! │  3. insert sales ledger rows                                           │
//! │  4. consume coupon                  UPDATE .. WHERE used_count < max   │
//! │  5. clear the cart                                                     │
//! │       │  COMMIT                                                         │
//! │       ▼                                                                 │
//! │  notify (fire-and-forget, failures logged)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any step failing rolls the whole transaction back: no half-placed
//! orders, no phantom stock decrements, no consumed coupons without an
//! order behind them.
//!
//! ## Races
//! The stock check and the coupon usage cap are both enforced by
//! conditional UPDATEs inside the transaction, so two concurrent checkouts
//! cannot both take the last unit or the last redemption. The partial
//! unique index on `coupon_usage` backstops the one-per-customer rule.

use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::Database;
use tempo_core::{
    calculate_totals, coupon as coupon_rules, validation, BaseMoney, CartItem, Country, Coupon,
    CouponRejection, Currency, Order, OrderItem, OrderStatus, PaymentMethod, ShippingTier,
    TotalsBreakdown, ValidationError,
};

// =============================================================================
// Notifier
// =============================================================================

/// Post-checkout notification hook (order confirmation email, webhook).
///
/// Called after the transaction commits. Implementations must not assume
/// their failure can undo the order: errors are logged and swallowed.
pub trait OrderNotifier: Send + Sync {
    fn order_placed(&self, order: &Order, items: &[OrderItem]) -> Result<(), String>;
}

/// Notifier that does nothing. Default for tests and offline tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl OrderNotifier for NoopNotifier {
    fn order_placed(&self, _order: &Order, _items: &[OrderItem]) -> Result<(), String> {
        Ok(())
    }
}

/// Notifier that writes the confirmation to the log. Stands in where the
/// deployment has no mail pipeline wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl OrderNotifier for LogNotifier {
    fn order_placed(&self, order: &Order, items: &[OrderItem]) -> Result<(), String> {
        info!(
            order_id = %order.id,
            total_cents = order.total_cents,
            item_count = items.len(),
            "Order placed"
        );
        Ok(())
    }
}

// =============================================================================
// Request / Response
// =============================================================================

/// Shipping address block of a checkout request.
#[derive(Debug, Clone)]
pub struct ShippingDetails {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
}

/// One requested order line, by product reference.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
}

/// A checkout request, as the API layer hands it over.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: String,

    /// Explicit order lines. `None` (or empty) orders the stored cart.
    pub items: Option<Vec<OrderLine>>,

    /// Destination code. Lenient: country code, currency code, or garbage
    /// (which falls back to the default country).
    pub country: String,

    pub shipping_tier: ShippingTier,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    pub gift_wrap: bool,
    pub shipping: ShippingDetails,
    pub notes: Option<String>,

    /// Total the client showed the customer, if it sent one. The server
    /// recomputes authoritative totals either way; a mismatch is logged,
    /// never trusted.
    pub expected_total_cents: Option<i64>,
}

/// Everything the caller gets back from a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub totals: TotalsBreakdown,
}

/// A non-mutating price preview of the current cart.
#[derive(Debug, Clone)]
pub struct CheckoutQuote {
    pub totals: TotalsBreakdown,
    pub free_shipping_coupon: bool,
    pub item_count: usize,
}

// =============================================================================
// Errors
// =============================================================================

/// Why a checkout failed. Each variant maps to a distinct client response.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Coupon(#[from] CouponRejection),

    /// A line could not be fulfilled. Nothing was written.
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    StockConflict {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// The coupon's usage cap was consumed by a concurrent checkout
    /// between validation and commit. Nothing was written.
    #[error("coupon was exhausted during checkout")]
    CouponConflict,

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Db(DbError::from(err))
    }
}

// =============================================================================
// Service
// =============================================================================

/// The checkout service. Owns order creation end to end.
pub struct CheckoutService<N: OrderNotifier = NoopNotifier> {
    db: Database,
    notifier: N,
}

impl CheckoutService<NoopNotifier> {
    /// Creates a checkout service with no notification hook.
    pub fn new(db: Database) -> Self {
        CheckoutService {
            db,
            notifier: NoopNotifier,
        }
    }
}

impl<N: OrderNotifier> CheckoutService<N> {
    /// Creates a checkout service with a notification hook.
    pub fn with_notifier(db: Database, notifier: N) -> Self {
        CheckoutService { db, notifier }
    }

    /// Prices the current cart without writing anything.
    ///
    /// Used by the cart page to show live totals as the customer toggles
    /// country, shipping tier, gift wrap, and coupon.
    pub async fn quote(
        &self,
        user_id: &str,
        country: &str,
        tier: ShippingTier,
        coupon_code: Option<&str>,
        gift_wrap: bool,
    ) -> Result<CheckoutQuote, CheckoutError> {
        let user = self
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| CheckoutError::UserNotFound(user_id.to_string()))?;

        let items = self.db.carts().get_items(user_id).await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let destination = Country::resolve(country);
        let subtotal = cart_subtotal(&items);

        let (discount, free_shipping) = match coupon_code {
            Some(code) => {
                let grant = self.validate_coupon(code, &user.email, user_id, subtotal).await?;
                (grant.1.discount, grant.1.free_shipping)
            }
            None => (BaseMoney::zero(), false),
        };

        let totals = calculate_totals(
            subtotal,
            destination,
            tier,
            discount,
            gift_wrap,
            free_shipping,
        );

        Ok(CheckoutQuote {
            totals,
            free_shipping_coupon: free_shipping,
            item_count: items.len(),
        })
    }

    /// Places an order from explicit request lines, or from the user's
    /// stored cart when the request carries none.
    ///
    /// See the module docs for the transaction shape. On success the cart
    /// is empty, stock is decremented, the coupon (if any) is consumed,
    /// and the notifier has been invoked.
    pub async fn process_order(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        validate_request(&request)?;

        let user = self
            .db
            .users()
            .get_by_id(&request.user_id)
            .await?
            .ok_or_else(|| CheckoutError::UserNotFound(request.user_id.clone()))?;

        let items = match &request.items {
            Some(lines) if !lines.is_empty() => self.resolve_lines(lines).await?,
            _ => self.db.carts().get_items(&request.user_id).await?,
        };
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let destination = Country::resolve(&request.country);
        let currency = Currency::normalize(&request.country);
        let subtotal = cart_subtotal(&items);

        let coupon_grant = match &request.coupon_code {
            Some(code) => Some(
                self.validate_coupon(code, &user.email, &request.user_id, subtotal)
                    .await?,
            ),
            None => None,
        };

        let (discount, free_shipping) = match &coupon_grant {
            Some((_, grant)) => (grant.discount, grant.free_shipping),
            None => (BaseMoney::zero(), false),
        };

        let totals = calculate_totals(
            subtotal,
            destination,
            request.shipping_tier,
            discount,
            request.gift_wrap,
            free_shipping,
        );

        if let Some(expected) = request.expected_total_cents {
            if expected != totals.total.cents() {
                warn!(
                    user_id = %request.user_id,
                    client_cents = expected,
                    server_cents = totals.total.cents(),
                    "Client total disagrees with server total, using server figure"
                );
            }
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();

        let order = Order {
            id: order_id.clone(),
            user_id: request.user_id.clone(),
            status: request.payment_method.initial_status(),
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.amount.cents(),
            tax_name: totals.tax.name.clone(),
            shipping_cents: totals.shipping.cost.cents(),
            discount_cents: totals.discount.cents(),
            gift_wrap: request.gift_wrap,
            gift_wrap_cents: totals.gift_wrap.cents(),
            total_cents: totals.total.cents(),
            coupon_code: coupon_grant.as_ref().map(|(c, _)| c.code.clone()),
            currency_code: currency.code().to_string(),
            currency_symbol: currency.symbol().to_string(),
            payment_method: request.payment_method,
            shipping_name: request.shipping.name.clone(),
            shipping_address: request.shipping.address.clone(),
            shipping_city: request.shipping.city.clone(),
            shipping_postal_code: request.shipping.postal_code.clone(),
            shipping_phone: request.shipping.phone.clone(),
            shipping_country: destination.code().to_string(),
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        let order_items: Vec<OrderItem> = items
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: line.product_id.clone(),
                name_snapshot: line.name.clone(),
                unit_price_cents: line.price_cents,
                quantity: line.quantity,
                line_total_cents: line.line_total().cents(),
                created_at: now,
            })
            .collect();

        // All writes happen here. Dropping the tx on an early return rolls
        // everything back.
        let mut tx = self.db.pool().begin().await?;

        for line in &items {
            self.take_stock(&mut tx, line).await?;
        }

        insert_order(&mut tx, &order).await?;
        for item in &order_items {
            insert_order_item(&mut tx, item).await?;
        }
        for item in &order_items {
            insert_sale(&mut tx, item, now).await?;
        }

        if let Some((coupon, _)) = &coupon_grant {
            self.consume_coupon(&mut tx, coupon, &request.user_id, &order_id, now)
                .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE user_id = ?1")
            .bind(&request.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total_cents = order.total_cents,
            status = ?order.status,
            "Order placed"
        );

        // After commit the order exists no matter what the notifier does.
        if let Err(e) = self.notifier.order_placed(&order, &order_items) {
            warn!(order_id = %order.id, error = %e, "Order notification failed");
        }

        Ok(CheckoutReceipt {
            order,
            items: order_items,
            totals,
        })
    }

    /// Materializes explicit request lines against the live catalog.
    ///
    /// Missing or deactivated products fail the whole request; stock is
    /// only checked later, by the conditional decrement inside the
    /// transaction, exactly as for cart-sourced lines.
    async fn resolve_lines(&self, lines: &[OrderLine]) -> Result<Vec<CartItem>, CheckoutError> {
        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            validation::validate_quantity(line.quantity)?;

            let product = self
                .db
                .products()
                .get_by_id(&line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| DbError::not_found("Product", &line.product_id))?;

            items.push(CartItem {
                id: Uuid::new_v4().to_string(),
                product_id: product.id,
                quantity: line.quantity,
                name: product.name,
                price_cents: product.price_cents,
                stock: product.stock,
                image: product.image,
            });
        }

        Ok(items)
    }

    /// Looks up and evaluates a coupon for this user and subtotal.
    ///
    /// Side-effect free, so the API layer can offer a standalone
    /// "apply coupon" check without quoting a cart.
    pub async fn validate_coupon(
        &self,
        code: &str,
        user_email: &str,
        user_id: &str,
        subtotal: BaseMoney,
    ) -> Result<(Coupon, coupon_rules::CouponGrant), CheckoutError> {
        validation::validate_coupon_code(code)?;

        let coupon = self
            .db
            .coupons()
            .get_by_code(code)
            .await?
            .ok_or(CouponRejection::NotFound)?;

        let already_used = self
            .db
            .coupons()
            .has_user_redeemed(&coupon.id, user_id)
            .await?;

        let ctx = coupon_rules::RedemptionContext {
            subtotal,
            user_email,
            already_used,
            now: Utc::now(),
        };
        let grant = coupon_rules::evaluate(&coupon, &ctx)?;

        debug!(code = %coupon.code, discount_cents = grant.discount.cents(), "Coupon accepted");
        Ok((coupon, grant))
    }

    /// Decrements stock for one line, failing if not enough is left.
    async fn take_stock(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        line: &CartItem,
    ) -> Result<(), CheckoutError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND is_active = 1 AND stock >= ?2
            "#,
        )
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            // Re-read for the error message; the tx rolls back regardless.
            let available: i64 =
                sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                    .bind(&line.product_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .unwrap_or(0);

            return Err(CheckoutError::StockConflict {
                product_id: line.product_id.clone(),
                requested: line.quantity,
                available,
            });
        }

        Ok(())
    }

    /// Consumes one redemption of the coupon inside the transaction.
    ///
    /// The usage cap is re-checked by the conditional UPDATE; the usage row
    /// insert trips the partial unique index if another checkout already
    /// recorded this customer's exclusive redemption.
    async fn consume_coupon(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        coupon: &Coupon,
        user_id: &str,
        order_id: &str,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), CheckoutError> {
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET used_count = used_count + 1
            WHERE id = ?1 AND (max_uses IS NULL OR used_count < max_uses)
            "#,
        )
        .bind(&coupon.id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CheckoutError::CouponConflict);
        }

        let usage = sqlx::query(
            r#"
            INSERT INTO coupon_usage (id, coupon_id, user_id, order_id, exclusive, used_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&coupon.id)
        .bind(user_id)
        .bind(order_id)
        .bind(coupon.is_exclusive())
        .bind(now)
        .execute(&mut **tx)
        .await;

        match usage {
            Ok(_) => Ok(()),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { .. } => Err(CheckoutError::CouponConflict),
                other => Err(CheckoutError::Db(other)),
            },
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn cart_subtotal(items: &[CartItem]) -> BaseMoney {
    items
        .iter()
        .fold(BaseMoney::zero(), |acc, line| acc + line.line_total())
}

fn validate_request(request: &CheckoutRequest) -> Result<(), ValidationError> {
    validation::validate_required_field("name", &request.shipping.name)?;
    validation::validate_required_field("address", &request.shipping.address)?;
    validation::validate_required_field("city", &request.shipping.city)?;
    validation::validate_required_field("postal_code", &request.shipping.postal_code)?;
    validation::validate_required_field("phone", &request.shipping.phone)?;
    if let Some(expected) = request.expected_total_cents {
        validation::validate_non_negative_amount("expected_total", expected)?;
    }
    Ok(())
}

async fn insert_order(tx: &mut Transaction<'_, Sqlite>, order: &Order) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, user_id, status, subtotal_cents, tax_cents, tax_name,
            shipping_cents, discount_cents, gift_wrap, gift_wrap_cents,
            total_cents, coupon_code, currency_code, currency_symbol,
            payment_method, shipping_name, shipping_address, shipping_city,
            shipping_postal_code, shipping_phone, shipping_country, notes,
            created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)
        "#,
    )
    .bind(&order.id)
    .bind(&order.user_id)
    .bind(order.status)
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(&order.tax_name)
    .bind(order.shipping_cents)
    .bind(order.discount_cents)
    .bind(order.gift_wrap)
    .bind(order.gift_wrap_cents)
    .bind(order.total_cents)
    .bind(&order.coupon_code)
    .bind(&order.currency_code)
    .bind(&order.currency_symbol)
    .bind(order.payment_method)
    .bind(&order.shipping_name)
    .bind(&order.shipping_address)
    .bind(&order.shipping_city)
    .bind(&order.shipping_postal_code)
    .bind(&order.shipping_phone)
    .bind(&order.shipping_country)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_order_item(
    tx: &mut Transaction<'_, Sqlite>,
    item: &OrderItem,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, name_snapshot, unit_price_cents,
            quantity, line_total_cents, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.line_total_cents)
    .bind(item.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_sale(
    tx: &mut Transaction<'_, Sqlite>,
    item: &OrderItem,
    now: chrono::DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sales (id, order_id, product_id, quantity, unit_price_cents, total_cents, sold_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.line_total_cents)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::coupon::CouponRepository;
    use crate::repository::product::ProductRepository;
    use crate::repository::user::UserRepository;
    use std::sync::Mutex;
    use tempo_core::DiscountType;

    struct Fixture {
        db: Database,
        user_id: String,
        product_id: String,
    }

    /// One user, one 1000.00 product with 10 in stock.
    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let user = UserRepository::new_user("ana@example.com", "Ana");
        db.users().insert(&user).await.unwrap();

        let product = ProductRepository::new_product("Stratocaster", "guitars", 100_000, 10);
        db.products().insert(&product).await.unwrap();

        Fixture {
            db,
            user_id: user.id,
            product_id: product.id,
        }
    }

    fn request(user_id: &str) -> CheckoutRequest {
        CheckoutRequest {
            user_id: user_id.to_string(),
            items: None,
            country: "MX".to_string(),
            shipping_tier: ShippingTier::Standard,
            payment_method: PaymentMethod::Card,
            coupon_code: None,
            gift_wrap: false,
            shipping: ShippingDetails {
                name: "Ana García".to_string(),
                address: "Av. Chapultepec 123".to_string(),
                city: "Guadalajara".to_string(),
                postal_code: "44100".to_string(),
                phone: "+52 33 1234 5678".to_string(),
            },
            notes: None,
            expected_total_cents: None,
        }
    }

    #[tokio::test]
    async fn test_domestic_order_totals() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let service = CheckoutService::new(f.db.clone());
        let receipt = service.process_order(request(&f.user_id)).await.unwrap();

        // 1000.00 + 160.00 IVA + 99.00 shipping = 1259.00
        assert_eq!(receipt.order.subtotal_cents, 100_000);
        assert_eq!(receipt.order.tax_cents, 16_000);
        assert_eq!(receipt.order.tax_name, "IVA");
        assert_eq!(receipt.order.shipping_cents, 9_900);
        assert_eq!(receipt.order.total_cents, 125_900);
        assert_eq!(receipt.order.currency_code, "MXN");
    }

    #[tokio::test]
    async fn test_order_side_effects() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 3).await.unwrap();

        let service = CheckoutService::new(f.db.clone());
        let receipt = service.process_order(request(&f.user_id)).await.unwrap();

        // Stock decremented
        let product = f.db.products().get_by_id(&f.product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 7);

        // Cart cleared
        assert!(f.db.carts().get_items(&f.user_id).await.unwrap().is_empty());

        // Order and items persisted with snapshots
        let stored = f.db.orders().get_by_id(&receipt.order.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, receipt.order.total_cents);
        let items = f.db.orders().get_items(&receipt.order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name_snapshot, "Stratocaster");
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].line_total_cents, 300_000);
    }

    #[tokio::test]
    async fn test_free_shipping_over_threshold() {
        let f = fixture().await;
        // 1600.00 MXN clears the 1500 threshold
        f.db.carts().add_item(&f.user_id, &f.product_id, 2).await.unwrap();
        let extra = ProductRepository::new_product("Strap", "accessories", 60_000, 5);
        f.db.products().insert(&extra).await.unwrap();
        f.db.carts().add_item(&f.user_id, &extra.id, 1).await.unwrap();

        let service = CheckoutService::new(f.db.clone());
        let receipt = service.process_order(request(&f.user_id)).await.unwrap();

        assert_eq!(receipt.order.subtotal_cents, 260_000);
        assert_eq!(receipt.order.shipping_cents, 0);
        assert!(receipt.totals.shipping.is_free);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let f = fixture().await;
        let scarce = ProductRepository::new_product("Limited", "guitars", 50_000, 2);
        f.db.products().insert(&scarce).await.unwrap();

        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();
        f.db.carts().add_item(&f.user_id, &scarce.id, 3).await.unwrap();

        let service = CheckoutService::new(f.db.clone());
        let err = service.process_order(request(&f.user_id)).await.unwrap_err();

        match err {
            CheckoutError::StockConflict {
                product_id,
                requested,
                available,
            } => {
                assert_eq!(product_id, scarce.id);
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected StockConflict, got {other:?}"),
        }

        // Nothing was written: both stocks intact, cart intact, no orders
        let first = f.db.products().get_by_id(&f.product_id).await.unwrap().unwrap();
        assert_eq!(first.stock, 10);
        let second = f.db.products().get_by_id(&scarce.id).await.unwrap().unwrap();
        assert_eq!(second.stock, 2);
        assert_eq!(f.db.carts().get_items(&f.user_id).await.unwrap().len(), 2);
        assert_eq!(f.db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_percentage_coupon_with_cap() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        // SAVE10: 10%, capped at 50.00
        let coupon = Coupon {
            max_discount_cents: Some(5_000),
            ..CouponRepository::new_coupon("SAVE10", DiscountType::Percentage, 1000)
        };
        f.db.coupons().insert(&coupon).await.unwrap();

        let mut req = request(&f.user_id);
        req.coupon_code = Some("save10".to_string());

        let service = CheckoutService::new(f.db.clone());
        let receipt = service.process_order(req).await.unwrap();

        assert_eq!(receipt.order.discount_cents, 5_000);
        assert_eq!(receipt.order.total_cents, 120_900);
        assert_eq!(receipt.order.coupon_code.as_deref(), Some("SAVE10"));

        // Redemption recorded and counted
        let stored = f.db.coupons().get_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(stored.used_count, 1);
        assert!(f
            .db
            .coupons()
            .has_user_redeemed(&coupon.id, &f.user_id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_free_shipping_coupon_zeroes_shipping() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let coupon = CouponRepository::new_coupon("ENVIOGRATIS", DiscountType::FreeShipping, 0);
        f.db.coupons().insert(&coupon).await.unwrap();

        let mut req = request(&f.user_id);
        req.coupon_code = Some("ENVIOGRATIS".to_string());

        let service = CheckoutService::new(f.db.clone());
        let receipt = service.process_order(req).await.unwrap();

        assert_eq!(receipt.order.shipping_cents, 0);
        assert_eq!(receipt.order.discount_cents, 0);
        assert_eq!(receipt.order.total_cents, 116_000);
    }

    #[tokio::test]
    async fn test_restricted_coupon_rejected_for_other_customer() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let coupon = Coupon {
            restricted_email: Some("vip@example.com".to_string()),
            ..CouponRepository::new_coupon("VIPONLY", DiscountType::Fixed, 10_000)
        };
        f.db.coupons().insert(&coupon).await.unwrap();

        let mut req = request(&f.user_id);
        req.coupon_code = Some("VIPONLY".to_string());

        let service = CheckoutService::new(f.db.clone());
        let err = service.process_order(req).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Coupon(CouponRejection::RestrictedEmail)
        ));

        // Rejection happened before any write
        assert_eq!(f.db.orders().count().await.unwrap(), 0);
        assert_eq!(f.db.carts().get_items(&f.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_coupon_rejected() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let coupon = Coupon {
            max_uses: Some(5),
            used_count: 5,
            ..CouponRepository::new_coupon("GONE", DiscountType::Fixed, 1_000)
        };
        f.db.coupons().insert(&coupon).await.unwrap();

        let mut req = request(&f.user_id);
        req.coupon_code = Some("GONE".to_string());

        let service = CheckoutService::new(f.db.clone());
        let err = service.process_order(req).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Coupon(CouponRejection::UsageLimit)
        ));
    }

    #[tokio::test]
    async fn test_one_per_user_public_coupon_rejected_on_second_order() {
        let f = fixture().await;

        // Public code, no email restriction, but single-use per customer.
        let coupon = Coupon {
            one_per_user: true,
            ..CouponRepository::new_coupon("ONCE", DiscountType::Fixed, 5_000)
        };
        f.db.coupons().insert(&coupon).await.unwrap();

        let service = CheckoutService::new(f.db.clone());
        let mut req = request(&f.user_id);
        req.coupon_code = Some("ONCE".to_string());

        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();
        service.process_order(req.clone()).await.unwrap();

        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();
        let err = service.process_order(req).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Coupon(CouponRejection::AlreadyUsed)
        ));
    }

    #[tokio::test]
    async fn test_order_from_request_lines_skips_cart() {
        let f = fixture().await;
        // Something else sits in the cart; the explicit lines win.
        let other = ProductRepository::new_product("Tuner", "accessories", 30_000, 5);
        f.db.products().insert(&other).await.unwrap();
        f.db.carts().add_item(&f.user_id, &other.id, 1).await.unwrap();

        let mut req = request(&f.user_id);
        req.items = Some(vec![OrderLine {
            product_id: f.product_id.clone(),
            quantity: 2,
        }]);

        let service = CheckoutService::new(f.db.clone());
        let receipt = service.process_order(req).await.unwrap();

        assert_eq!(receipt.order.subtotal_cents, 200_000);
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].product_id, f.product_id);

        let product = f.db.products().get_by_id(&f.product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 8);
    }

    #[tokio::test]
    async fn test_request_lines_checked_against_stock() {
        let f = fixture().await;

        let mut req = request(&f.user_id);
        req.items = Some(vec![OrderLine {
            product_id: f.product_id.clone(),
            quantity: 11,
        }]);

        let service = CheckoutService::new(f.db.clone());
        let err = service.process_order(req).await.unwrap_err();
        assert!(matches!(err, CheckoutError::StockConflict { available: 10, .. }));

        let product = f.db.products().get_by_id(&f.product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 10);
    }

    #[tokio::test]
    async fn test_validate_coupon_standalone() {
        let f = fixture().await;

        let coupon = Coupon {
            max_discount_cents: Some(5_000),
            ..CouponRepository::new_coupon("SAVE10", DiscountType::Percentage, 1_000)
        };
        f.db.coupons().insert(&coupon).await.unwrap();

        let service = CheckoutService::new(f.db.clone());
        let (found, grant) = service
            .validate_coupon("save10", "ana@example.com", &f.user_id, BaseMoney::from_cents(100_000))
            .await
            .unwrap();

        assert_eq!(found.code, "SAVE10");
        assert_eq!(grant.discount, BaseMoney::from_cents(5_000));

        // Nothing was consumed by the check.
        let unchanged = f.db.coupons().get_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(unchanged.used_count, 0);
    }

    #[tokio::test]
    async fn test_usage_cap_race_caught_by_conditional_increment() {
        // Validation sees an unexhausted coupon, but by consumption time the
        // last use is gone. The guarded UPDATE must catch it.
        let f = fixture().await;

        let coupon = Coupon {
            max_uses: Some(1),
            ..CouponRepository::new_coupon("LAST1", DiscountType::Fixed, 1_000)
        };
        f.db.coupons().insert(&coupon).await.unwrap();

        let service = CheckoutService::new(f.db.clone());
        let now = Utc::now();

        let mut tx = f.db.pool().begin().await.unwrap();
        service
            .consume_coupon(&mut tx, &coupon, &f.user_id, "order-a", now)
            .await
            .unwrap();

        // Same stale snapshot, second redemption
        let err = service
            .consume_coupon(&mut tx, &coupon, &f.user_id, "order-b", now)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::CouponConflict));
    }

    #[tokio::test]
    async fn test_unknown_coupon_rejected() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let mut req = request(&f.user_id);
        req.coupon_code = Some("NOSUCHCODE".to_string());

        let service = CheckoutService::new(f.db.clone());
        let err = service.process_order(req).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Coupon(CouponRejection::NotFound)));
    }

    #[tokio::test]
    async fn test_payment_method_sets_initial_status() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let service = CheckoutService::new(f.db.clone());

        let mut req = request(&f.user_id);
        req.payment_method = PaymentMethod::Transfer;
        let receipt = service.process_order(req).await.unwrap();
        assert_eq!(receipt.order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let f = fixture().await;
        let service = CheckoutService::new(f.db.clone());
        let err = service.process_order(request(&f.user_id)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_missing_shipping_field_rejected() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let mut req = request(&f.user_id);
        req.shipping.city = "  ".to_string();

        let service = CheckoutService::new(f.db.clone());
        let err = service.process_order(req).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[tokio::test]
    async fn test_client_total_mismatch_does_not_block() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let mut req = request(&f.user_id);
        req.expected_total_cents = Some(1); // wildly wrong

        let service = CheckoutService::new(f.db.clone());
        let receipt = service.process_order(req).await.unwrap();
        // Server figure wins
        assert_eq!(receipt.order.total_cents, 125_900);
    }

    #[tokio::test]
    async fn test_gift_wrap_charged_once() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 2).await.unwrap();

        let mut req = request(&f.user_id);
        req.gift_wrap = true;

        let service = CheckoutService::new(f.db.clone());
        let receipt = service.process_order(req).await.unwrap();
        assert_eq!(receipt.order.gift_wrap_cents, 2_000);
        // 2000.00 subtotal clears free shipping; + 320 tax + 20 wrap
        assert_eq!(receipt.order.total_cents, 234_000);
    }

    #[tokio::test]
    async fn test_international_order_converts_shipping() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let mut req = request(&f.user_id);
        req.country = "US".to_string();

        let service = CheckoutService::new(f.db.clone());
        let receipt = service.process_order(req).await.unwrap();

        // 8.25% sales tax, 15 USD tariff in base cents
        assert_eq!(receipt.order.tax_cents, 8_250);
        assert_eq!(receipt.order.shipping_cents, 25_862);
        assert_eq!(receipt.order.currency_code, "USD");
        assert_eq!(receipt.order.shipping_country, "US");
    }

    #[tokio::test]
    async fn test_cancel_restores_stock() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 4).await.unwrap();

        let service = CheckoutService::new(f.db.clone());
        let receipt = service.process_order(request(&f.user_id)).await.unwrap();

        let after_sale = f.db.products().get_by_id(&f.product_id).await.unwrap().unwrap();
        assert_eq!(after_sale.stock, 6);

        let cancelled = f.db.orders().cancel(&receipt.order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let restored = f.db.products().get_by_id(&f.product_id).await.unwrap().unwrap();
        assert_eq!(restored.stock, 10);

        // A delivered pipeline cannot restart from cancelled
        assert!(f
            .db
            .orders()
            .update_status(&receipt.order.id, OrderStatus::Shipped)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_quote_does_not_mutate() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let service = CheckoutService::new(f.db.clone());
        let quote = service
            .quote(&f.user_id, "MX", ShippingTier::Standard, None, false)
            .await
            .unwrap();

        assert_eq!(quote.totals.total.cents(), 125_900);
        assert_eq!(quote.item_count, 1);

        let product = f.db.products().get_by_id(&f.product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 10);
        assert_eq!(f.db.carts().get_items(&f.user_id).await.unwrap().len(), 1);
    }

    // -------------------------------------------------------------------------
    // Notifier behavior
    // -------------------------------------------------------------------------

    struct RecordingNotifier {
        orders: Mutex<Vec<String>>,
        fail: bool,
    }

    impl OrderNotifier for RecordingNotifier {
        fn order_placed(&self, order: &Order, _items: &[OrderItem]) -> Result<(), String> {
            self.orders.lock().unwrap().push(order.id.clone());
            if self.fail {
                Err("smtp down".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_notifier_invoked_after_commit() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let notifier = RecordingNotifier {
            orders: Mutex::new(Vec::new()),
            fail: false,
        };
        let service = CheckoutService::with_notifier(f.db.clone(), notifier);
        let receipt = service.process_order(request(&f.user_id)).await.unwrap();

        let seen = service.notifier.orders.lock().unwrap();
        assert_eq!(seen.as_slice(), [receipt.order.id.clone()]);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_undo_order() {
        let f = fixture().await;
        f.db.carts().add_item(&f.user_id, &f.product_id, 1).await.unwrap();

        let notifier = RecordingNotifier {
            orders: Mutex::new(Vec::new()),
            fail: true,
        };
        let service = CheckoutService::with_notifier(f.db.clone(), notifier);
        let receipt = service.process_order(request(&f.user_id)).await.unwrap();

        // Order persisted despite the notification failure
        let stored = f.db.orders().get_by_id(&receipt.order.id).await.unwrap();
        assert!(stored.is_some());
    }
}
