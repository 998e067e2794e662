//! # Domain Types
//!
//! Core domain types used throughout the Tempo storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  order_id (FK)  │       │
//! │  │  price_cents    │   │  status         │   │  name_snapshot  │       │
//! │  │  stock          │   │  total_cents    │   │  unit_price     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │   OrderStatus   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Pending        │   │  Card           │       │
//! │  │  1600 = 16%     │   │  Paid, Shipped  │   │  Transfer       │       │
//! │  └─────────────────┘   │  Delivered, ... │   │  CashVoucher    │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Order line items copy product name and unit price at purchase time so
//! later catalog edits never alter historical orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::BaseMoney;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1600 bps = 16% (Mexican IVA), 825 bps = 8.25% (US sales tax average)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Optional long description.
    pub description: Option<String>,

    /// Catalog category (used by the sales reports).
    pub category: String,

    /// Price in base-currency cents.
    pub price_cents: i64,

    /// Units currently in stock. The checkout decrement is conditional on
    /// this never going negative.
    pub stock: i64,

    /// Optional image path.
    pub image: Option<String>,

    /// Shown on the storefront landing page.
    pub is_featured: bool,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as typed base money.
    #[inline]
    pub fn price(&self) -> BaseMoney {
        BaseMoney::from_cents(self.price_cents)
    }

    /// Checks whether the requested quantity can be fulfilled.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.is_active && self.stock >= quantity
    }
}

// =============================================================================
// User
// =============================================================================

/// A storefront account, as the checkout needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cart
// =============================================================================

/// A stored cart line, joined with current product data.
///
/// Unlike order items this is NOT a snapshot: the cart always reflects the
/// live catalog price, and the price only freezes at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub image: Option<String>,
}

impl CartItem {
    /// Line total at the live catalog price.
    pub fn line_total(&self) -> BaseMoney {
        BaseMoney::from_cents(self.price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
///
/// Wire values are the Spanish strings the production database uses.
///
/// ## State Machine
/// ```text
/// pendiente ──► pagado ──► enviado ──► entregado
///     │            │
///     └────────────┴─────► cancelado
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum OrderStatus {
    /// Awaiting payment (bank transfer / cash voucher orders).
    #[serde(rename = "pendiente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pendiente"))]
    Pending,
    /// Payment confirmed.
    #[serde(rename = "pagado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pagado"))]
    Paid,
    /// Handed to the carrier.
    #[serde(rename = "enviado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "enviado"))]
    Shipped,
    /// Confirmed received.
    #[serde(rename = "entregado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "entregado"))]
    Delivered,
    /// Cancelled before shipment.
    #[serde(rename = "cancelado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelado"))]
    Cancelled,
}

impl OrderStatus {
    /// Whether an admin action may move an order from `self` to `next`.
    ///
    /// Creation is system-assigned (see [`PaymentMethod::initial_status`]);
    /// every later transition goes through this check.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Cancelled) | (Paid, Shipped) | (Paid, Cancelled) | (Shipped, Delivered)
        )
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit/debit card, captured at checkout.
    Card,
    /// Bank transfer, confirmed manually by an admin.
    Transfer,
    /// Convenience-store cash voucher, confirmed on payment.
    CashVoucher,
}

impl PaymentMethod {
    /// Status a freshly created order starts in.
    ///
    /// Card payments settle during checkout, so the order is born paid;
    /// everything else waits for manual confirmation.
    pub fn initial_status(&self) -> OrderStatus {
        match self {
            PaymentMethod::Card => OrderStatus::Paid,
            PaymentMethod::Transfer | PaymentMethod::CashVoucher => OrderStatus::Pending,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order: a frozen snapshot of totals at purchase time.
///
/// All monetary columns are base-currency cents. `currency_code` and
/// `currency_symbol` record what the customer saw, for rendering only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub tax_name: String,
    pub shipping_cents: i64,
    pub discount_cents: i64,
    pub gift_wrap: bool,
    pub gift_wrap_cents: i64,
    pub total_cents: i64,
    pub coupon_code: Option<String>,
    pub currency_code: String,
    pub currency_symbol: String,
    pub payment_method: PaymentMethod,
    pub shipping_name: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_phone: String,
    pub shipping_country: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the grand total as typed base money.
    #[inline]
    pub fn total(&self) -> BaseMoney {
        BaseMoney::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses the snapshot pattern to freeze product data at purchase time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at purchase time (frozen).
    pub name_snapshot: String,
    /// Unit price in base cents at purchase time (frozen).
    pub unit_price_cents: i64,
    /// Quantity purchased.
    pub quantity: i64,
    /// Line total before tax (unit_price × quantity).
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the line total as typed base money.
    #[inline]
    pub fn line_total(&self) -> BaseMoney {
        BaseMoney::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
