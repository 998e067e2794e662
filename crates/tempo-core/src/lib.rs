//! # Tempo Core
//!
//! Pure business logic for the Tempo storefront: money, currency
//! conversion, country pricing tables, the tax/shipping/totals pipeline,
//! and coupon redemption rules.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           tempo-core                                │
//! │                                                                     │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────────┐    │
//! │  │  money   │  │ currency │  │ country  │  │     pricing      │    │
//! │  │ Base /   │──│ rates +  │──│ tax +    │──│ tax, shipping,   │    │
//! │  │ Local    │  │ convert  │  │ shipping │  │ totals           │    │
//! │  └──────────┘  └──────────┘  └──────────┘  └──────────────────┘    │
//! │                                                                     │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐                          │
//! │  │  coupon  │  │  types   │  │validation│                          │
//! │  └──────────┘  └──────────┘  └──────────┘                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This crate performs no I/O. Persistence and the checkout transaction
//! live in `tempo-db`, which consumes these types.

pub mod country;
pub mod coupon;
pub mod currency;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// Re-export the primary types at crate root for ergonomic imports.
pub use country::{all_countries, Country, CountryConfig, CountrySummary};
pub use coupon::{
    evaluate as evaluate_coupon, Coupon, CouponGrant, CouponRejection, DiscountType,
    RedemptionContext,
};
pub use currency::{Currency, RATE_SCALE};
pub use error::{CoreError, ValidationError};
pub use money::{BaseMoney, LocalMoney};
pub use pricing::{
    calculate_shipping, calculate_tax, calculate_totals, ShippingQuote, ShippingTier,
    TaxBreakdown, TotalsBreakdown, GIFT_WRAP_FEE,
};
pub use types::{
    CartItem, Order, OrderItem, OrderStatus, PaymentMethod, Product, TaxRate, User,
};

/// Maximum quantity for a single cart line.
pub const MAX_ITEM_QUANTITY: i64 = 999;
