//! # tempo-db: Database Layer for the Tempo Storefront
//!
//! This crate provides database access for the Tempo storefront.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Tempo Storefront Data Flow                         │
//! │                                                                         │
//! │  Request handler (place order)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tempo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │   Database    │   │  Repositories │   │   Checkout   │    │   │
//! │  │   │   (pool.rs)   │   │ (product.rs,  │   │  (checkout.  │    │   │
//! │  │   │               │   │  coupon.rs,   │   │     rs)      │    │   │
//! │  │   │ SqlitePool    │◄──│  order.rs,    │◄──│ the one      │    │   │
//! │  │   │ Migrations    │   │  cart.rs,     │   │ write path   │    │   │
//! │  │   │               │   │  user.rs)     │   │ for orders   │    │   │
//! │  │   └───────────────┘   └───────────────┘   └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (tempo.db)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`checkout`] - The transactional checkout service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tempo_db::{CheckoutService, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/tempo.db")).await?;
//!
//! let checkout = CheckoutService::new(db.clone());
//! let receipt = checkout.process_order(request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use checkout::{
    CheckoutError, CheckoutQuote, CheckoutReceipt, CheckoutRequest, CheckoutService,
    LogNotifier, NoopNotifier, OrderLine, OrderNotifier, ShippingDetails,
};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::coupon::CouponRepository;
pub use repository::order::OrderRepository;
pub use repository::product::{ProductRepository, ProductSales, SalesSummary};
pub use repository::user::UserRepository;
