//! # Repository Module
//!
//! Database repository implementations for the Tempo storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Request handler                                                        │
//! │       │                                                                 │
//! │       │  db.products().get_by_id(id)                                   │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list_active(&self, limit)                                         │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, product)                                            │
//! │  └── adjust_stock(&self, id, delta)                                    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD and stock adjustments
//! - [`coupon::CouponRepository`] - Coupon lookup and usage tracking
//! - [`order::OrderRepository`] - Order reads and status transitions
//! - [`cart::CartRepository`] - Cart line management
//! - [`user::UserRepository`] - User lookup

pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;
pub mod user;
