//! # Repository Module
//!
//! Database repository implementations for Meridian POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  REST handler                                                           │
//! │       │                                                                 │
//! │       │  db.customers().get_by_loyalty_number("ABC123")                │
//! │       ▼                                                                 │
//! │  CustomerRepository                                                    │
//! │  ├── get_by_loyalty_number(&self, number)                              │
//! │  ├── search(&self, query)                                              │
//! │  └── enroll(&self, new)                                                │
//! │       │                                                                 │
//! │       │  Parameterized SQL                                             │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  SQL is isolated here; handlers never see a raw query.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, search, bulk ops
//! - [`customer::CustomerRepository`] - Loyalty accounts
//! - [`transaction::TransactionRepository`] - The atomic checkout block
//! - [`location::LocationRepository`] - Store locations
//! - [`settings::SettingsRepository`] - User + system settings
//! - [`analytics::AnalyticsRepository`] - Dashboard aggregates

pub mod analytics;
pub mod customer;
pub mod location;
pub mod product;
pub mod settings;
pub mod transaction;
