//! # meridian-server: REST API for Meridian POS
//!
//! Axum HTTP layer over [`meridian_db`] and [`meridian_core`].
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Web client ──► axum Router ──► handler (routes/*)                     │
//! │                                    │                                    │
//! │                                    ├── validate (meridian-core)        │
//! │                                    ├── compute  (meridian-core)        │
//! │                                    └── persist  (meridian-db)          │
//! │                                    │                                    │
//! │                      Json<T> or ApiError (status + JSON body)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers stay thin: validation and pricing live in meridian-core,
//! SQL lives in meridian-db, and this crate only wires HTTP to both.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorCode};
pub use routes::{build_app, build_router};
pub use state::AppState;
