//! Pedidos Common Library
//!
//! Shared code for the Pedidos order-management service including:
//! - Database entities, schema bootstrap and repository
//! - Order fulfillment routing
//! - Error types and handling
//! - Configuration management
//! - Authentication, sessions and ownership rules
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod fulfillment;
pub mod metrics;
pub mod redirect;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{DbPool, Repository};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
