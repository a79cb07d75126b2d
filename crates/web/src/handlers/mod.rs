//! Request handlers
//!
//! Pages are rendered as JSON view models; every successful mutation answers
//! with a `302 Found` to the next page.

pub mod accounts;
pub mod catalog;
pub mod fulfillment;
pub mod health;
pub mod orders;
