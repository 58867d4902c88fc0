//! Bazaar Core - Shared domain types.
//!
//! This crate provides common types used across all Bazaar components:
//! - `api` - JSON HTTP service
//! - `worker` - Background maintenance loops
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Order pricing lives here so every component computes
//! totals the same way.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, prices, ratings, stock and statuses
//! - [`pricing`] - Order total calculation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{OrderTotals, SHIPPING_COST, TAX_RATE, line_subtotal};
pub use types::*;
