//! # course-core: Pure Business Logic for the Course Market
//!
//! This crate holds the marketplace's domain types and rules as pure
//! functions with zero I/O dependencies.
//!
//! ## Where It Sits
//! ```text
//!   web front door ──Actor──► course-market ──► course-db ──► SQLite
//!                                  │                │
//!                                  └──── course-core ◄┘
//!                                  (types, Money, pricing, credits, rules)
//! ```
//!
//! Nothing here does I/O. Order pricing and settlement credits are computed
//! from plain values, so they are tested without a pool.
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Account, Course, CourseSnapshot, Order, ...)
//! - [`money`] - Fixed-point Money with a single-step carry
//! - [`checkout`] - Order pricing and settlement credit rules
//! - [`error`] - Domain error types
//! - [`validation`] - Field rules for commands
//!
//! ## Example Usage
//!
//! ```rust
//! use course_core::money::Money;
//!
//! let price: Money = "10.99".parse().unwrap();
//! let total = price + "0.05".parse::<Money>().unwrap();
//! assert_eq!(total.to_string(), "11.04");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Constants
// =============================================================================

/// Default number of courses returned by a listing.
pub const DEFAULT_LISTING_LIMIT: u32 = 50;

/// Avatar assigned to freshly registered accounts.
pub const DEFAULT_AVATAR: &str = "/media/default.png";
