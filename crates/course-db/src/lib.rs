//! # course-db: SQLite Storage for the Course Market
//!
//! Repositories over one shared `SqlitePool`. Reads go straight to the pool;
//! the two checkout operations hold a single transaction each.
//!
//! ```text
//!  place_order(buyer, [c1, c2])                 pay_order(order)
//!  ─────────────────────────────                ──────────────────────────
//!  BEGIN                                        BEGIN
//!   check every course is in the cart            paid 0 → 1 (exactly once)
//!   INSERT orders (price 0)                      JOIN details → snapshots
//!   per course:                                  per seller: balance += Σ
//!     latest snapshot → INSERT order_details     per course: sales += 1
//!     DELETE cart row                           COMMIT
//!   price = Σ snapshot prices
//!  COMMIT
//! ```
//!
//! - [`pool`] opens the database and hands out repositories
//! - [`migrations`] embedded schema
//! - [`error`] [`DbError`]
//! - [`repository`] accounts, courses and tags, carts, orders
//!
//! ```rust,ignore
//! use course_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("market.db")).await?;
//! let order_id = db.orders().place_order(buyer_id, &[3, 5]).await?;
//! db.orders().pay_order(order_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};

pub use repository::account::AccountRepository;
pub use repository::cart::CartRepository;
pub use repository::course::{CourseRepository, Listing};
pub use repository::order::OrderRepository;
