//! # Domain Types
//!
//! Core domain types used throughout the course marketplace.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │    Account      │   │     Course       │   │ CourseSnapshot  │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  role           │◄──│  seller_id       │◄──│  course_id      │      │
//! │  │  balance        │   │  published       │   │  title/content  │      │
//! │  └─────────────────┘   │  deleted, sales  │   │  price (frozen) │      │
//! │          ▲             └──────────────────┘   └────────▲────────┘      │
//! │          │                      ▲                      │               │
//! │  ┌───────┴─────────┐   ┌────────┴─────────┐   ┌────────┴────────┐      │
//! │  │     Order       │   │      Cart        │   │  OrderDetail    │      │
//! │  │  buyer_id       │   │  buyer_id        │   │  order_id       │      │
//! │  │  total, paid    │◄──│  course_id       │   │  snapshot_id    │      │
//! │  └─────────────────┘   └──────────────────┘   └─────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Money columns are kept as two integers on the row types so they map
//! directly onto the schema; accessors hand out [`Money`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Timestamp layout used in every API payload.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

// =============================================================================
// Account
// =============================================================================

/// Marketplace role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// Browses, adds to cart, places and pays orders.
    Buyer = 0,
    /// Authors courses and accrues balance from sales.
    Seller = 1,
}

impl TryFrom<i64> for AccountRole {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AccountRole::Buyer),
            1 => Ok(AccountRole::Seller),
            other => Err(CoreError::Validation(
                crate::error::ValidationError::invalid("role", format!("unknown role {}", other)),
            )),
        }
    }
}

/// A marketplace account with its profile and balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: AccountRole,
    pub nickname: String,
    pub avatar: String,
    pub balance_integer: i64,
    pub balance_fractional: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Returns the accrued balance.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_stored(self.balance_integer, self.balance_fractional)
    }

    /// Name shown next to a course: nickname when set, else username.
    pub fn display_name(&self) -> &str {
        if self.nickname.is_empty() {
            &self.username
        } else {
            &self.nickname
        }
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The already-authenticated caller of a command.
///
/// Resolved by the external auth/session collaborator and passed explicitly
/// into every operation; the core never looks identity up on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub account_id: i64,
    pub role: AccountRole,
}

impl Actor {
    pub fn buyer(account_id: i64) -> Self {
        Actor {
            account_id,
            role: AccountRole::Buyer,
        }
    }

    pub fn seller(account_id: i64) -> Self {
        Actor {
            account_id,
            role: AccountRole::Seller,
        }
    }

    /// Returns the buyer's account id, or `NotBuyer`.
    pub fn require_buyer(&self) -> CoreResult<i64> {
        match self.role {
            AccountRole::Buyer => Ok(self.account_id),
            AccountRole::Seller => Err(CoreError::NotBuyer {
                account_id: self.account_id,
            }),
        }
    }

    /// Returns the seller's account id, or `NotSeller`.
    pub fn require_seller(&self) -> CoreResult<i64> {
        match self.role {
            AccountRole::Seller => Ok(self.account_id),
            AccountRole::Buyer => Err(CoreError::NotSeller {
                account_id: self.account_id,
            }),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A course owned by a seller. Its content lives in snapshots.
///
/// ## Soft Delete
/// `deleted = true` also forces `published = false`. Deleted courses are
/// still returned by direct lookup but never by listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub seller_id: i64,
    pub published: bool,
    pub deleted: bool,
    pub sales: i64,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Whether buyers can see and add this course.
    #[inline]
    pub fn is_listed(&self) -> bool {
        self.published && !self.deleted
    }

    /// Checks that `seller_id` owns this course.
    pub fn ensure_owned_by(&self, seller_id: i64) -> CoreResult<()> {
        if self.seller_id == seller_id {
            Ok(())
        } else {
            Err(CoreError::NotOwner {
                course_id: self.id,
                account_id: seller_id,
            })
        }
    }
}

/// A label attached to courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CourseTag {
    pub id: i64,
    pub name: String,
}

/// Immutable version of a course's editable content.
///
/// Editing a course appends a new snapshot; the newest one (greatest id) is
/// the course's current state. Order lines point at snapshots, so a placed
/// order keeps the title and price the buyer actually paid for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CourseSnapshot {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub content: String,
    pub cover: String,
    pub price_integer: i64,
    pub price_fractional: i64,
    pub created_at: DateTime<Utc>,
}

impl CourseSnapshot {
    /// Returns the price frozen in this snapshot.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_stored(self.price_integer, self.price_fractional)
    }
}

/// Validated content for a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnapshot {
    pub title: String,
    pub content: String,
    pub cover: String,
    pub price: Money,
}

// =============================================================================
// Cart
// =============================================================================

/// One pending-purchase intent. At most one per (buyer, course).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: i64,
    pub buyer_id: i64,
    pub course_id: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Orders
// =============================================================================

/// An immutable purchase record. `paid` only ever moves false → true.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    pub total_integer: i64,
    pub total_fractional: i64,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_stored(self.total_integer, self.total_fractional)
    }
}

/// One purchased course, pinned to the snapshot bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderDetail {
    pub id: i64,
    pub order_id: i64,
    pub snapshot_id: i64,
}

/// A paid order line resolved to the seller who gets credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SettlementLine {
    pub course_id: i64,
    pub seller_id: i64,
    pub price_integer: i64,
    pub price_fractional: i64,
}

impl SettlementLine {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_stored(self.price_integer, self.price_fractional)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn course(seller_id: i64, published: bool, deleted: bool) -> Course {
        Course {
            id: 1,
            title: "Rust for Sellers".to_string(),
            seller_id,
            published,
            deleted,
            sales: 0,
            pinned: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_actor_role_checks() {
        assert_eq!(Actor::buyer(4).require_buyer().unwrap(), 4);
        assert!(matches!(
            Actor::buyer(4).require_seller(),
            Err(CoreError::NotSeller { account_id: 4 })
        ));
        assert_eq!(Actor::seller(9).require_seller().unwrap(), 9);
        assert!(matches!(
            Actor::seller(9).require_buyer(),
            Err(CoreError::NotBuyer { account_id: 9 })
        ));
    }

    #[test]
    fn test_course_listing_and_ownership() {
        assert!(course(1, true, false).is_listed());
        assert!(!course(1, false, false).is_listed());
        assert!(!course(1, true, true).is_listed());

        assert!(course(1, true, false).ensure_owned_by(1).is_ok());
        assert!(matches!(
            course(1, true, false).ensure_owned_by(2),
            Err(CoreError::NotOwner { course_id: 1, account_id: 2 })
        ));
    }

    #[test]
    fn test_role_from_integer() {
        assert_eq!(AccountRole::try_from(0).unwrap(), AccountRole::Buyer);
        assert_eq!(AccountRole::try_from(1).unwrap(), AccountRole::Seller);
        assert!(AccountRole::try_from(2).is_err());
    }

    #[test]
    fn test_display_name_prefers_nickname() {
        let mut account = Account {
            id: 1,
            username: "rustacean".to_string(),
            email: "r@example.com".to_string(),
            role: AccountRole::Seller,
            nickname: String::new(),
            avatar: "/media/default.png".to_string(),
            balance_integer: 0,
            balance_fractional: 0,
            created_at: Utc::now(),
        };
        assert_eq!(account.display_name(), "rustacean");

        account.nickname = "Ferris".to_string();
        assert_eq!(account.display_name(), "Ferris");
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_timestamp(&at), "2024-03-09 07:05:01");
    }
}
