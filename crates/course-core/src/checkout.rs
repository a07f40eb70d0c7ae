//! # Checkout Rules
//!
//! Pure decisions behind order placement and settlement. The database layer
//! loads rows, calls into here, and writes the results back inside one
//! transaction.
//!
//! ## Flow
//! ```text
//! Cart rows ──► ensure_in_cart ──► latest snapshots ──► price_order ──► Order.total
//!
//! Order lines ──► seller_credits ──► Account.balance += credit (per seller)
//!             └─► course_sales   ──► Course.sales    += count  (per course)
//! ```

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CourseSnapshot, SettlementLine};

/// Checks that every requested course is in the buyer's cart.
///
/// Fails on the first requested id that has no cart row, before anything is
/// mutated.
///
/// ## Example
/// ```rust
/// use course_core::checkout::ensure_in_cart;
///
/// assert!(ensure_in_cart(&[1, 2], &[2, 1, 9]).is_ok());
/// assert!(ensure_in_cart(&[1, 2], &[1]).is_err());
/// ```
pub fn ensure_in_cart(requested: &[i64], cart_course_ids: &[i64]) -> CoreResult<()> {
    match requested.iter().find(|id| !cart_course_ids.contains(id)) {
        Some(&course_id) => Err(CoreError::NotInCart { course_id }),
        None => Ok(()),
    }
}

/// Sums the prices of the snapshots being bought.
pub fn price_order<'a, I>(snapshots: I) -> Money
where
    I: IntoIterator<Item = &'a CourseSnapshot>,
{
    snapshots.into_iter().map(CourseSnapshot::price).sum()
}

/// Groups paid lines by seller and sums what each one earned.
///
/// Crediting the per-seller sum once is equivalent to crediting every line
/// one at a time: `Money::add` carries exactly, so the order of additions
/// does not matter.
pub fn seller_credits(lines: &[SettlementLine]) -> BTreeMap<i64, Money> {
    let mut credits: BTreeMap<i64, Money> = BTreeMap::new();

    for line in lines {
        *credits.entry(line.seller_id).or_default() += line.price();
    }

    credits
}

/// Counts how many copies of each course an order sold.
pub fn course_sales(lines: &[SettlementLine]) -> BTreeMap<i64, i64> {
    let mut sales: BTreeMap<i64, i64> = BTreeMap::new();

    for line in lines {
        *sales.entry(line.course_id).or_default() += 1;
    }

    sales
}

// =============================================================================
// Unit Tests
// =============================================================================
