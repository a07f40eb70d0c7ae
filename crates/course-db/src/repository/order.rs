//! # Order Repository
//!
//! Checkout workflows: converting cart rows into an order, and settling an
//! order by crediting the sellers involved.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. PLACE (one transaction)                                            │
//! │     └── place_order(buyer, [A, B])                                     │
//! │         ├── INSERT orders (total 0.00, paid = 0)                       │
//! │         ├── every course must have a cart row, else roll back          │
//! │         ├── per course: latest snapshot → INSERT order_details         │
//! │         │                               → DELETE cart row              │
//! │         └── UPDATE orders.total = Σ snapshot prices                    │
//! │                                                                         │
//! │  2. PAY (one transaction)                                              │
//! │     └── pay_order(order)                                               │
//! │         ├── UPDATE orders SET paid = 1 WHERE id = ? AND paid = 0       │
//! │         │   (0 rows → rejected, nothing credited)                      │
//! │         ├── per seller: balance += Σ line prices                       │
//! │         └── per course: sales += copies sold                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both workflows run every statement on the transaction's connection, so a
//! failure at any step rolls the whole workflow back when `tx` is dropped.
//!
//! Both also open with a write. A deferred SQLite transaction that reads
//! first cannot upgrade to a writer once another checkout has committed
//! (`SQLITE_BUSY`, not retried by `busy_timeout`); one that writes first
//! queues on the lock instead.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::course::latest_snapshot;
use course_core::checkout::{course_sales, ensure_in_cart, price_order, seller_credits};
use course_core::{CoreError, Money, Order, OrderDetail, SettlementLine};

const ORDER_COLUMNS: &str =
    "id, buyer_id, total_integer, total_fractional, paid, created_at";

/// Repository for orders and settlement.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Workflows
    // =========================================================================

    /// Converts the given cart rows of `buyer_id` into a new unpaid order.
    ///
    /// `course_ids` must be non-empty and free of duplicates; the command
    /// layer validates both before calling.
    ///
    /// ## Errors
    /// - `DbError::Domain(NotInCart)` if any course has no cart row; the
    ///   cart and the orders table are left untouched
    /// - `DbError::Domain(CourseWithoutSnapshot)` if a course has no content
    ///
    /// ## Returns
    /// The new order's id.
    pub async fn place_order(&self, buyer_id: i64, course_ids: &[i64]) -> DbResult<i64> {
        debug!(buyer_id = %buyer_id, courses = ?course_ids, "Placing order");

        let mut tx = self.pool.begin().await?;

        // Opening with the write takes SQLite's write lock before any read,
        // so the cart check below sees the latest committed carts.
        let order_id = sqlx::query(
            r#"
            INSERT INTO orders (buyer_id, total_integer, total_fractional, paid, created_at)
            VALUES (?1, 0, 0, 0, ?2)
            "#,
        )
        .bind(buyer_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let in_cart: Vec<i64> = sqlx::query_scalar("SELECT course_id FROM carts WHERE buyer_id = ?1")
            .bind(buyer_id)
            .fetch_all(&mut *tx)
            .await?;

        ensure_in_cart(course_ids, &in_cart)?;

        let mut snapshots = Vec::with_capacity(course_ids.len());

        for &course_id in course_ids {
            let snapshot = latest_snapshot(&mut *tx, course_id)
                .await?
                .ok_or(CoreError::CourseWithoutSnapshot(course_id))?;

            sqlx::query("INSERT INTO order_details (order_id, snapshot_id) VALUES (?1, ?2)")
                .bind(order_id)
                .bind(snapshot.id)
                .execute(&mut *tx)
                .await?;

            let removed = sqlx::query("DELETE FROM carts WHERE buyer_id = ?1 AND course_id = ?2")
                .bind(buyer_id)
                .bind(course_id)
                .execute(&mut *tx)
                .await?;

            // A cart row converts into exactly one order line
            if removed.rows_affected() != 1 {
                return Err(CoreError::NotInCart { course_id }.into());
            }

            snapshots.push(snapshot);
        }

        let total = price_order(&snapshots);

        sqlx::query("UPDATE orders SET total_integer = ?2, total_fractional = ?3 WHERE id = ?1")
            .bind(order_id)
            .bind(total.integer())
            .bind(total.fractional())
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = %order_id, buyer_id = %buyer_id, total = %total, "Order placed");

        Ok(order_id)
    }

    /// Marks an order paid and credits every seller involved.
    ///
    /// The paid flag is flipped with a compare-and-set, so an order can be
    /// settled at most once no matter how many callers race on it.
    ///
    /// ## Errors
    /// `DbError::Domain(OrderNotPayable)` when the order does not exist or is
    /// already paid. Nothing is credited in that case.
    pub async fn pay_order(&self, order_id: i64) -> DbResult<()> {
        debug!(order_id = %order_id, "Paying order");

        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query("UPDATE orders SET paid = 1 WHERE id = ?1 AND paid = 0")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        if flipped.rows_affected() == 0 {
            return Err(CoreError::OrderNotPayable(order_id).into());
        }

        let lines = sqlx::query_as::<_, SettlementLine>(
            r#"
            SELECT
                c.id AS course_id,
                c.seller_id,
                s.price_integer,
                s.price_fractional
            FROM order_details d
            JOIN course_snapshots s ON s.id = d.snapshot_id
            JOIN courses c ON c.id = s.course_id
            WHERE d.order_id = ?1
            ORDER BY d.id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        for (seller_id, credit) in seller_credits(&lines) {
            let (integer, fractional) = sqlx::query_as::<_, (i64, i64)>(
                "SELECT balance_integer, balance_fractional FROM accounts WHERE id = ?1",
            )
            .bind(seller_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::AccountNotFound(seller_id))?;

            let balance = Money::from_stored(integer, fractional) + credit;

            sqlx::query(
                "UPDATE accounts SET balance_integer = ?2, balance_fractional = ?3 WHERE id = ?1",
            )
            .bind(seller_id)
            .bind(balance.integer())
            .bind(balance.fractional())
            .execute(&mut *tx)
            .await?;

            debug!(seller_id = %seller_id, credit = %credit, balance = %balance, "Seller credited");
        }

        for (course_id, sold) in course_sales(&lines) {
            sqlx::query("UPDATE courses SET sales = sales + ?2 WHERE id = ?1")
                .bind(course_id)
                .bind(sold)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = %order_id, lines = lines.len(), "Order paid");

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order by ID.
    pub async fn get_by_id(&self, order_id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = ?1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets an order only if it belongs to `buyer_id`.
    pub async fn get_for_buyer(&self, order_id: i64, buyer_id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = ?1 AND buyer_id = ?2",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(buyer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Returns the order's lines in insertion order.
    pub async fn details(&self, order_id: i64) -> DbResult<Vec<OrderDetail>> {
        let details = sqlx::query_as::<_, OrderDetail>(
            "SELECT id, order_id, snapshot_id FROM order_details WHERE order_id = ?1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
