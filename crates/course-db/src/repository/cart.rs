//! # Cart Repository
//!
//! Pending-purchase intents, one row per (buyer, course).
//!
//! Rows are removed either by the buyer or by `place_order`, which converts
//! them into order lines inside its own transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use course_core::Cart;

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Whether the buyer already has this course in the cart.
    pub async fn contains(&self, buyer_id: i64, course_id: i64) -> DbResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM carts WHERE buyer_id = ?1 AND course_id = ?2)",
        )
        .bind(buyer_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Adds a course to the buyer's cart.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the row already exists (callers check
    /// [`contains`](Self::contains) first; the unique index catches races).
    pub async fn add(&self, buyer_id: i64, course_id: i64) -> DbResult<Cart> {
        debug!(buyer_id = %buyer_id, course_id = %course_id, "Adding course to cart");

        let created_at = Utc::now();

        let id = sqlx::query(
            "INSERT INTO carts (buyer_id, course_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(buyer_id)
        .bind(course_id)
        .bind(created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Cart {
            id,
            buyer_id,
            course_id,
            created_at,
        })
    }

    /// Removes a course from the cart. Returns `false` when there was no row.
    pub async fn remove(&self, buyer_id: i64, course_id: i64) -> DbResult<bool> {
        debug!(buyer_id = %buyer_id, course_id = %course_id, "Removing course from cart");

        let result = sqlx::query("DELETE FROM carts WHERE buyer_id = ?1 AND course_id = ?2")
            .bind(buyer_id)
            .bind(course_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the buyer's cart rows in insertion order.
    pub async fn list(&self, buyer_id: i64) -> DbResult<Vec<Cart>> {
        let rows = sqlx::query_as::<_, Cart>(
            "SELECT id, buyer_id, course_id, created_at FROM carts WHERE buyer_id = ?1 ORDER BY id",
        )
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lists the course ids in the buyer's cart, in insertion order.
    pub async fn course_ids(&self, buyer_id: i64) -> DbResult<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT course_id FROM carts WHERE buyer_id = ?1 ORDER BY id")
            .bind(buyer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::testing::fixture;
    use crate::DbError;

    #[tokio::test]
    async fn test_add_list_remove() {
        let fx = fixture().await;
        let carts = fx.db.carts();

        let a = fx.published_course("A", "1.00").await;
        let b = fx.published_course("B", "2.00").await;

        carts.add(fx.buyer, b).await.unwrap();
        carts.add(fx.buyer, a).await.unwrap();

        assert!(carts.contains(fx.buyer, a).await.unwrap());
        assert!(!carts.contains(fx.other_buyer, a).await.unwrap());
        assert_eq!(carts.course_ids(fx.buyer).await.unwrap(), vec![b, a]);
        assert_eq!(carts.list(fx.buyer).await.unwrap().len(), 2);

        assert!(carts.remove(fx.buyer, b).await.unwrap());
        assert!(!carts.remove(fx.buyer, b).await.unwrap());
        assert_eq!(carts.course_ids(fx.buyer).await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn test_unique_cart_line() {
        let fx = fixture().await;
        let carts = fx.db.carts();
        let a = fx.published_course("A", "1.00").await;

        carts.add(fx.buyer, a).await.unwrap();
        let err = carts.add(fx.buyer, a).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Other buyers are unaffected
        carts.add(fx.other_buyer, a).await.unwrap();
    }
}
