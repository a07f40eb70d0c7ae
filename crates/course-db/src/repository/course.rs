//! # Course Repository
//!
//! Database operations for courses, their snapshots and tags.
//!
//! ## Versioning
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Course Versions                                   │
//! │                                                                         │
//! │  create()          courses(id=7, title="Async")                        │
//! │                    course_snapshots(id=10, course_id=7, price=9.90)    │
//! │                                                                         │
//! │  append_snapshot() courses(id=7, title="Async Rust")                   │
//! │                    course_snapshots(id=14, course_id=7, price=12.00)   │
//! │                                                                         │
//! │  latest_snapshot(7) → id=14 (greatest id wins)                         │
//! │  Orders placed before the edit keep pointing at id=10.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use course_core::{Course, CourseSnapshot, CourseTag, NewSnapshot};

const COURSE_COLUMNS: &str = "id, title, seller_id, published, deleted, sales, pinned, created_at";

const SNAPSHOT_COLUMNS: &str = r#"
    id, course_id, title, content, cover,
    price_integer, price_fractional, created_at
"#;

/// Which public listing to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// Newest first.
    Latest,
    /// Best selling first.
    Hottest,
    /// Pinned courses only, best selling first.
    Pinned,
}

impl Listing {
    fn sql(self) -> String {
        let (filter, order) = match self {
            Listing::Latest => ("", "id DESC"),
            Listing::Hottest => ("", "sales DESC, id DESC"),
            Listing::Pinned => ("AND pinned = 1", "sales DESC, id DESC"),
        };

        format!(
            "SELECT {} FROM courses WHERE published = 1 AND deleted = 0 {} ORDER BY {} LIMIT ?1",
            COURSE_COLUMNS, filter, order
        )
    }
}

/// Repository for the course catalog.
#[derive(Debug, Clone)]
pub struct CourseRepository {
    pool: SqlitePool,
}

impl CourseRepository {
    /// Creates a new CourseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CourseRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates an unpublished course together with its first snapshot.
    ///
    /// Tag ids that do not name an existing tag are skipped. Course, snapshot
    /// and tag links are written in one transaction.
    pub async fn create(
        &self,
        seller_id: i64,
        snapshot: &NewSnapshot,
        tag_ids: &[i64],
    ) -> DbResult<CourseSnapshot> {
        debug!(seller_id = %seller_id, title = %snapshot.title, "Creating course");

        let mut tx = self.pool.begin().await?;

        let course_id = sqlx::query(
            r#"
            INSERT INTO courses (title, seller_id, published, deleted, sales, pinned, created_at)
            VALUES (?1, ?2, 0, 0, 0, 0, ?3)
            "#,
        )
        .bind(&snapshot.title)
        .bind(seller_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        replace_tags(&mut tx, course_id, tag_ids).await?;
        let created = insert_snapshot(&mut tx, course_id, snapshot).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(created)
    }

    /// Records an edit: updates the title, replaces the tag set and appends
    /// a new snapshot, all in one transaction.
    pub async fn append_snapshot(
        &self,
        course_id: i64,
        snapshot: &NewSnapshot,
        tag_ids: &[i64],
    ) -> DbResult<CourseSnapshot> {
        debug!(course_id = %course_id, "Appending course snapshot");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE courses SET title = ?2 WHERE id = ?1 AND deleted = 0")
            .bind(course_id)
            .bind(&snapshot.title)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Course", course_id));
        }

        replace_tags(&mut tx, course_id, tag_ids).await?;
        let created = insert_snapshot(&mut tx, course_id, snapshot).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(created)
    }

    /// Publishes or unpublishes a course that is not deleted.
    pub async fn set_published(&self, course_id: i64, published: bool) -> DbResult<()> {
        debug!(course_id = %course_id, published = published, "Setting course visibility");

        let result = sqlx::query("UPDATE courses SET published = ?2 WHERE id = ?1 AND deleted = 0")
            .bind(course_id)
            .bind(published)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Course", course_id));
        }

        Ok(())
    }

    /// Soft-deletes a course. Deleted courses are never published.
    pub async fn soft_delete(&self, course_id: i64) -> DbResult<()> {
        debug!(course_id = %course_id, "Deleting course");

        let result = sqlx::query(
            "UPDATE courses SET deleted = 1, published = 0 WHERE id = ?1 AND deleted = 0",
        )
        .bind(course_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Course", course_id));
        }

        Ok(())
    }

    /// Pins or unpins a course on the front page.
    pub async fn set_pinned(&self, course_id: i64, pinned: bool) -> DbResult<()> {
        debug!(course_id = %course_id, pinned = pinned, "Setting course pin");

        let result = sqlx::query("UPDATE courses SET pinned = ?2 WHERE id = ?1")
            .bind(course_id)
            .bind(pinned)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Course", course_id));
        }

        Ok(())
    }

    /// Creates a tag.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when the name is taken.
    pub async fn create_tag(&self, name: &str) -> DbResult<CourseTag> {
        debug!(name = %name, "Creating tag");

        let id = sqlx::query("INSERT INTO tags (name) VALUES (?1)")
            .bind(name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(CourseTag {
            id,
            name: name.to_string(),
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a course by ID, deleted or not.
    pub async fn get_by_id(&self, course_id: i64) -> DbResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE id = ?1",
            COURSE_COLUMNS
        ))
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course)
    }

    /// Returns the current (greatest id) snapshot of a course.
    pub async fn latest_snapshot(&self, course_id: i64) -> DbResult<Option<CourseSnapshot>> {
        let mut conn = self.pool.acquire().await?;
        latest_snapshot(&mut conn, course_id).await
    }

    /// Gets a snapshot by ID.
    pub async fn get_snapshot(&self, snapshot_id: i64) -> DbResult<Option<CourseSnapshot>> {
        let snapshot = sqlx::query_as::<_, CourseSnapshot>(&format!(
            "SELECT {} FROM course_snapshots WHERE id = ?1",
            SNAPSHOT_COLUMNS
        ))
        .bind(snapshot_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot)
    }

    /// Returns the tags attached to a course, by tag id.
    pub async fn tags_for(&self, course_id: i64) -> DbResult<Vec<CourseTag>> {
        let tags = sqlx::query_as::<_, CourseTag>(
            r#"
            SELECT t.id, t.name
            FROM course_tags ct
            JOIN tags t ON t.id = ct.tag_id
            WHERE ct.course_id = ?1
            ORDER BY t.id
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Returns every tag, by id.
    pub async fn list_tags(&self) -> DbResult<Vec<CourseTag>> {
        let tags = sqlx::query_as::<_, CourseTag>("SELECT id, name FROM tags ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    /// Reads one of the public listings (published and not deleted).
    pub async fn list(&self, listing: Listing, limit: u32) -> DbResult<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(&listing.sql())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(courses)
    }

    /// Lists a seller's own courses that are not deleted, newest first.
    pub async fn list_by_seller(&self, seller_id: i64, limit: u32) -> DbResult<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE seller_id = ?1 AND deleted = 0 ORDER BY id DESC LIMIT ?2",
            COURSE_COLUMNS
        ))
        .bind(seller_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }
}

// =============================================================================
// Connection-level helpers (shared with the order repository)
// =============================================================================

/// Reads the current snapshot of a course on an existing connection.
pub(crate) async fn latest_snapshot(
    conn: &mut SqliteConnection,
    course_id: i64,
) -> DbResult<Option<CourseSnapshot>> {
    let snapshot = sqlx::query_as::<_, CourseSnapshot>(&format!(
        "SELECT {} FROM course_snapshots WHERE course_id = ?1 ORDER BY id DESC LIMIT 1",
        SNAPSHOT_COLUMNS
    ))
    .bind(course_id)
    .fetch_optional(conn)
    .await?;

    Ok(snapshot)
}

async fn insert_snapshot(
    tx: &mut Transaction<'_, Sqlite>,
    course_id: i64,
    snapshot: &NewSnapshot,
) -> DbResult<CourseSnapshot> {
    let created_at = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO course_snapshots (
            course_id, title, content, cover,
            price_integer, price_fractional, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(course_id)
    .bind(&snapshot.title)
    .bind(&snapshot.content)
    .bind(&snapshot.cover)
    .bind(snapshot.price.integer())
    .bind(snapshot.price.fractional())
    .bind(created_at)
    .execute(&mut **tx)
    .await?
    .last_insert_rowid();

    Ok(CourseSnapshot {
        id,
        course_id,
        title: snapshot.title.clone(),
        content: snapshot.content.clone(),
        cover: snapshot.cover.clone(),
        price_integer: snapshot.price.integer(),
        price_fractional: snapshot.price.fractional(),
        created_at,
    })
}

async fn replace_tags(
    tx: &mut Transaction<'_, Sqlite>,
    course_id: i64,
    tag_ids: &[i64],
) -> DbResult<()> {
    sqlx::query("DELETE FROM course_tags WHERE course_id = ?1")
        .bind(course_id)
        .execute(&mut **tx)
        .await?;

    // Unknown tag ids select no row and are skipped
    for tag_id in tag_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO course_tags (course_id, tag_id) SELECT ?1, id FROM tags WHERE id = ?2",
        )
        .bind(course_id)
        .bind(*tag_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{fixture, new_snapshot};

    #[tokio::test]
    async fn test_create_course_with_tags() {
        let fx = fixture().await;
        let courses = fx.db.courses();

        let rust = courses.create_tag("rust").await.unwrap();
        let web = courses.create_tag("web").await.unwrap();

        let snapshot = courses
            .create(fx.seller, &new_snapshot("Async Rust", "9.90"), &[web.id, rust.id, 999])
            .await
            .unwrap();

        let course = courses.get_by_id(snapshot.course_id).await.unwrap().unwrap();
        assert_eq!(course.title, "Async Rust");
        assert_eq!(course.seller_id, fx.seller);
        assert!(!course.published);
        assert_eq!(course.sales, 0);

        let tags = courses.tags_for(course.id).await.unwrap();
        assert_eq!(tags, vec![rust, web]);
    }

    #[tokio::test]
    async fn test_latest_snapshot_wins() {
        let fx = fixture().await;
        let courses = fx.db.courses();

        let first = courses
            .create(fx.seller, &new_snapshot("v1", "1.00"), &[])
            .await
            .unwrap();
        let second = courses
            .append_snapshot(first.course_id, &new_snapshot("v2", "2.50"), &[])
            .await
            .unwrap();

        assert!(second.id > first.id);

        let latest = courses.latest_snapshot(first.course_id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.price().to_string(), "2.50");

        let course = courses.get_by_id(first.course_id).await.unwrap().unwrap();
        assert_eq!(course.title, "v2");

        let old = courses.get_snapshot(first.id).await.unwrap().unwrap();
        assert_eq!(old.title, "v1");
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listings() {
        let fx = fixture().await;
        let courses = fx.db.courses();

        let a = fx.published_course("A", "1.00").await;
        let b = fx.published_course("B", "1.00").await;

        courses.soft_delete(a).await.unwrap();

        let latest = courses.list(Listing::Latest, 50).await.unwrap();
        let ids: Vec<i64> = latest.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b]);

        let deleted = courses.get_by_id(a).await.unwrap().unwrap();
        assert!(deleted.deleted);
        assert!(!deleted.published);

        // Deleted courses can no longer be edited or republished
        assert!(courses.set_published(a, true).await.is_err());
        assert!(courses.soft_delete(a).await.is_err());
        assert!(courses
            .append_snapshot(a, &new_snapshot("A2", "1.00"), &[])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_listing_orders() {
        let fx = fixture().await;
        let courses = fx.db.courses();

        let a = fx.published_course("A", "1.00").await;
        let b = fx.published_course("B", "1.00").await;
        let c = fx.published_course("C", "1.00").await;
        let hidden = courses
            .create(fx.seller, &new_snapshot("Hidden", "1.00"), &[])
            .await
            .unwrap()
            .course_id;

        sqlx::query("UPDATE courses SET sales = 5 WHERE id = ?1")
            .bind(a)
            .execute(fx.db.pool())
            .await
            .unwrap();
        courses.set_pinned(b, true).await.unwrap();
        courses.set_pinned(c, true).await.unwrap();

        let ids = |list: Vec<Course>| list.into_iter().map(|c| c.id).collect::<Vec<_>>();

        assert_eq!(ids(courses.list(Listing::Latest, 50).await.unwrap()), vec![c, b, a]);
        assert_eq!(ids(courses.list(Listing::Hottest, 50).await.unwrap()), vec![a, c, b]);
        assert_eq!(ids(courses.list(Listing::Pinned, 50).await.unwrap()), vec![c, b]);
        assert_eq!(ids(courses.list(Listing::Latest, 1).await.unwrap()), vec![c]);

        let mine = ids(courses.list_by_seller(fx.seller, 50).await.unwrap());
        assert_eq!(mine, vec![hidden, c, b, a]);
    }

    #[tokio::test]
    async fn test_duplicate_tag_name() {
        let fx = fixture().await;
        let courses = fx.db.courses();

        courses.create_tag("rust").await.unwrap();
        let err = courses.create_tag("rust").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(courses.list_tags().await.unwrap().len(), 1);
    }
}
