//! # Course Commands
//!
//! Seller-side course management and the public catalog views.
//!
//! ## Course States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create_course ──► ┌─────────┐  publish_course   ┌───────────┐        │
//! │                     │  Draft  │ ────────────────► │ Published │        │
//! │                     │         │ ◄──────────────── │ (listed)  │        │
//! │                     └────┬────┘  unpublish_course └─────┬─────┘        │
//! │                          │                              │              │
//! │                          └──────── delete_course ───────┘              │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                                  ┌───────────┐                          │
//! │                                  │  Deleted  │  detail still readable,  │
//! │                                  │           │  never listed or edited  │
//! │                                  └───────────┘                          │
//! │                                                                         │
//! │  edit_course appends a snapshot in any non-deleted state.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use course_core::validation::{require, validate_snapshot, validate_tag_name};
use course_core::{format_timestamp, Actor, CoreError, Course, CourseSnapshot, CourseTag};
use course_db::Listing;

use super::require_seller;
use crate::error::ApiResult;
use crate::state::MarketState;

// =============================================================================
// DTOs
// =============================================================================

/// Editable fields of a course, as sent by the seller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CourseInput {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Path of an uploaded image under `/media/`
    pub cover: Option<String>,
    /// `"<integer>.<two digits>"`
    pub price: Option<String>,
    /// Tag ids; unknown ids are ignored
    pub tags: Option<Vec<i64>>,
}

/// Response of [`create_course`] and [`edit_course`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CourseSaved {
    pub course_id: i64,
    pub snapshot_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TagView {
    pub tag_id: i64,
    pub tag_name: String,
}

impl From<CourseTag> for TagView {
    fn from(tag: CourseTag) -> Self {
        TagView {
            tag_id: tag.id,
            tag_name: tag.name,
        }
    }
}

/// A course as shown to buyers, at one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CourseView {
    pub course_id: i64,
    pub title: String,
    pub seller_id: i64,
    /// Seller's nickname, or username when no nickname is set
    pub seller_name: String,
    pub published: bool,
    pub deleted: bool,
    pub sales: i64,
    pub tags: Vec<TagView>,
    pub snapshot_id: i64,
    pub content: String,
    pub cover: String,
    pub price: String,
    pub create_time: String,
}

// =============================================================================
// Seller Commands
// =============================================================================

/// Creates an unpublished course with its first snapshot.
pub async fn create_course(
    state: &MarketState,
    actor: Option<Actor>,
    input: CourseInput,
) -> ApiResult<CourseSaved> {
    let seller = require_seller(state, actor).await?;
    let snapshot = validate_snapshot(
        input.title.as_deref(),
        input.content.as_deref(),
        input.cover.as_deref(),
        input.price.as_deref(),
    )?;

    debug!(seller_id = %seller.id, title = %snapshot.title, "create_course command");

    let created = state
        .db()
        .courses()
        .create(seller.id, &snapshot, &input.tags.unwrap_or_default())
        .await?;

    info!(course_id = %created.course_id, seller_id = %seller.id, "Course created");

    Ok(CourseSaved {
        course_id: created.course_id,
        snapshot_id: created.id,
    })
}

/// Appends a new snapshot to one of the caller's courses and replaces its
/// tags.
pub async fn edit_course(
    state: &MarketState,
    actor: Option<Actor>,
    course_id: Option<i64>,
    input: CourseInput,
) -> ApiResult<CourseSaved> {
    let seller = require_seller(state, actor).await?;
    let course_id = require("course_id", course_id)?;
    let course = owned_course(state, seller.id, course_id).await?;

    let snapshot = validate_snapshot(
        input.title.as_deref(),
        input.content.as_deref(),
        input.cover.as_deref(),
        input.price.as_deref(),
    )?;

    debug!(course_id = %course.id, "edit_course command");

    let created = state
        .db()
        .courses()
        .append_snapshot(course.id, &snapshot, &input.tags.unwrap_or_default())
        .await?;

    Ok(CourseSaved {
        course_id: course.id,
        snapshot_id: created.id,
    })
}

/// Soft-deletes one of the caller's courses.
pub async fn delete_course(
    state: &MarketState,
    actor: Option<Actor>,
    course_id: Option<i64>,
) -> ApiResult<()> {
    let seller = require_seller(state, actor).await?;
    let course_id = require("course_id", course_id)?;
    let course = owned_course(state, seller.id, course_id).await?;

    debug!(course_id = %course.id, "delete_course command");

    state.db().courses().soft_delete(course.id).await?;
    Ok(())
}

/// Makes one of the caller's courses visible to buyers.
pub async fn publish_course(
    state: &MarketState,
    actor: Option<Actor>,
    course_id: Option<i64>,
) -> ApiResult<()> {
    set_published(state, actor, course_id, true).await
}

/// Hides one of the caller's courses from buyers.
pub async fn unpublish_course(
    state: &MarketState,
    actor: Option<Actor>,
    course_id: Option<i64>,
) -> ApiResult<()> {
    set_published(state, actor, course_id, false).await
}

async fn set_published(
    state: &MarketState,
    actor: Option<Actor>,
    course_id: Option<i64>,
    published: bool,
) -> ApiResult<()> {
    let seller = require_seller(state, actor).await?;
    let course_id = require("course_id", course_id)?;
    let course = owned_course(state, seller.id, course_id).await?;

    debug!(course_id = %course.id, published = published, "set_published command");

    state.db().courses().set_published(course.id, published).await?;
    Ok(())
}

/// Lists the caller's own courses that are not deleted, newest first.
pub async fn list_my_courses(
    state: &MarketState,
    actor: Option<Actor>,
    limit: Option<u32>,
) -> ApiResult<Vec<CourseView>> {
    let seller = require_seller(state, actor).await?;
    let limit = state.config().page_size(limit);

    let courses = state.db().courses().list_by_seller(seller.id, limit).await?;
    current_views(state, courses).await
}

/// Loads a course that is not deleted and belongs to `seller_id`.
async fn owned_course(state: &MarketState, seller_id: i64, course_id: i64) -> ApiResult<Course> {
    let course = state
        .db()
        .courses()
        .get_by_id(course_id)
        .await?
        .filter(|course| !course.deleted)
        .ok_or(CoreError::CourseNotFound(course_id))?;

    course.ensure_owned_by(seller_id)?;
    Ok(course)
}

// =============================================================================
// Catalog Views
// =============================================================================

/// Reads a course at its current snapshot. Deleted courses are returned too.
pub async fn get_course_detail(state: &MarketState, course_id: Option<i64>) -> ApiResult<CourseView> {
    let course_id = require("course_id", course_id)?;

    let course = state
        .db()
        .courses()
        .get_by_id(course_id)
        .await?
        .ok_or(CoreError::CourseNotFound(course_id))?;

    current_view(state, course).await
}

/// Reads a course as it was at a given snapshot.
pub async fn get_snapshot_detail(
    state: &MarketState,
    snapshot_id: Option<i64>,
) -> ApiResult<CourseView> {
    let snapshot_id = require("snapshot_id", snapshot_id)?;

    let snapshot = state
        .db()
        .courses()
        .get_snapshot(snapshot_id)
        .await?
        .ok_or(CoreError::SnapshotNotFound(snapshot_id))?;

    let course = state
        .db()
        .courses()
        .get_by_id(snapshot.course_id)
        .await?
        .ok_or(CoreError::CourseNotFound(snapshot.course_id))?;

    course_view(state, course, snapshot).await
}

/// Published courses, newest first.
pub async fn list_latest_courses(
    state: &MarketState,
    limit: Option<u32>,
) -> ApiResult<Vec<CourseView>> {
    list(state, Listing::Latest, limit).await
}

/// Published courses, best selling first.
pub async fn list_hottest_courses(
    state: &MarketState,
    limit: Option<u32>,
) -> ApiResult<Vec<CourseView>> {
    list(state, Listing::Hottest, limit).await
}

/// Pinned published courses, best selling first.
pub async fn list_pinned_courses(
    state: &MarketState,
    limit: Option<u32>,
) -> ApiResult<Vec<CourseView>> {
    list(state, Listing::Pinned, limit).await
}

async fn list(state: &MarketState, listing: Listing, limit: Option<u32>) -> ApiResult<Vec<CourseView>> {
    let limit = state.config().page_size(limit);
    debug!(listing = ?listing, limit = limit, "list courses command");

    let courses = state.db().courses().list(listing, limit).await?;
    current_views(state, courses).await
}

async fn current_views(state: &MarketState, courses: Vec<Course>) -> ApiResult<Vec<CourseView>> {
    let mut views = Vec::with_capacity(courses.len());
    for course in courses {
        views.push(current_view(state, course).await?);
    }
    Ok(views)
}

async fn current_view(state: &MarketState, course: Course) -> ApiResult<CourseView> {
    let snapshot = state
        .db()
        .courses()
        .latest_snapshot(course.id)
        .await?
        .ok_or(CoreError::CourseWithoutSnapshot(course.id))?;

    course_view(state, course, snapshot).await
}

async fn course_view(
    state: &MarketState,
    course: Course,
    snapshot: CourseSnapshot,
) -> ApiResult<CourseView> {
    let seller = state
        .db()
        .accounts()
        .get_by_id(course.seller_id)
        .await?
        .ok_or(CoreError::AccountNotFound(course.seller_id))?;

    let tags = state.db().courses().tags_for(course.id).await?;

    Ok(CourseView {
        course_id: course.id,
        title: snapshot.title.clone(),
        seller_id: course.seller_id,
        seller_name: seller.display_name().to_string(),
        published: course.published,
        deleted: course.deleted,
        sales: course.sales,
        tags: tags.into_iter().map(TagView::from).collect(),
        snapshot_id: snapshot.id,
        price: snapshot.price().to_string(),
        create_time: format_timestamp(&snapshot.created_at),
        content: snapshot.content,
        cover: snapshot.cover,
    })
}

// =============================================================================
// Tags
// =============================================================================

/// Creates a tag. Names are unique.
pub async fn create_tag(state: &MarketState, name: Option<String>) -> ApiResult<TagView> {
    let name = validate_tag_name(name.as_deref())?;

    debug!(name = %name, "create_tag command");

    let tag = state.db().courses().create_tag(&name).await?;
    Ok(TagView::from(tag))
}

/// Lists every tag.
pub async fn list_tags(state: &MarketState) -> ApiResult<Vec<TagView>> {
    let tags = state.db().courses().list_tags().await?;
    Ok(tags.into_iter().map(TagView::from).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{course_input, market};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_create_course_and_read_detail() {
        let m = market().await;
        let rust = create_tag(&m.state, Some("rust".to_string())).await.unwrap();

        let mut input = course_input("Async Rust", "19.90");
        input.tags = Some(vec![rust.tag_id, 999]);

        let saved = create_course(&m.state, Some(m.seller), input).await.unwrap();
        let view = get_course_detail(&m.state, Some(saved.course_id)).await.unwrap();

        assert_eq!(view.title, "Async Rust");
        assert_eq!(view.seller_id, m.seller.account_id);
        assert_eq!(view.seller_name, "seller_one");
        assert!(!view.published);
        assert_eq!(view.snapshot_id, saved.snapshot_id);
        assert_eq!(view.price, "19.90");
        assert_eq!(view.cover, "/media/cover.png");
        assert_eq!(view.tags, vec![rust]);
    }

    #[tokio::test]
    async fn test_create_course_field_rules() {
        let m = market().await;

        let err = create_course(&m.state, Some(m.buyer), course_input("A", "1.00"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let mut input = course_input("A", "1.00");
        input.title = None;
        let err = create_course(&m.state, Some(m.seller), input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);

        let mut input = course_input("A", "1.00");
        input.title = Some("t".repeat(101));
        let err = create_course(&m.state, Some(m.seller), input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let mut input = course_input("A", "1.00");
        input.cover = Some("/media/../etc/passwd".to_string());
        let err = create_course(&m.state, Some(m.seller), input).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let err = create_course(&m.state, Some(m.seller), course_input("A", "1.5"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);
    }

    #[tokio::test]
    async fn test_edit_course_appends_snapshot() {
        let m = market().await;
        let a = m.course("A", "1.00").await;
        let before = get_course_detail(&m.state, Some(a)).await.unwrap();

        let saved = edit_course(&m.state, Some(m.seller), Some(a), course_input("A+", "2.00"))
            .await
            .unwrap();
        assert!(saved.snapshot_id > before.snapshot_id);

        let after = get_course_detail(&m.state, Some(a)).await.unwrap();
        assert_eq!(after.title, "A+");
        assert_eq!(after.price, "2.00");
        assert!(after.published);

        let old = get_snapshot_detail(&m.state, Some(before.snapshot_id))
            .await
            .unwrap();
        assert_eq!(old.title, "A");
        assert_eq!(old.price, "1.00");
    }

    #[tokio::test]
    async fn test_only_owner_manages_course() {
        let m = market().await;
        let a = m.course("A", "1.00").await;

        let err = edit_course(&m.state, Some(m.other_seller), Some(a), course_input("X", "1.00"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = delete_course(&m.state, Some(m.other_seller), Some(a))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = unpublish_course(&m.state, Some(m.other_seller), Some(a))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = publish_course(&m.state, Some(m.seller), Some(12345))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);
    }

    #[tokio::test]
    async fn test_deleted_course_is_readable_but_frozen() {
        let m = market().await;
        let a = m.course("A", "1.00").await;

        delete_course(&m.state, Some(m.seller), Some(a)).await.unwrap();

        let view = get_course_detail(&m.state, Some(a)).await.unwrap();
        assert!(view.deleted);
        assert!(!view.published);

        let err = publish_course(&m.state, Some(m.seller), Some(a))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let err = edit_course(&m.state, Some(m.seller), Some(a), course_input("A", "1.00"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        assert!(list_latest_courses(&m.state, None).await.unwrap().is_empty());
        assert!(list_my_courses(&m.state, Some(m.seller), None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_listings() {
        let m = market().await;
        let a = m.course("A", "1.00").await;
        let b = m.course("B", "1.00").await;
        let draft = create_course(&m.state, Some(m.seller), course_input("Draft", "1.00"))
            .await
            .unwrap();

        m.state.db().courses().set_pinned(a, true).await.unwrap();

        let ids = |views: Vec<CourseView>| views.into_iter().map(|v| v.course_id).collect::<Vec<_>>();

        assert_eq!(ids(list_latest_courses(&m.state, None).await.unwrap()), vec![b, a]);
        assert_eq!(ids(list_latest_courses(&m.state, Some(1)).await.unwrap()), vec![b]);
        assert_eq!(ids(list_hottest_courses(&m.state, None).await.unwrap()), vec![b, a]);
        assert_eq!(ids(list_pinned_courses(&m.state, None).await.unwrap()), vec![a]);
        assert_eq!(
            ids(list_my_courses(&m.state, Some(m.seller), None).await.unwrap()),
            vec![draft.course_id, b, a]
        );
    }

    #[tokio::test]
    async fn test_tags() {
        let m = market().await;

        create_tag(&m.state, Some("rust".to_string())).await.unwrap();

        let err = create_tag(&m.state, Some("rust".to_string())).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let err = create_tag(&m.state, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);

        assert_eq!(list_tags(&m.state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_ids() {
        let m = market().await;

        let err = get_course_detail(&m.state, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);

        let err = get_snapshot_detail(&m.state, Some(77)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);
    }
}
