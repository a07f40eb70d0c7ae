//! # Cart Commands
//!
//! Buyer-side cart manipulation.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐                        │
//! │  │  Empty   │────►│ In Cart  │────►│  Order   │                        │
//! │  │  Cart    │     │          │     │ (unpaid) │                        │
//! │  └──────────┘     └──────────┘     └──────────┘                        │
//! │                        │                 ▲                              │
//! │                   add_to_cart       place_order                        │
//! │                   remove_from_cart  (order.rs)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use course_core::validation::require;
use course_core::{Actor, CoreError};

use super::require_buyer;
use crate::error::ApiResult;
use crate::state::MarketState;

/// Response of [`get_my_cart`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartView {
    /// Course ids in the order they were added
    pub course_ids: Vec<i64>,
}

/// Adds a published course to the caller's cart.
///
/// ## Errors
/// - `BadParameter` if the course is unknown, unpublished or deleted
/// - `AlreadyInCart` if it is already there
pub async fn add_to_cart(
    state: &MarketState,
    actor: Option<Actor>,
    course_id: Option<i64>,
) -> ApiResult<()> {
    let buyer = require_buyer(state, actor).await?;
    let course_id = require("course_id", course_id)?;

    debug!(buyer_id = %buyer.id, course_id = %course_id, "add_to_cart command");

    let course = state
        .db()
        .courses()
        .get_by_id(course_id)
        .await?
        .filter(|course| course.is_listed())
        .ok_or(CoreError::CourseNotFound(course_id))?;

    if state.db().carts().contains(buyer.id, course.id).await? {
        return Err(CoreError::AlreadyInCart { course_id }.into());
    }

    state.db().carts().add(buyer.id, course.id).await?;

    Ok(())
}

/// Lists the caller's cart.
pub async fn get_my_cart(state: &MarketState, actor: Option<Actor>) -> ApiResult<CartView> {
    let buyer = require_buyer(state, actor).await?;

    debug!(buyer_id = %buyer.id, "get_my_cart command");

    let course_ids = state.db().carts().course_ids(buyer.id).await?;
    Ok(CartView { course_ids })
}

/// Removes a course from the caller's cart.
pub async fn remove_from_cart(
    state: &MarketState,
    actor: Option<Actor>,
    course_id: Option<i64>,
) -> ApiResult<()> {
    let buyer = require_buyer(state, actor).await?;
    let course_id = require("course_id", course_id)?;

    debug!(buyer_id = %buyer.id, course_id = %course_id, "remove_from_cart command");

    if !state.db().carts().remove(buyer.id, course_id).await? {
        return Err(CoreError::NotInCart { course_id }.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::course::{create_course, delete_course};
    use crate::commands::testing::{course_input, market};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_add_and_remove() {
        let m = market().await;
        let a = m.course("A", "1.00").await;
        let b = m.course("B", "1.00").await;

        add_to_cart(&m.state, Some(m.buyer), Some(b)).await.unwrap();
        add_to_cart(&m.state, Some(m.buyer), Some(a)).await.unwrap();

        let cart = get_my_cart(&m.state, Some(m.buyer)).await.unwrap();
        assert_eq!(cart.course_ids, vec![b, a]);

        remove_from_cart(&m.state, Some(m.buyer), Some(b)).await.unwrap();
        let err = remove_from_cart(&m.state, Some(m.buyer), Some(b))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let cart = get_my_cart(&m.state, Some(m.buyer)).await.unwrap();
        assert_eq!(cart.course_ids, vec![a]);
    }

    #[tokio::test]
    async fn test_add_twice_is_already_in_cart() {
        let m = market().await;
        let a = m.course("A", "1.00").await;

        add_to_cart(&m.state, Some(m.buyer), Some(a)).await.unwrap();
        let err = add_to_cart(&m.state, Some(m.buyer), Some(a)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyInCart);
        assert_eq!(err.status, 43001);
    }

    #[tokio::test]
    async fn test_only_listed_courses_can_be_added() {
        let m = market().await;

        let draft = create_course(&m.state, Some(m.seller), course_input("Draft", "1.00"))
            .await
            .unwrap();
        let err = add_to_cart(&m.state, Some(m.buyer), Some(draft.course_id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let gone = m.course("Gone", "1.00").await;
        delete_course(&m.state, Some(m.seller), Some(gone)).await.unwrap();
        let err = add_to_cart(&m.state, Some(m.buyer), Some(gone)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let err = add_to_cart(&m.state, Some(m.buyer), Some(404)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let err = add_to_cart(&m.state, Some(m.buyer), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);
    }

    #[tokio::test]
    async fn test_sellers_have_no_cart() {
        let m = market().await;
        let a = m.course("A", "1.00").await;

        let err = add_to_cart(&m.state, Some(m.seller), Some(a)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = get_my_cart(&m.state, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
}
