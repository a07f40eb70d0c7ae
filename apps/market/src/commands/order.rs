//! # Order Commands
//!
//! Checkout: turning cart rows into an order, reading it back, and paying
//! for it.
//!
//! ## User Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Buyer's cart: [A, B]                                                  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  place_order([A, B])        → { order_id: 12 }   cart is now empty     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  get_order_detail(12)       → { price: "11.04", paid: false, ... }     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  pay_order(12)              → sellers of A and B credited              │
//! │  pay_order(12) again        → BadParameter, nobody credited twice      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## JSON Bodies
//! [`place_order_json`] takes the raw request body. The caller check still
//! runs before `course_ids` is decoded, so the precondition order matches
//! [`place_order`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use ts_rs::TS;

use course_core::validation::{require, validate_course_ids};
use course_core::{format_timestamp, Account, Actor, CoreError, Order};

use super::require_buyer;
use crate::error::{ApiError, ApiResult};
use crate::state::MarketState;

/// Response of [`place_order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPlaced {
    pub order_id: i64,
}

/// Response of [`get_order_detail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetailView {
    pub order_id: i64,
    /// Order total, `"<integer>.<fractional:02>"`
    pub price: String,
    pub paid: bool,
    /// `YYYY-MM-DD HH:MM:SS`, UTC
    pub create_time: String,
    /// Snapshots bought, in line order
    pub snapshot_ids: Vec<i64>,
}

impl OrderDetailView {
    fn new(order: &Order, snapshot_ids: Vec<i64>) -> Self {
        OrderDetailView {
            order_id: order.id,
            price: order.total().to_string(),
            paid: order.paid,
            create_time: format_timestamp(&order.created_at),
            snapshot_ids,
        }
    }
}

/// Decodes the raw `course_ids` field of a JSON request.
///
/// Absent or `null` decodes to `None` (reported later as missing). Anything
/// that is not an array of integers is a `BadParameter`.
pub fn decode_course_ids(raw: Option<&Value>) -> ApiResult<Option<Vec<i64>>> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_i64()
                    .ok_or_else(|| ApiError::bad_parameter("course_ids must be a list of integers"))
            })
            .collect::<ApiResult<Vec<i64>>>()
            .map(Some),
        Some(_) => Err(ApiError::bad_parameter("course_ids must be a list")),
    }
}

/// Converts cart rows into an unpaid order.
///
/// ## Preconditions (first failure wins)
/// 1. Signed-in buyer → else `PermissionDenied`
/// 2. `course_ids` present and non-empty → else `MissingParameter`;
///    duplicates → `BadParameter`
/// 3. Every course in the buyer's cart → else `BadParameter`, nothing changes
///
/// The order total is the sum of each course's current snapshot price.
pub async fn place_order(
    state: &MarketState,
    actor: Option<Actor>,
    course_ids: Option<Vec<i64>>,
) -> ApiResult<OrderPlaced> {
    let buyer = require_buyer(state, actor).await?;
    checkout(state, &buyer, course_ids).await
}

/// [`place_order`] for a raw JSON body such as `{"course_ids": [3, 5]}`.
///
/// A `course_ids` that is present but not an array of integers is
/// `BadParameter`.
pub async fn place_order_json(
    state: &MarketState,
    actor: Option<Actor>,
    body: &Value,
) -> ApiResult<OrderPlaced> {
    let buyer = require_buyer(state, actor).await?;
    let course_ids = decode_course_ids(body.get("course_ids"))?;
    checkout(state, &buyer, course_ids).await
}

async fn checkout(
    state: &MarketState,
    buyer: &Account,
    course_ids: Option<Vec<i64>>,
) -> ApiResult<OrderPlaced> {
    let course_ids = validate_course_ids(course_ids)?;

    debug!(buyer_id = %buyer.id, courses = ?course_ids, "place_order command");

    let order_id = state.db().orders().place_order(buyer.id, &course_ids).await?;

    Ok(OrderPlaced { order_id })
}

/// Reads one of the caller's orders.
///
/// Orders of other buyers are reported exactly like unknown orders.
pub async fn get_order_detail(
    state: &MarketState,
    actor: Option<Actor>,
    order_id: Option<i64>,
) -> ApiResult<OrderDetailView> {
    let buyer = require_buyer(state, actor).await?;
    let order_id = require("order_id", order_id)?;

    debug!(buyer_id = %buyer.id, order_id = %order_id, "get_order_detail command");

    let order = state
        .db()
        .orders()
        .get_for_buyer(order_id, buyer.id)
        .await?
        .ok_or(CoreError::OrderNotFound(order_id))?;

    let snapshot_ids = state
        .db()
        .orders()
        .details(order.id)
        .await?
        .into_iter()
        .map(|line| line.snapshot_id)
        .collect();

    Ok(OrderDetailView::new(&order, snapshot_ids))
}

/// Marks an order paid and credits its sellers.
///
/// Payment confirmation is trusted: no caller identity is required. Unknown
/// and already-paid orders are both `BadParameter`.
pub async fn pay_order(state: &MarketState, order_id: Option<i64>) -> ApiResult<()> {
    let order_id = require("order_id", order_id)?;

    debug!(order_id = %order_id, "pay_order command");

    state.db().orders().pay_order(order_id).await?;

    info!(order_id = %order_id, "Payment settled");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, get_my_cart};
    use crate::commands::course::{edit_course, get_snapshot_detail};
    use crate::commands::account::get_balance;
    use crate::commands::testing::{course_input, market};
    use crate::error::ErrorCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_place_and_read_order() {
        let m = market().await;
        let a = m.course("A", "10.99").await;
        let b = m.course("B", "0.05").await;
        add_to_cart(&m.state, Some(m.buyer), Some(a)).await.unwrap();
        add_to_cart(&m.state, Some(m.buyer), Some(b)).await.unwrap();

        let placed = place_order(&m.state, Some(m.buyer), Some(vec![a, b]))
            .await
            .unwrap();

        let cart = get_my_cart(&m.state, Some(m.buyer)).await.unwrap();
        assert!(cart.course_ids.is_empty());

        let detail = get_order_detail(&m.state, Some(m.buyer), Some(placed.order_id))
            .await
            .unwrap();
        assert_eq!(detail.order_id, placed.order_id);
        assert_eq!(detail.price, "11.04");
        assert!(!detail.paid);
        assert_eq!(detail.create_time.len(), "2024-01-01 00:00:00".len());
        assert_eq!(detail.snapshot_ids.len(), 2);

        let first = get_snapshot_detail(&m.state, Some(detail.snapshot_ids[0]))
            .await
            .unwrap();
        assert_eq!(first.course_id, a);
    }

    #[tokio::test]
    async fn test_edit_after_order_keeps_order_price() {
        let m = market().await;
        let a = m.course("A", "5.00").await;
        add_to_cart(&m.state, Some(m.buyer), Some(a)).await.unwrap();
        let placed = place_order(&m.state, Some(m.buyer), Some(vec![a]))
            .await
            .unwrap();

        edit_course(&m.state, Some(m.seller), Some(a), course_input("A2", "7.50"))
            .await
            .unwrap();

        let detail = get_order_detail(&m.state, Some(m.buyer), Some(placed.order_id))
            .await
            .unwrap();
        assert_eq!(detail.price, "5.00");

        let bought = get_snapshot_detail(&m.state, Some(detail.snapshot_ids[0]))
            .await
            .unwrap();
        assert_eq!(bought.title, "A");
        assert_eq!(bought.price, "5.00");
    }

    #[tokio::test]
    async fn test_place_order_preconditions_in_order() {
        let m = market().await;
        let a = m.course("A", "1.00").await;
        let b = m.course("B", "2.00").await;
        add_to_cart(&m.state, Some(m.buyer), Some(a)).await.unwrap();

        // Role is checked before arguments
        let err = place_order(&m.state, Some(m.seller), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = place_order(&m.state, None, Some(vec![a])).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = place_order(&m.state, Some(m.buyer), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);

        let err = place_order(&m.state, Some(m.buyer), Some(vec![])).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);

        let err = place_order(&m.state, Some(m.buyer), Some(vec![a, a]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let err = place_order(&m.state, Some(m.buyer), Some(vec![a, b]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        // Nothing was consumed by the rejected attempts
        let cart = get_my_cart(&m.state, Some(m.buyer)).await.unwrap();
        assert_eq!(cart.course_ids, vec![a]);
        // The first order the market ever places would get id 1
        assert!(m.state.db().orders().get_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_order_detail_is_private_to_buyer() {
        let m = market().await;
        let a = m.course("A", "1.00").await;
        add_to_cart(&m.state, Some(m.buyer), Some(a)).await.unwrap();
        let placed = place_order(&m.state, Some(m.buyer), Some(vec![a]))
            .await
            .unwrap();

        let err = get_order_detail(&m.state, Some(m.other_buyer), Some(placed.order_id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let err = get_order_detail(&m.state, Some(m.buyer), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);

        let err = get_order_detail(&m.state, Some(m.seller), Some(placed.order_id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_pay_order_credits_sellers_once() {
        let m = market().await;
        let a = m.course("A", "0.60").await;
        let b = m.course_by(m.other_seller, "B", "3.45").await;
        let c = m.course("C", "0.70").await;
        for course in [a, b, c] {
            add_to_cart(&m.state, Some(m.buyer), Some(course)).await.unwrap();
        }
        let placed = place_order(&m.state, Some(m.buyer), Some(vec![a, b, c]))
            .await
            .unwrap();

        pay_order(&m.state, Some(placed.order_id)).await.unwrap();

        let err = pay_order(&m.state, Some(placed.order_id)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let seller = get_balance(&m.state, Some(m.seller)).await.unwrap();
        assert_eq!(seller.balance, "1.30");
        let other = get_balance(&m.state, Some(m.other_seller)).await.unwrap();
        assert_eq!(other.balance, "3.45");

        let detail = get_order_detail(&m.state, Some(m.buyer), Some(placed.order_id))
            .await
            .unwrap();
        assert!(detail.paid);
    }

    #[tokio::test]
    async fn test_pay_order_arguments() {
        let m = market().await;

        let err = pay_order(&m.state, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);

        let err = pay_order(&m.state, Some(77)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);
    }

    #[test]
    fn test_decode_course_ids() {
        assert_eq!(decode_course_ids(None).unwrap(), None);
        assert_eq!(decode_course_ids(Some(&Value::Null)).unwrap(), None);
        assert_eq!(
            decode_course_ids(Some(&json!([3, 1]))).unwrap(),
            Some(vec![3, 1])
        );

        let err = decode_course_ids(Some(&json!("3,1"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let err = decode_course_ids(Some(&json!([1, "two"]))).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);
    }

    #[tokio::test]
    async fn test_place_order_json() {
        let m = market().await;
        let a = m.course("A", "3.20").await;
        add_to_cart(&m.state, Some(m.buyer), Some(a)).await.unwrap();

        // The caller is checked before the body is decoded
        let err = place_order_json(&m.state, Some(m.seller), &json!({"course_ids": "oops"}))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = place_order_json(&m.state, Some(m.buyer), &json!({"course_ids": "oops"}))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadParameter);

        let err = place_order_json(&m.state, Some(m.buyer), &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);

        let placed = place_order_json(&m.state, Some(m.buyer), &json!({"course_ids": [a]}))
            .await
            .unwrap();
        let detail = get_order_detail(&m.state, Some(m.buyer), Some(placed.order_id))
            .await
            .unwrap();
        assert_eq!(detail.price, "3.20");
    }
}
