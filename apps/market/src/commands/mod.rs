//! # Market Commands Module
//!
//! Every operation the web front door can invoke.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (caller checks, exports)
//! ├── order.rs    ◄─── place_order, get_order_detail, pay_order
//! ├── cart.rs     ◄─── add_to_cart, get_my_cart, remove_from_cart
//! ├── course.rs   ◄─── course CRUD, snapshots, listings, tags
//! └── account.rs  ◄─── register_account, get_balance
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Web front door                                                         │
//! │  ──────────────                                                         │
//! │  session → Option<Actor>, JSON body → typed Option<...> arguments       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  async fn place_order(                                                  │
//! │      state: &MarketState,           ◄── shared database + config       │
//! │      actor: Option<Actor>,          ◄── None when not signed in        │
//! │      course_ids: Option<Vec<i64>>,  ◄── None when absent               │
//! │  ) -> ApiResult<OrderPlaced>                                            │
//! │         │                                                               │
//! │         │ preconditions in order, first failure returns                 │
//! │         ▼                                                               │
//! │  DTO serialized back to the caller                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod account;
pub mod cart;
pub mod course;
pub mod order;

use tracing::warn;

use course_core::{Account, Actor, CoreError};

use crate::error::ApiResult;
use crate::state::MarketState;

pub use account::*;
pub use cart::*;
pub use course::*;
pub use order::*;

// =============================================================================
// Caller Checks
// =============================================================================

/// Resolves the signed-in caller, rejecting anonymous requests.
fn require_actor(actor: Option<Actor>) -> ApiResult<Actor> {
    actor.ok_or_else(|| {
        warn!("Rejected anonymous request");
        CoreError::Unauthenticated.into()
    })
}

/// Loads the caller's account row. A session pointing at a vanished account,
/// or carrying a role the account does not have, is an invariant violation.
async fn load_account(state: &MarketState, actor: Actor) -> ApiResult<Account> {
    let account = state
        .db()
        .accounts()
        .get_by_id(actor.account_id)
        .await?
        .ok_or(CoreError::AccountNotFound(actor.account_id))?;

    if account.role != actor.role {
        return Err(CoreError::RoleMismatch {
            account_id: account.id,
            claimed: actor.role,
            stored: account.role,
        }
        .into());
    }

    Ok(account)
}

/// Checks the caller is a signed-in buyer whose account exists.
pub(crate) async fn require_buyer(state: &MarketState, actor: Option<Actor>) -> ApiResult<Account> {
    let actor = require_actor(actor)?;
    actor.require_buyer().map_err(|e| {
        warn!(account_id = %actor.account_id, "Buyer-only operation refused");
        e
    })?;
    load_account(state, actor).await
}

/// Checks the caller is a signed-in seller whose account exists.
pub(crate) async fn require_seller(state: &MarketState, actor: Option<Actor>) -> ApiResult<Account> {
    let actor = require_actor(actor)?;
    actor.require_seller().map_err(|e| {
        warn!(account_id = %actor.account_id, "Seller-only operation refused");
        e
    })?;
    load_account(state, actor).await
}

// =============================================================================
// Test Fixtures
// =============================================================================
