//! # Account Commands
//!
//! Account registration and seller balance.
//!
//! Passwords, verification codes and sessions are owned by the auth
//! collaborator in front of this layer; it hands us an [`Actor`] per request.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use course_core::validation::{require, validate_email, validate_username};
use course_core::{format_timestamp, Account, AccountRole, Actor, ValidationError};

use super::require_seller;
use crate::error::{ApiError, ApiResult};
use crate::state::MarketState;

/// Fields of a registration request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegisterAccount {
    pub username: Option<String>,
    pub email: Option<String>,
    /// `0` buyer, `1` seller
    pub role: Option<i64>,
}

/// A registered account, as returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccountView {
    pub account_id: i64,
    pub username: String,
    pub email: String,
    /// `0` buyer, `1` seller
    pub role: i64,
    pub nickname: String,
    pub avatar: String,
    pub create_time: String,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        AccountView {
            account_id: account.id,
            role: account.role as i64,
            create_time: format_timestamp(&account.created_at),
            username: account.username,
            email: account.email,
            nickname: account.nickname,
            avatar: account.avatar,
        }
    }
}

/// Response of [`get_balance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BalanceView {
    /// `"<integer>.<fractional:02>"`
    pub balance: String,
}

/// Registers a buyer or seller account with a zero balance.
///
/// ## Errors
/// - `MissingParameter` for absent fields
/// - `UsernameTooShort` / `UsernameTooLong` / `UsernameFormat` / `EmailFormat`
///   for malformed ones, `BadParameter` for an unknown role
/// - `UsernameExisted` / `EmailExisted` for taken values
pub async fn register_account(
    state: &MarketState,
    input: RegisterAccount,
) -> ApiResult<AccountView> {
    let username = validate_username(input.username.as_deref())?;
    let email = validate_email(input.email.as_deref())?;
    let role = AccountRole::try_from(require("role", input.role)?)?;

    debug!(username = %username, role = ?role, "register_account command");

    let accounts = state.db().accounts();

    if accounts.get_by_username(&username).await?.is_some() {
        return Err(ApiError::from(ValidationError::Duplicate {
            field: "username".to_string(),
            value: username,
        }));
    }

    if accounts.get_by_email(&email).await?.is_some() {
        return Err(ApiError::from(ValidationError::Duplicate {
            field: "email".to_string(),
            value: email,
        }));
    }

    let account = accounts.create(&username, &email, role).await?;

    info!(account_id = %account.id, role = ?role, "Account registered");

    Ok(AccountView::from(account))
}

/// Returns the caller's accrued sales balance.
pub async fn get_balance(state: &MarketState, actor: Option<Actor>) -> ApiResult<BalanceView> {
    let seller = require_seller(state, actor).await?;

    Ok(BalanceView {
        balance: seller.balance().to_string(),
    })
}
