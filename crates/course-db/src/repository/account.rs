//! # Account Repository
//!
//! Database operations for marketplace accounts.
//!
//! Balances are only ever written by settlement (see the order repository);
//! this repository creates and reads accounts.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use course_core::{Account, AccountRole, DEFAULT_AVATAR};

const ACCOUNT_COLUMNS: &str = r#"
    id, username, email, role, nickname, avatar,
    balance_integer, balance_fractional, created_at
"#;

/// Repository for account database operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Creates an account with a zero balance and the default avatar.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when the username or email is taken; the
    /// `field` names the offending column (`accounts.username` or
    /// `accounts.email`).
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        role: AccountRole,
    ) -> DbResult<Account> {
        debug!(username = %username, role = ?role, "Creating account");

        let created_at = Utc::now();

        let id = sqlx::query(
            r#"
            INSERT INTO accounts (username, email, role, nickname, avatar, created_at)
            VALUES (?1, ?2, ?3, '', ?4, ?5)
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(role)
        .bind(DEFAULT_AVATAR)
        .bind(created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Account", id))
    }

    /// Gets an account by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE id = ?1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Gets an account by username.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE username = ?1",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Gets an account by email.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE email = ?1",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Sets the display nickname.
    pub async fn set_nickname(&self, id: i64, nickname: &str) -> DbResult<()> {
        debug!(id = %id, "Updating nickname");

        let result = sqlx::query("UPDATE accounts SET nickname = ?2 WHERE id = ?1")
            .bind(id)
            .bind(nickname)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }
}
