//! # API Error Type
//!
//! Unified error type for market commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Course Market                      │
//! │                                                                         │
//! │  Web front door              Rust backend                               │
//! │  ──────────────              ────────────                               │
//! │                                                                         │
//! │  POST /order/place                                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Missing field? ─── ValidationError::Required ─── 40002 ────────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Wrong role? ────── CoreError::NotBuyer ───────── 40300 ────────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Not in cart? ───── DbError::Domain(NotInCart) ── 40003 ────────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ───────────────────────────────────────── 20000 ───────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "BAD_PARAMETER", "status": 40003, "message": "..." }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use ts_rs::TS;

use course_core::{CoreError, ValidationError};
use course_db::DbError;

/// API error returned from market commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "BAD_PARAMETER",
///   "status": 40003,
///   "message": "Course 7 is not in the cart"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Numeric status, see [`ErrorCode::status`]
    pub status: u32,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    /// Success (20000). Only used by [`ApiResponse`].
    Ok,

    /// A required argument is absent or empty (40002)
    MissingParameter,

    /// An argument is present but invalid, or names nothing usable (40003)
    BadParameter,

    /// Wrong role, wrong owner, or not signed in (40300)
    PermissionDenied,

    /// Course already in the buyer's cart (43001)
    AlreadyInCart,

    /// Username shorter than 4 characters (42001)
    UsernameTooShort,

    /// Username longer than 20 characters (42002)
    UsernameTooLong,

    /// Username with characters other than letters, digits and `_` (42003)
    UsernameFormat,

    /// Email not shaped like `name@example.com` (42009)
    EmailFormat,

    /// Username taken (42010)
    UsernameExisted,

    /// Email taken (42011)
    EmailExisted,

    /// An invariant was broken, e.g. the signed-in account vanished (50000)
    UnexpectedError,

    /// Database operation failed (50001)
    DatabaseError,
}

impl ErrorCode {
    /// Numeric status sent to clients.
    pub fn status(self) -> u32 {
        match self {
            ErrorCode::Ok => 20000,
            ErrorCode::MissingParameter => 40002,
            ErrorCode::BadParameter => 40003,
            ErrorCode::PermissionDenied => 40300,
            ErrorCode::AlreadyInCart => 43001,
            ErrorCode::UsernameTooShort => 42001,
            ErrorCode::UsernameTooLong => 42002,
            ErrorCode::UsernameFormat => 42003,
            ErrorCode::EmailFormat => 42009,
            ErrorCode::UsernameExisted => 42010,
            ErrorCode::EmailExisted => 42011,
            ErrorCode::UnexpectedError => 50000,
            ErrorCode::DatabaseError => 50001,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            status: code.status(),
            message: message.into(),
        }
    }

    /// Creates a missing-parameter error.
    pub fn missing(field: &str) -> Self {
        ApiError::new(ErrorCode::MissingParameter, format!("{} is required", field))
    }

    /// Creates a bad-parameter error.
    pub fn bad_parameter(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BadParameter, message)
    }

    /// Creates a permission error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::PermissionDenied, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => ApiError::from(e),
            DbError::NotFound { entity, id } => {
                ApiError::bad_parameter(format!("{} not found: {}", entity, id))
            }
            DbError::UniqueViolation { field, .. } => {
                if field.contains("username") {
                    ApiError::new(ErrorCode::UsernameExisted, "Username already exists")
                } else if field.contains("email") {
                    ApiError::new(ErrorCode::EmailExisted, "Email already exists")
                } else if field.starts_with("carts") {
                    ApiError::new(ErrorCode::AlreadyInCart, "Course is already in the cart")
                } else {
                    ApiError::bad_parameter(format!("Duplicate value for {}", field))
                }
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::bad_parameter("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Unauthenticated
            | CoreError::NotBuyer { .. }
            | CoreError::NotSeller { .. }
            | CoreError::NotOwner { .. } => ApiError::permission_denied(err.to_string()),

            CoreError::AccountNotFound(id) => {
                tracing::error!(account_id = %id, "Signed-in account does not exist");
                ApiError::new(ErrorCode::UnexpectedError, "Unexpected error")
            }

            CoreError::RoleMismatch { account_id, .. } => {
                tracing::error!(account_id = %account_id, "{}", err);
                ApiError::new(ErrorCode::UnexpectedError, "Unexpected error")
            }

            CoreError::AlreadyInCart { .. } => {
                ApiError::new(ErrorCode::AlreadyInCart, err.to_string())
            }

            CoreError::CourseNotFound(_)
            | CoreError::SnapshotNotFound(_)
            | CoreError::CourseWithoutSnapshot(_)
            | CoreError::OrderNotFound(_)
            | CoreError::OrderNotPayable(_)
            | CoreError::NotInCart { .. }
            | CoreError::InvalidMoney { .. } => ApiError::bad_parameter(err.to_string()),

            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

/// Converts validation errors to API errors.
///
/// Absent input is `MissingParameter`. Username and email rules have their
/// own codes; anything else present but wrong is `BadParameter`.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match &err {
            ValidationError::Required { .. } => {
                ApiError::new(ErrorCode::MissingParameter, err.to_string())
            }
            ValidationError::TooShort { field, .. } if field == "username" => {
                ApiError::new(ErrorCode::UsernameTooShort, err.to_string())
            }
            ValidationError::TooLong { field, .. } if field == "username" => {
                ApiError::new(ErrorCode::UsernameTooLong, err.to_string())
            }
            ValidationError::InvalidFormat { field, .. } if field == "username" => {
                ApiError::new(ErrorCode::UsernameFormat, err.to_string())
            }
            ValidationError::InvalidFormat { field, .. } if field == "email" => {
                ApiError::new(ErrorCode::EmailFormat, err.to_string())
            }
            ValidationError::Duplicate { field, .. } if field == "username" => {
                ApiError::new(ErrorCode::UsernameExisted, err.to_string())
            }
            ValidationError::Duplicate { field, .. } if field == "email" => {
                ApiError::new(ErrorCode::EmailExisted, err.to_string())
            }
            _ => ApiError::bad_parameter(err.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for market commands.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Response Envelope
// =============================================================================

/// The `{status, data, message}` envelope handed to the web front door.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub status: u32,
    pub data: Option<T>,
    pub message: String,
}

impl<T> From<ApiResult<T>> for ApiResponse<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => ApiResponse {
                status: ErrorCode::Ok.status(),
                data: Some(data),
                message: String::from("ok"),
            },
            Err(err) => ApiResponse {
                status: err.status,
                data: None,
                message: err.message,
            },
        }
    }
}
