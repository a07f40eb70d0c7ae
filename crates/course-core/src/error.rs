//! # Error Types
//!
//! Domain-specific error types for course-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  course-core errors (this file)                                        │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  course-db errors (separate crate)                                     │
//! │  └── DbError          - Database failures, wraps CoreError raised      │
//! │                         inside checkout transactions                   │
//! │                                                                         │
//! │  course-market errors (app)                                            │
//! │  └── ApiError         - status code + message returned to callers      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::AccountRole;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The caller is not signed in.
    #[error("Authentication required")]
    Unauthenticated,

    /// The operation is reserved for buyers.
    #[error("Account {account_id} is not a buyer")]
    NotBuyer { account_id: i64 },

    /// The operation is reserved for sellers.
    #[error("Account {account_id} is not a seller")]
    NotSeller { account_id: i64 },

    /// A seller tried to manage another seller's course.
    #[error("Course {course_id} is not owned by account {account_id}")]
    NotOwner { course_id: i64, account_id: i64 },

    /// The signed-in account no longer exists.
    ///
    /// ## When This Occurs
    /// The auth collaborator resolved a session to an account row that has
    /// since disappeared. This is an invariant violation, not a user error.
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    /// The session's role disagrees with the stored account.
    #[error("Account {account_id} is stored as {stored:?}, session says {claimed:?}")]
    RoleMismatch {
        account_id: i64,
        claimed: AccountRole,
        stored: AccountRole,
    },

    /// Course cannot be found (or is deleted where that matters).
    #[error("Course not found: {0}")]
    CourseNotFound(i64),

    /// Snapshot cannot be found.
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(i64),

    /// A course exists but has never been given content.
    #[error("Course {0} has no snapshot")]
    CourseWithoutSnapshot(i64),

    /// Order cannot be found for this buyer.
    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    /// Order does not exist or is already paid.
    ///
    /// Both cases are reported identically so a double payment looks like a
    /// payment against an unknown order.
    #[error("Order {0} does not exist or is already paid")]
    OrderNotPayable(i64),

    /// A course requested for checkout is not in the buyer's cart.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: [A]          place_order([A, B])
    ///      │
    ///      ▼
    /// NotInCart { course_id: B }  →  nothing is mutated, A stays in cart
    /// ```
    #[error("Course {course_id} is not in the cart")]
    NotInCart { course_id: i64 },

    /// The course is already in the buyer's cart.
    #[error("Course {course_id} is already in the cart")]
    AlreadyInCart { course_id: i64 },

    /// Money value out of range or badly formatted.
    #[error("Invalid money amount: {reason}")]
    InvalidMoney { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before any business logic or database work.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (bad cover path, bad email, bad price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (username, email, tag name).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::NotInCart { course_id: 7 };
        assert_eq!(err.to_string(), "Course 7 is not in the cart");

        let err = CoreError::OrderNotPayable(3);
        assert_eq!(
            err.to_string(),
            "Order 3 does not exist or is already paid"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("course_ids").to_string(),
            "course_ids is required"
        );

        let err = ValidationError::TooLong {
            field: "title".to_string(),
            max: 100,
        };
        assert_eq!(err.to_string(), "title must be at most 100 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("title").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
