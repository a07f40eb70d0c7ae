//! # Validation Module
//!
//! Input validation for marketplace commands.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web front door (outside this workspace)                      │
//! │  └── JSON decoding, session → Actor                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Market command (course-market)                               │
//! │  ├── Role / ownership checks                                           │
//! │  └── THIS MODULE: field rules, first failure wins                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (username, email, cart line)                               │
//! │  └── CHECK (money ranges)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Absent or empty input reports [`ValidationError::Required`]; present but
//! malformed input reports any other variant.

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::NewSnapshot;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum course title length.
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum cover path length.
pub const MAX_COVER_LEN: usize = 50;

/// Covers must point into the uploaded-media area.
pub const COVER_PREFIX: &str = "/media/";

/// Username length bounds.
pub const USERNAME_LEN: (usize, usize) = (4, 20);

/// Maximum tag name length.
pub const MAX_TAG_NAME_LEN: usize = 50;

// =============================================================================
// Presence
// =============================================================================

/// Unwraps an optional command argument.
pub fn require<T>(field: &str, value: Option<T>) -> ValidationResult<T> {
    value.ok_or_else(|| ValidationError::required(field))
}

/// Unwraps an optional string argument, treating blank text as missing.
pub fn require_text<'a>(field: &str, value: Option<&'a str>) -> ValidationResult<&'a str> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ValidationError::required(field)),
    }
}

/// Validates the course id list of a checkout request.
///
/// ## Rules
/// - must be present and non-empty (an order always has at least one line)
/// - ids must be unique: each cart line converts into exactly one order line
///
/// ## Example
/// ```rust
/// use course_core::validation::validate_course_ids;
///
/// assert_eq!(validate_course_ids(Some(vec![3, 1])).unwrap(), vec![3, 1]);
/// assert!(validate_course_ids(Some(vec![])).is_err());
/// assert!(validate_course_ids(None).is_err());
/// assert!(validate_course_ids(Some(vec![2, 2])).is_err());
/// ```
pub fn validate_course_ids(course_ids: Option<Vec<i64>>) -> ValidationResult<Vec<i64>> {
    let course_ids = match course_ids {
        Some(ids) if !ids.is_empty() => ids,
        _ => return Err(ValidationError::required("course_ids")),
    };

    for (i, id) in course_ids.iter().enumerate() {
        if course_ids[..i].contains(id) {
            return Err(ValidationError::invalid(
                "course_ids",
                format!("course {} is listed twice", id),
            ));
        }
    }

    Ok(course_ids)
}

// =============================================================================
// Course Content
// =============================================================================

/// Validates a course title.
///
/// ## Rules
/// - must not be empty
/// - at most 100 characters
pub fn validate_title(title: Option<&str>) -> ValidationResult<String> {
    let title = require_text("title", title)?;

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    Ok(title.to_string())
}

/// Validates course content (any non-empty text).
pub fn validate_content(content: Option<&str>) -> ValidationResult<String> {
    require_text("content", content).map(str::to_string)
}

/// Validates a cover image path.
///
/// ## Rules
/// - must not be empty
/// - at most 50 characters
/// - must start with `/media/`
/// - must not contain `..`
///
/// ## Example
/// ```rust
/// use course_core::validation::validate_cover;
///
/// assert!(validate_cover(Some("/media/rust.png")).is_ok());
/// assert!(validate_cover(Some("/etc/passwd")).is_err());
/// assert!(validate_cover(Some("/media/../secret.png")).is_err());
/// ```
pub fn validate_cover(cover: Option<&str>) -> ValidationResult<String> {
    let cover = require_text("cover", cover)?;

    if cover.chars().count() > MAX_COVER_LEN {
        return Err(ValidationError::TooLong {
            field: "cover".to_string(),
            max: MAX_COVER_LEN,
        });
    }

    if !cover.starts_with(COVER_PREFIX) {
        return Err(ValidationError::invalid(
            "cover",
            format!("must start with {}", COVER_PREFIX),
        ));
    }

    if cover.contains("..") {
        return Err(ValidationError::invalid("cover", "must not contain '..'"));
    }

    Ok(cover.to_string())
}

/// Parses a price string such as `"19.90"`.
pub fn parse_price(price: Option<&str>) -> ValidationResult<Money> {
    let price = require_text("price", price)?;

    price
        .parse::<Money>()
        .map_err(|e| ValidationError::invalid("price", e.to_string()))
}

/// Validates every field of a new course version, in field order.
pub fn validate_snapshot(
    title: Option<&str>,
    content: Option<&str>,
    cover: Option<&str>,
    price: Option<&str>,
) -> ValidationResult<NewSnapshot> {
    Ok(NewSnapshot {
        title: validate_title(title)?,
        content: validate_content(content)?,
        cover: validate_cover(cover)?,
        price: parse_price(price)?,
    })
}

/// Validates a tag name.
pub fn validate_tag_name(name: Option<&str>) -> ValidationResult<String> {
    let name = require_text("name", name)?.trim();

    if name.chars().count() > MAX_TAG_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_TAG_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

// =============================================================================
// Accounts
// =============================================================================

/// Validates a username.
///
/// ## Rules
/// - 4 to 20 characters
/// - letters, digits and underscores only
pub fn validate_username(username: Option<&str>) -> ValidationResult<String> {
    let username = require_text("username", username)?;
    let len = username.chars().count();

    if len < USERNAME_LEN.0 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: USERNAME_LEN.0,
        });
    }

    if len > USERNAME_LEN.1 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: USERNAME_LEN.1,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::invalid(
            "username",
            "must contain only letters, numbers and underscores",
        ));
    }

    Ok(username.to_string())
}

/// Validates an email address shape: `local@domain.tld`.
pub fn validate_email(email: Option<&str>) -> ValidationResult<String> {
    let email = require_text("email", email)?.trim();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .rsplit_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::invalid("email", "must look like name@example.com"));
    }

    Ok(email.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
