//! Error types for the review application.
//!
//! - `AppError`: domain errors raised by DAOs, repositories and view models
//! - `Result<T>`: type alias for Results using AppError
//!
//! Expected outcomes such as a taken registration number or a duplicate review
//! are not errors; they are closed result enums owned by the repositories.

use thiserror::Error;

use crate::domain::models::ReviewTarget;

// ============================================================================
// DOMAIN ERROR TYPE
// ============================================================================

/// Domain-specific errors for application operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row that must exist was not found
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Rating outside the 1..=5 star range
    #[error("Invalid rating {0}: expected a value between 1 and 5")]
    InvalidRating(i64),

    /// A review does not belong to the screen it was submitted from
    #[error("Review {review_id} does not target {expected}")]
    TargetMismatch { review_id: i64, expected: ReviewTarget },

    /// The action requires a signed-in user
    #[error("A signed-in user is required")]
    NotSignedIn,

    /// The signed-in user may not act on this record
    #[error("User {0} is not authorized for this action")]
    NotAuthorized(String),

    /// A background task panicked or was aborted
    #[error("Background task failed: {0}")]
    Background(String),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not-found error
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Whether this is a UNIQUE / PRIMARY KEY violation reported by SQLite
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = AppError::not_found("Teacher", 42);
        assert_eq!(err.to_string(), "Teacher not found: 42");
    }

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!AppError::InvalidRating(9).is_unique_violation());
        assert!(!AppError::NotSignedIn.is_unique_violation());
    }
}
