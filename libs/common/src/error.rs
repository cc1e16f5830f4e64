//! Custom error types for the common library
//!
//! `DatabaseError` describes what went wrong in a backing store;
//! `ServiceError` is the caller-facing taxonomy every operation of the
//! lost-and-found services resolves to.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// SQLSTATE raised by Postgres when a unique constraint is violated.
const UNIQUE_VIOLATION: &str = "23505";

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// Session cache (Redis) failure
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        if let SqlxError::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return DatabaseError::UniqueViolation(
                    db_err.constraint().unwrap_or("unknown").to_string(),
                );
            }
        }
        DatabaseError::Query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Outcome kinds of every service operation.
///
/// `Unauthenticated` and `Forbidden` carry no detail so callers cannot
/// learn which check failed.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or malformed required field
    #[error("{0}")]
    Validation(String),

    /// No, stale or invalid session; also every failed login
    #[error("Not authenticated")]
    Unauthenticated,

    /// Authenticated but not an administrator
    #[error("Not authorized")]
    Forbidden,

    /// Unique constraint violated
    #[error("{0}")]
    Conflict(String),

    /// Referenced entity is absent
    #[error("{0}")]
    NotFound(String),

    /// Backing-store failure not otherwise classified
    #[error("Persistence failure: {0}")]
    Persistence(#[source] DatabaseError),
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation(constraint) => {
                ServiceError::Conflict(format!("Duplicate value for {}", constraint))
            }
            other => ServiceError::Persistence(other),
        }
    }
}

/// Type alias for Result with ServiceError
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: ServiceError = DatabaseError::UniqueViolation("users_username_key".into()).into();
        assert!(matches!(err, ServiceError::Conflict(msg) if msg.contains("users_username_key")));
    }

    #[test]
    fn other_database_errors_become_persistence_failures() {
        let err: ServiceError = DatabaseError::Migration("boom".into()).into();
        assert!(matches!(err, ServiceError::Persistence(_)));
    }

    #[test]
    fn auth_errors_do_not_leak_detail() {
        assert_eq!(ServiceError::Unauthenticated.to_string(), "Not authenticated");
        assert_eq!(ServiceError::Forbidden.to_string(), "Not authorized");
    }
}
