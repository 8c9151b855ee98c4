//! Authentication and session logic.
//!
//! Provides password hashing/verification, the server-side session store,
//! and the database queries both of them sit on.

pub mod password;
pub mod queries;
pub mod sessions;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
