//! # DomainError
//!
//! Centralized error handling for the community feed.
//! Maps storage and consistency failures to the four outcomes callers act on.

use thiserror::Error;

/// The primary error type for every feed operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Empty payload (no text after trimming and no attachments), or a
    /// malformed registration field.
    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// Referenced record absent (e.g., Post, Comment, User)
    #[error("{0} not found with ID {1}")]
    SubjectNotFound(&'static str, String),

    /// Authorization failure (not the author, not an admin, banned)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Backend unreachable, timed out, or persisted data could not be read.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Resource already exists (e.g., duplicate user email)
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn post_not_found(id: u64) -> Self {
        Self::SubjectNotFound("post", id.to_string())
    }

    pub fn comment_not_found(id: u64) -> Self {
        Self::SubjectNotFound("comment", id.to_string())
    }

    pub fn user_not_found(email: &str) -> Self {
        Self::SubjectNotFound("user", email.to_string())
    }

    /// Wraps any backend failure, keeping the context the adapter supplies.
    pub fn unavailable(context: &str, err: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable(format!("{context}: {err}"))
    }
}

/// A specialized Result type for feed logic.
pub type Result<T> = std::result::Result<T, DomainError>;
