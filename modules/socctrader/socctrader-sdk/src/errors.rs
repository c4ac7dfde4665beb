//! Public error types for the `socctrader` module.
//!
//! These errors are safe to expose to other modules and consumers.

use thiserror::Error;

use crate::models::EntityKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SocctraderError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: i64 },

    /// A new record was submitted with an identity already set.
    #[error("a new {kind} cannot already have an id")]
    IdExists { kind: EntityKind },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid search query: {message}")]
    InvalidQuery { message: String },

    #[error("Internal error")]
    Internal,
}

impl SocctraderError {
    #[must_use]
    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    #[must_use]
    pub fn id_exists(kind: EntityKind) -> Self {
        Self::IdExists { kind }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::Internal
    }
}
