use socctrader_sdk::{EntityKind, SocctraderError};
use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("A new {kind} cannot already have an ID")]
    IdExists { kind: EntityKind },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Unknown sort property '{field}' for {kind}")]
    InvalidSort { kind: EntityKind, field: String },

    #[error("Invalid search query: {message}")]
    InvalidQuery { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    /// The search backend failed on the read path (writes never see this).
    #[error("Search backend error: {message}")]
    Search { message: String },
}

impl DomainError {
    #[must_use]
    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    #[must_use]
    pub fn id_exists(kind: EntityKind) -> Self {
        Self::IdExists { kind }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_sort(kind: EntityKind, field: impl Into<String>) -> Self {
        Self::InvalidSort {
            kind,
            field: field.into(),
        }
    }

    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search {
            message: message.into(),
        }
    }
}

/// Convert domain errors to SDK errors for public API consumption.
impl From<DomainError> for SocctraderError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound { kind, id } => SocctraderError::not_found(kind, id),
            DomainError::IdExists { kind } => SocctraderError::id_exists(kind),
            DomainError::Validation { field, message } => {
                SocctraderError::validation(format!("{field}: {message}"))
            }
            DomainError::InvalidSort { field, .. } => {
                SocctraderError::validation(format!("unknown sort property '{field}'"))
            }
            DomainError::InvalidQuery { message } => SocctraderError::invalid_query(message),
            DomainError::Database { .. } | DomainError::Search { .. } => {
                SocctraderError::internal()
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn backend_failures_become_opaque_sdk_errors() {
        assert_eq!(
            SocctraderError::from(DomainError::database("constraint users_pkey")),
            SocctraderError::Internal
        );
        assert_eq!(
            SocctraderError::from(DomainError::search("timeout")),
            SocctraderError::Internal
        );
    }

    #[test]
    fn client_errors_keep_their_meaning() {
        assert_eq!(
            SocctraderError::from(DomainError::not_found(EntityKind::Game, 4)),
            SocctraderError::not_found(EntityKind::Game, 4)
        );
        assert!(matches!(
            SocctraderError::from(DomainError::invalid_sort(EntityKind::Team, "secret")),
            SocctraderError::Validation { ref message } if message.contains("secret")
        ));
        assert_eq!(
            DomainError::id_exists(EntityKind::FinancialAction).to_string(),
            "A new financialAction cannot already have an ID"
        );
    }
}
