use axum::http::StatusCode;
use socckit::Problem;

use crate::domain::error::DomainError;

const PROBLEM_BASE: &str = "https://www.socctrader.app/problem";

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        let trace_id = tracing::Span::current()
            .id()
            .map(|id| id.into_u64().to_string());

        let (status, key, title, detail, entity) = match &e {
            DomainError::NotFound { kind, .. } => (
                StatusCode::NOT_FOUND,
                "notfound",
                "Not Found",
                e.to_string(),
                Some(kind.name()),
            ),
            DomainError::IdExists { kind } => (
                StatusCode::BAD_REQUEST,
                "idexists",
                "Bad Request",
                e.to_string(),
                Some(kind.name()),
            ),
            DomainError::Validation { .. } => (
                StatusCode::BAD_REQUEST,
                "validation",
                "Bad Request",
                e.to_string(),
                None,
            ),
            DomainError::InvalidSort { kind, .. } => (
                StatusCode::BAD_REQUEST,
                "validation",
                "Bad Request",
                e.to_string(),
                Some(kind.name()),
            ),
            DomainError::InvalidQuery { .. } => (
                StatusCode::BAD_REQUEST,
                "badquery",
                "Bad Request",
                e.to_string(),
                None,
            ),
            DomainError::Database { .. } | DomainError::Search { .. } => {
                tracing::error!(error = %e, "request failed on a backend");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal Server Error",
                    "An internal error occurred".to_owned(),
                    None,
                )
            }
        };

        let mut problem = Problem::new(status, title, detail)
            .with_type(format!("{PROBLEM_BASE}/{key}"))
            .with_error_key(key);

        if let Some(entity) = entity {
            problem = problem.with_entity(entity);
        }
        if let Some(id) = trace_id {
            problem = problem.with_trace_id(id);
        }

        problem
    }
}

/// Problem for a failure on `entity`'s endpoints.
pub fn entity_problem(entity: &str, e: DomainError) -> Problem {
    let problem = Problem::from(e);
    if problem.entity.is_some() {
        problem
    } else {
        problem.with_entity(entity)
    }
}

/// 400 for a request that could not be read at all (bad JSON, bad query string).
pub fn unreadable_request(entity: &str, detail: impl Into<String>) -> Problem {
    Problem::bad_request(detail)
        .with_type(format!("{PROBLEM_BASE}/validation"))
        .with_error_key("validation")
        .with_entity(entity)
}
