#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! `SocCKit`: the shared toolkit used by the SocCTrader modules and server.
//!
//! It bundles the pieces every REST module needs and none should re-implement:
//! - [`problem`]: RFC 9457 Problem Details and the `ApiResult` alias
//! - [`alerts`]: `X-<app>-alert` / `X-<app>-error` header construction
//! - [`page`] and [`pagination`]: page requests, pages and `Link` headers
//! - [`response`]: small response helpers (`201 Created` with `Location`, ...)
//! - [`config`]: layered application configuration (defaults, YAML, env, CLI)
//! - [`logging`]: `tracing-subscriber` initialisation
//! - [`signals`]: graceful shutdown on Ctrl+C / SIGTERM

pub mod alerts;
pub mod config;
pub mod logging;
pub mod page;
pub mod pagination;
pub mod problem;
pub mod response;
pub mod signals;

pub use alerts::{AlertHeaders, alert_headers_middleware};
pub use config::{AppConfig, CliArgs, ConfigError};
pub use page::{Page, PageLimits, PageRequest, SortDir, SortOrder};
pub use problem::{APPLICATION_PROBLEM_JSON, ApiResult, Problem, ProblemAlert};

/// Prelude for module authors writing handlers.
pub mod prelude {
    pub use crate::alerts::AlertHeaders;
    pub use crate::page::{Page, PageRequest};
    pub use crate::pagination::pagination_headers;
    pub use crate::problem::{ApiResult, Problem};
    pub use crate::response::{created_json, ok_empty, ok_json};

    pub use axum::{Json, http::StatusCode, response::IntoResponse};
}
