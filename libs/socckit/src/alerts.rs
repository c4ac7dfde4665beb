//! Alert headers signalling the outcome of a mutation to the web client.
//!
//! Success: `X-<app>-alert: <app>.<entity>.<action>` plus `X-<app>-params: <id>`.
//! Failure: `X-<app>-error: error.<key>` plus `X-<app>-params: <entity>`.
//!
//! Every function here is pure; the application name is carried explicitly by
//! [`AlertHeaders`] rather than read from global state.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use crate::problem::ProblemAlert;

/// Builder of alert header maps for one application name.
#[derive(Debug, Clone)]
pub struct AlertHeaders {
    app_name: Arc<str>,
}

impl AlertHeaders {
    #[must_use]
    pub fn new(app_name: impl Into<Arc<str>>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    fn header_name(&self, suffix: &str) -> Option<HeaderName> {
        HeaderName::from_bytes(format!("x-{}-{suffix}", self.app_name).as_bytes()).ok()
    }

    fn push(&self, headers: &mut HeaderMap, suffix: &str, value: &str) {
        let (Some(name), Ok(value)) = (self.header_name(suffix), HeaderValue::from_str(value))
        else {
            tracing::debug!(suffix, value, "skipping alert header that is not valid HTTP");
            return;
        };
        headers.insert(name, value);
    }

    /// Generic alert with a message key and one parameter.
    #[must_use]
    pub fn alert(&self, message: &str, param: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.push(&mut headers, "alert", message);
        self.push(&mut headers, "params", param);
        headers
    }

    #[must_use]
    pub fn entity_created(&self, entity: &str, id: &str) -> HeaderMap {
        self.alert(&format!("{}.{entity}.created", self.app_name), id)
    }

    #[must_use]
    pub fn entity_updated(&self, entity: &str, id: &str) -> HeaderMap {
        self.alert(&format!("{}.{entity}.updated", self.app_name), id)
    }

    #[must_use]
    pub fn entity_deleted(&self, entity: &str, id: &str) -> HeaderMap {
        self.alert(&format!("{}.{entity}.deleted", self.app_name), id)
    }

    /// Failure alert naming the error key and the entity it concerns.
    #[must_use]
    pub fn failure(&self, entity: Option<&str>, error_key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.push(&mut headers, "error", &format!("error.{error_key}"));
        if let Some(entity) = entity {
            self.push(&mut headers, "params", entity);
        }
        headers
    }
}

/// Adds failure alert headers to every Problem response that carries an error key.
pub async fn alert_headers_middleware(
    State(alerts): State<AlertHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if let Some(alert) = response.extensions_mut().remove::<ProblemAlert>() {
        tracing::warn!(
            entity = alert.entity.as_deref().unwrap_or("-"),
            error_key = %alert.error_key,
            status = response.status().as_u16(),
            "request failed"
        );
        let headers = alerts.failure(alert.entity.as_deref(), &alert.error_key);
        response.headers_mut().extend(headers);
    }

    response
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn creation_alert_names_entity_and_id() {
        let alerts = AlertHeaders::new("socctraderApp");
        let h = alerts.entity_created("team", "42");
        assert_eq!(
            header(&h, "x-socctraderapp-alert"),
            Some("socctraderApp.team.created")
        );
        assert_eq!(header(&h, "x-socctraderapp-params"), Some("42"));
    }

    #[test]
    fn update_and_delete_alerts_use_their_action() {
        let alerts = AlertHeaders::new("socctraderApp");
        let updated = alerts.entity_updated("league", "7");
        let deleted = alerts.entity_deleted("league", "7");
        assert_eq!(
            header(&updated, "x-socctraderapp-alert"),
            Some("socctraderApp.league.updated")
        );
        assert_eq!(
            header(&deleted, "x-socctraderapp-alert"),
            Some("socctraderApp.league.deleted")
        );
    }

    #[test]
    fn failure_alert_uses_error_prefix() {
        let alerts = AlertHeaders::new("socctraderApp");
        let h = alerts.failure(Some("team"), "idexists");
        assert_eq!(header(&h, "x-socctraderapp-error"), Some("error.idexists"));
        assert_eq!(header(&h, "x-socctraderapp-params"), Some("team"));
    }

    #[test]
    fn invalid_header_values_are_skipped() {
        let alerts = AlertHeaders::new("socctraderApp");
        let h = alerts.alert("ok", "bad\nvalue");
        assert!(h.get("x-socctraderapp-alert").is_some());
        assert!(h.get("x-socctraderapp-params").is_none());
    }
}
