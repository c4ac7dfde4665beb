//! HTTP middleware around the module router.
//!
//! Outermost first: `SetRequestId` -> `PropagateRequestId` -> Trace -> Timeout -> router.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderName, Request, Response, StatusCode};
use socckit::config::ServerConfig;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

const X_REQUEST_ID: &str = "x-request-id";

pub fn with_middleware(router: Router, server: &ServerConfig) -> Router {
    let x_request_id = HeaderName::from_static(X_REQUEST_ID);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            let rid = req
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("n/a");

            tracing::info_span!(
                "http_request",
                method = %req.method(),
                uri = %req.uri().path(),
                request_id = %rid,
                status = Empty,
                latency_ms = Empty,
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, span: &tracing::Span| {
            span.record("status", res.status().as_u16());
            span.record("latency_ms", latency.as_millis());
        });

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(PropagateRequestIdLayer::new(x_request_id))
            .layer(trace)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                Duration::from_secs(server.request_timeout_secs),
            )),
    )
}
