use axum::routing::{get, post};
use axum::{Router, middleware};
use socckit::{AlertHeaders, alert_headers_middleware};
use socctrader_sdk::{Country, FinancialAction, Game, League, Region, Team};

use super::handlers::{self, Resource};
use crate::module::AppServices;

/// State shared by every handler.
#[derive(Clone, Debug)]
pub struct ApiState {
    pub services: AppServices,
    pub alerts: AlertHeaders,
}

/// The full REST surface: six resources, their search endpoints and the
/// sync management endpoints.
pub fn router(services: AppServices) -> Router {
    let alerts = AlertHeaders::new(services.config.app_name.as_str());
    let state = ApiState {
        services,
        alerts: alerts.clone(),
    };

    Router::new()
        .merge(resource::<Country>())
        .merge(resource::<Region>())
        .merge(resource::<League>())
        .merge(resource::<Team>())
        .merge(resource::<Game>())
        .merge(resource::<FinancialAction>())
        .route("/api/_reconcile", post(handlers::reconcile))
        .route("/api/_sync/status", get(handlers::sync_status))
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn_with_state(alerts, alert_headers_middleware))
        .with_state(state)
}

fn resource<E: Resource>() -> Router<ApiState> {
    let collection = E::KIND.collection();

    Router::new()
        .route(
            &format!("/api/{collection}"),
            post(handlers::create::<E>)
                .put(handlers::update::<E>)
                .get(handlers::list::<E>),
        )
        .route(
            &format!("/api/{collection}/{{id}}"),
            get(handlers::get::<E>).delete(handlers::delete::<E>),
        )
        .route(
            &format!("/api/_search/{collection}"),
            get(handlers::search::<E>),
        )
}
