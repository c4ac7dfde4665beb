//! Handlers shared by every resource, generic over the record type.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, RawQuery, State};
use axum::response::Response;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use socckit::prelude::*;
use socctrader_sdk::{Country, FinancialAction, Game, League, Region, Team};
use tracing::instrument;

use super::dto::{CountryDto, FinancialActionDto, GameDto, LeagueDto, RegionDto, TeamDto};
use super::error::{entity_problem, unreadable_request};
use super::routes::ApiState;
use crate::domain::error::DomainError;
use crate::domain::record::Record;
use crate::domain::service::RecordService;
use crate::domain::sync::{ReconcileReport, SyncStatus};
use crate::module::AppServices;

/// A record type exposed as a REST collection.
pub trait Resource: Record {
    type Dto: Serialize + DeserializeOwned + From<Self> + Into<Self::Draft> + Send + 'static;

    fn dto_id(dto: &Self::Dto) -> Option<i64>;

    fn service(services: &AppServices) -> &RecordService<Self>;
}

impl Resource for Country {
    type Dto = CountryDto;

    fn dto_id(dto: &CountryDto) -> Option<i64> {
        dto.id
    }

    fn service(services: &AppServices) -> &RecordService<Self> {
        &services.countries
    }
}

impl Resource for Region {
    type Dto = RegionDto;

    fn dto_id(dto: &RegionDto) -> Option<i64> {
        dto.id
    }

    fn service(services: &AppServices) -> &RecordService<Self> {
        &services.regions
    }
}

impl Resource for League {
    type Dto = LeagueDto;

    fn dto_id(dto: &LeagueDto) -> Option<i64> {
        dto.id
    }

    fn service(services: &AppServices) -> &RecordService<Self> {
        &services.leagues
    }
}

impl Resource for Team {
    type Dto = TeamDto;

    fn dto_id(dto: &TeamDto) -> Option<i64> {
        dto.id
    }

    fn service(services: &AppServices) -> &RecordService<Self> {
        &services.teams
    }
}

impl Resource for Game {
    type Dto = GameDto;

    fn dto_id(dto: &GameDto) -> Option<i64> {
        dto.id
    }

    fn service(services: &AppServices) -> &RecordService<Self> {
        &services.games
    }
}

impl Resource for FinancialAction {
    type Dto = FinancialActionDto;

    fn dto_id(dto: &FinancialActionDto) -> Option<i64> {
        dto.id
    }

    fn service(services: &AppServices) -> &RecordService<Self> {
        &services.financial_actions
    }
}

fn collection_path<E: Resource>() -> String {
    format!("/api/{}", E::KIND.collection())
}

fn search_path<E: Resource>() -> String {
    format!("/api/_search/{}", E::KIND.collection())
}

fn fail<E: Resource>(e: DomainError) -> Problem {
    entity_problem(E::KIND.name(), e)
}

fn read_body<E: Resource>(payload: Result<Json<E::Dto>, JsonRejection>) -> ApiResult<E::Dto> {
    payload
        .map(|Json(dto)| dto)
        .map_err(|rejection| unreadable_request(E::KIND.name(), rejection.body_text()))
}

fn page_request<E: Resource>(state: &ApiState, raw: Option<&str>) -> ApiResult<PageRequest> {
    PageRequest::from_query(raw, state.services.page_limits())
        .map_err(|e| unreadable_request(E::KIND.name(), e.to_string()))
}

async fn create_record<E: Resource>(state: &ApiState, dto: E::Dto) -> ApiResult<Response> {
    let record = E::service(&state.services)
        .create(dto.into())
        .await
        .map_err(fail::<E>)?;

    let id = record.id().to_string();
    let headers = state.alerts.entity_created(E::KIND.name(), &id);
    Ok(created_json(
        E::Dto::from(record),
        &collection_path::<E>(),
        &id,
        headers,
    ))
}

/// `POST /api/{collection}`
#[instrument(skip_all, fields(kind = %E::KIND))]
pub async fn create<E: Resource>(
    State(state): State<ApiState>,
    payload: Result<Json<E::Dto>, JsonRejection>,
) -> ApiResult<Response> {
    let dto = read_body::<E>(payload)?;
    if E::dto_id(&dto).is_some() {
        return Err(fail::<E>(DomainError::id_exists(E::KIND)));
    }
    create_record::<E>(&state, dto).await
}

/// `PUT /api/{collection}`; a body without `id` is created instead.
#[instrument(skip_all, fields(kind = %E::KIND))]
pub async fn update<E: Resource>(
    State(state): State<ApiState>,
    payload: Result<Json<E::Dto>, JsonRejection>,
) -> ApiResult<Response> {
    let dto = read_body::<E>(payload)?;
    let Some(id) = E::dto_id(&dto) else {
        return create_record::<E>(&state, dto).await;
    };

    let record = E::service(&state.services)
        .update(id, dto.into())
        .await
        .map_err(fail::<E>)?;

    let headers = state.alerts.entity_updated(E::KIND.name(), &id.to_string());
    Ok(ok_json(E::Dto::from(record), headers))
}

/// `GET /api/{collection}?page=&size=&sort=`
pub async fn list<E: Resource>(
    State(state): State<ApiState>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Response> {
    let request = page_request::<E>(&state, raw.as_deref())?;
    let page = E::service(&state.services)
        .list(&request)
        .await
        .map_err(fail::<E>)?
        .map_items(E::Dto::from);

    let headers = pagination_headers(&page, &collection_path::<E>(), None);
    Ok(ok_json(page.items, headers))
}

/// `GET /api/{collection}/{id}`
pub async fn get<E: Resource>(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<E::Dto>> {
    let record = E::service(&state.services)
        .get(id)
        .await
        .map_err(fail::<E>)?;
    Ok(Json(record.into()))
}

/// `DELETE /api/{collection}/{id}`; deleting an unknown id also succeeds.
pub async fn delete<E: Resource>(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    E::service(&state.services)
        .delete(id)
        .await
        .map_err(fail::<E>)?;

    let headers = state.alerts.entity_deleted(E::KIND.name(), &id.to_string());
    Ok(ok_empty(headers))
}

/// `GET /api/_search/{collection}?query=&page=&size=`
pub async fn search<E: Resource>(
    State(state): State<ApiState>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Response> {
    let request = page_request::<E>(&state, raw.as_deref())?;
    let query = socckit::page::query_param(raw.as_deref(), "query").unwrap_or_default();

    let page = E::service(&state.services)
        .search(&query, &request)
        .await
        .map_err(fail::<E>)?
        .map_items(E::Dto::from);

    let headers = pagination_headers(&page, &search_path::<E>(), Some(query.as_str()));
    Ok(ok_json(page.items, headers))
}

/// `POST /api/_reconcile`
pub async fn reconcile(State(state): State<ApiState>) -> ApiResult<Json<ReconcileReport>> {
    let report = state
        .services
        .reconcile()
        .await
        .map_err(|e| entity_problem("reconcile", e))?;
    Ok(Json(report))
}

/// `GET /api/_sync/status`
pub async fn sync_status(State(state): State<ApiState>) -> Json<SyncStatus> {
    Json(state.services.sync_status())
}

/// `GET /health`
pub async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    let status = state.services.sync_status();
    Json(json!({
        "status": "UP",
        "search": {
            "backend": status.backend,
            "pending": status.pending,
        }
    }))
}
