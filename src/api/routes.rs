use crate::api::api_error::APIError;
use crate::api::model::{ListRecordsResponse, Paging};
use crate::api::server::AppState;
use crate::api::tenant::Tenant;
use crate::error::Error;
use crate::store::{Record, RecordId};
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::json;
use std::collections::HashMap;
use tower_http::trace::TraceLayer;

const RECORD_PARAM: &str = "record_id";

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(health_check))
        .route(
            "/directory/v1/org/:organization_id/domains/:tl_domain/dns",
            get(list_records).post(create_record),
        )
        .route(
            "/directory/v1/org/:organization_id/domains/:tl_domain/dns/:record_id",
            delete(delete_record),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

async fn list_records(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListRecordsResponse>, APIError> {
    let paging = Paging::from(&query);
    let records = state
        .store
        .list(tenant.organization_id, &tenant.domain)
        .await?;
    Ok(Json(paging.window(&records)))
}

async fn create_record(
    State(state): State<AppState>,
    tenant: Tenant,
    WithRejection(Json(payload), _): WithRejection<Json<Record>, APIError>,
) -> Result<Json<Record>, APIError> {
    let record = state
        .store
        .append(tenant.organization_id, &tenant.domain, payload)
        .await?;
    tracing::info!(
        "added {} record {} \"{}\" to {}/{}",
        record.record_type,
        record.record_id,
        record.name,
        tenant.organization_id,
        tenant.domain
    );
    Ok(Json(record))
}

async fn delete_record(
    State(state): State<AppState>,
    tenant: Tenant,
    params: Result<Path<HashMap<String, String>>, PathRejection>,
) -> Result<Json<serde_json::Value>, APIError> {
    let Path(params) = params.map_err(|rejection| Error::InvalidRecordId(rejection.to_string()))?;
    let raw = params.get(RECORD_PARAM).map(String::as_str).unwrap_or_default();
    let record_id: RecordId = raw
        .parse()
        .map_err(|_| Error::InvalidRecordId(raw.to_string()))?;

    let (org_id, domain) = (tenant.organization_id, tenant.domain.as_str());
    let Some(index) = state.store.position(org_id, domain, record_id).await? else {
        tracing::debug!("record {record_id} not found in {org_id}/{domain}");
        return Err(Error::RecordNotFound(record_id).into());
    };
    let removed = state
        .store
        .remove_at(org_id, domain, index, record_id)
        .await?;
    tracing::info!(
        "deleted {} record {record_id} \"{}\" from {org_id}/{domain}",
        removed.record_type,
        removed.name
    );
    Ok(Json(json!({})))
}
