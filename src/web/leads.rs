use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use super::state::AppState;
use super::{WebResult, found, parse_segment};
use crate::core::{EntityId, EntityKind};
use crate::domain::{Lead, LeadDraft, LeadPatch, LeadSource, LeadStatus};
use crate::facade::ConvertLead;
use crate::metrics::LeadStats;
use crate::query::ListQuery;
use crate::storage::Page;

pub const DEFAULT_MIN_SCORE: u32 = 70;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScoreParams {
    #[serde(default = "default_min_score")]
    pub min_score: u32,
}

fn default_min_score() -> u32 {
    DEFAULT_MIN_SCORE
}

pub async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Json<Page<Lead>>> {
    Ok(Json(state.crm.list::<Lead>(&query).await?))
}

pub async fn create_lead(
    State(state): State<AppState>,
    Json(draft): Json<LeadDraft>,
) -> WebResult<(StatusCode, Json<Lead>)> {
    let lead = state.crm.create_lead(draft).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<Lead>> {
    let lead = state.crm.get::<Lead>(id).await?;
    Ok(Json(found(lead, EntityKind::Lead, id)?))
}

pub async fn update_lead(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(patch): Json<LeadPatch>,
) -> WebResult<Json<Lead>> {
    let lead = state.crm.update_lead(id, patch).await?;
    Ok(Json(found(lead, EntityKind::Lead, id)?))
}

pub async fn delete_lead(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<StatusCode> {
    let removed = state.crm.delete::<Lead>(id).await?;
    found(removed.then_some(()), EntityKind::Lead, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /leads/:id/convert?createCustomer=true`
pub async fn convert_lead(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Query(options): Query<ConvertLead>,
) -> WebResult<Json<Lead>> {
    let lead = state.crm.convert_lead(id, options).await?;
    Ok(Json(found(lead, EntityKind::Lead, id)?))
}

pub async fn leads_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> WebResult<Json<Vec<Lead>>> {
    let status: LeadStatus = parse_segment(&status)?;
    Ok(Json(state.crm.leads_by_status(status).await?))
}

pub async fn leads_by_source(
    State(state): State<AppState>,
    Path(source): Path<String>,
) -> WebResult<Json<Vec<Lead>>> {
    let source: LeadSource = parse_segment(&source)?;
    Ok(Json(state.crm.leads_by_source(source).await?))
}

pub async fn high_score_leads(
    State(state): State<AppState>,
    Query(params): Query<HighScoreParams>,
) -> WebResult<Json<Vec<Lead>>> {
    Ok(Json(state.crm.high_score_leads(params.min_score).await?))
}

pub async fn lead_stats(State(state): State<AppState>) -> WebResult<Json<LeadStats>> {
    Ok(Json(state.crm.metrics().lead_stats().await?))
}
