use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use rust_decimal::Decimal;

use super::state::AppState;
use super::{WebResult, found, parse_segment};
use crate::core::{EntityId, EntityKind};
use crate::domain::{Opportunity, OpportunityDraft, OpportunityPatch, OpportunityStage};
use crate::metrics::OpportunityStats;
use crate::query::ListQuery;
use crate::storage::Page;

pub async fn list_opportunities(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Json<Page<Opportunity>>> {
    Ok(Json(state.crm.list::<Opportunity>(&query).await?))
}

pub async fn create_opportunity(
    State(state): State<AppState>,
    Json(draft): Json<OpportunityDraft>,
) -> WebResult<(StatusCode, Json<Opportunity>)> {
    let opportunity = state.crm.create_opportunity(draft).await?;
    Ok((StatusCode::CREATED, Json(opportunity)))
}

pub async fn get_opportunity(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<Opportunity>> {
    let opportunity = state.crm.get::<Opportunity>(id).await?;
    Ok(Json(found(opportunity, EntityKind::Opportunity, id)?))
}

pub async fn update_opportunity(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(patch): Json<OpportunityPatch>,
) -> WebResult<Json<Opportunity>> {
    let opportunity = state.crm.update_opportunity(id, patch).await?;
    Ok(Json(found(opportunity, EntityKind::Opportunity, id)?))
}

pub async fn delete_opportunity(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<StatusCode> {
    let removed = state.crm.delete::<Opportunity>(id).await?;
    found(removed.then_some(()), EntityKind::Opportunity, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn opportunities_of_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<EntityId>,
) -> WebResult<Json<Vec<Opportunity>>> {
    Ok(Json(state.crm.opportunities_of_customer(customer_id).await?))
}

pub async fn opportunities_by_stage(
    State(state): State<AppState>,
    Path(stage): Path<String>,
) -> WebResult<Json<Vec<Opportunity>>> {
    let stage: OpportunityStage = parse_segment(&stage)?;
    Ok(Json(state.crm.opportunities_by_stage(stage).await?))
}

pub async fn pipeline_value(State(state): State<AppState>) -> WebResult<Json<Decimal>> {
    Ok(Json(state.crm.metrics().weighted_pipeline_value().await?))
}

pub async fn overdue_opportunities(
    State(state): State<AppState>,
) -> WebResult<Json<Vec<Opportunity>>> {
    Ok(Json(state.crm.overdue_opportunities().await?))
}

pub async fn opportunity_stats(
    State(state): State<AppState>,
) -> WebResult<Json<OpportunityStats>> {
    Ok(Json(state.crm.metrics().opportunity_stats().await?))
}
