use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Duration;
use serde::Deserialize;

use super::state::AppState;
use super::{WebResult, found, parse_segment};
use crate::core::{EntityId, EntityKind};
use crate::domain::{Activity, ActivityDraft, ActivityPatch, ActivityStatus, ActivityType};
use crate::metrics::ActivityStats;
use crate::query::{ActivityLink, ListQuery};
use crate::storage::Page;

pub const DEFAULT_UPCOMING_HOURS: i64 = 24;

#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
    #[serde(default = "default_hours")]
    pub hours: i64,
}

fn default_hours() -> i64 {
    DEFAULT_UPCOMING_HOURS
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteParams {
    pub outcome: Option<String>,
}

pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Json<Page<Activity>>> {
    Ok(Json(state.crm.list::<Activity>(&query).await?))
}

pub async fn create_activity(
    State(state): State<AppState>,
    Json(draft): Json<ActivityDraft>,
) -> WebResult<(StatusCode, Json<Activity>)> {
    let activity = state.crm.create_activity(draft).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<Activity>> {
    let activity = state.crm.get::<Activity>(id).await?;
    Ok(Json(found(activity, EntityKind::Activity, id)?))
}

pub async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(patch): Json<ActivityPatch>,
) -> WebResult<Json<Activity>> {
    let activity = state.crm.update_activity(id, patch).await?;
    Ok(Json(found(activity, EntityKind::Activity, id)?))
}

pub async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<StatusCode> {
    let removed = state.crm.delete::<Activity>(id).await?;
    found(removed.then_some(()), EntityKind::Activity, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /activities/:id/complete?outcome=...`
pub async fn complete_activity(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Query(params): Query<CompleteParams>,
) -> WebResult<Json<Activity>> {
    let activity = state.crm.complete_activity(id, params.outcome).await?;
    Ok(Json(found(activity, EntityKind::Activity, id)?))
}

pub async fn activities_of_customer(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<Vec<Activity>>> {
    Ok(Json(state.crm.activities_linked(ActivityLink::Customer(id)).await?))
}

pub async fn activities_of_contact(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<Vec<Activity>>> {
    Ok(Json(state.crm.activities_linked(ActivityLink::Contact(id)).await?))
}

pub async fn activities_of_opportunity(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<Vec<Activity>>> {
    Ok(Json(state.crm.activities_linked(ActivityLink::Opportunity(id)).await?))
}

pub async fn activities_of_lead(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<Vec<Activity>>> {
    Ok(Json(state.crm.activities_linked(ActivityLink::Lead(id)).await?))
}

pub async fn activities_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> WebResult<Json<Vec<Activity>>> {
    let status: ActivityStatus = parse_segment(&status)?;
    Ok(Json(state.crm.activities_by_status(status).await?))
}

pub async fn activities_by_type(
    State(state): State<AppState>,
    Path(activity_type): Path<String>,
) -> WebResult<Json<Vec<Activity>>> {
    let activity_type: ActivityType = parse_segment(&activity_type)?;
    Ok(Json(state.crm.activities_by_type(activity_type).await?))
}

pub async fn overdue_activities(State(state): State<AppState>) -> WebResult<Json<Vec<Activity>>> {
    Ok(Json(state.crm.overdue_activities().await?))
}

pub async fn upcoming_activities(
    State(state): State<AppState>,
    Query(params): Query<UpcomingParams>,
) -> WebResult<Json<Vec<Activity>>> {
    let horizon = Duration::hours(params.hours.max(0));
    Ok(Json(state.crm.upcoming_activities(horizon).await?))
}

pub async fn activity_stats(State(state): State<AppState>) -> WebResult<Json<ActivityStats>> {
    let now = state.crm.now();
    Ok(Json(state.crm.metrics().activity_stats(now).await?))
}
