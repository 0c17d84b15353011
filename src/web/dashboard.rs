use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::WebResult;
use super::state::AppState;
use crate::domain::{Activity, ActivityType, LeadSource, OpportunityStage};
use crate::metrics::{DashboardStats, StageTotals};

pub const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

pub async fn dashboard_stats(State(state): State<AppState>) -> WebResult<Json<DashboardStats>> {
    let now = state.crm.now();
    Ok(Json(state.crm.metrics().dashboard(now).await?))
}

pub async fn lead_sources(
    State(state): State<AppState>,
) -> WebResult<Json<BTreeMap<LeadSource, u64>>> {
    Ok(Json(state.crm.metrics().lead_source_breakdown().await?))
}

pub async fn opportunity_stages(
    State(state): State<AppState>,
) -> WebResult<Json<BTreeMap<OpportunityStage, StageTotals>>> {
    Ok(Json(state.crm.metrics().stage_breakdown().await?))
}

pub async fn activity_types(
    State(state): State<AppState>,
) -> WebResult<Json<BTreeMap<ActivityType, u64>>> {
    Ok(Json(state.crm.metrics().activity_type_breakdown().await?))
}

pub async fn recent_activities(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> WebResult<Json<Vec<Activity>>> {
    Ok(Json(state.crm.metrics().recent_activities(params.limit).await?))
}
