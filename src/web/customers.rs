use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use super::state::AppState;
use super::{WebResult, found, parse_segment};
use crate::core::{EntityId, EntityKind};
use crate::domain::{Customer, CustomerDraft, CustomerPatch, CustomerStatus};
use crate::facade::{CustomerWithContacts, CustomerWithOpportunities};
use crate::metrics::CustomerStats;
use crate::query::ListQuery;
use crate::storage::Page;

pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Json<Page<Customer>>> {
    Ok(Json(state.crm.list::<Customer>(&query).await?))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(draft): Json<CustomerDraft>,
) -> WebResult<(StatusCode, Json<Customer>)> {
    let customer = state.crm.create_customer(draft).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<Customer>> {
    let customer = state.crm.get::<Customer>(id).await?;
    Ok(Json(found(customer, EntityKind::Customer, id)?))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(patch): Json<CustomerPatch>,
) -> WebResult<Json<Customer>> {
    let customer = state.crm.update_customer(id, patch).await?;
    Ok(Json(found(customer, EntityKind::Customer, id)?))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<StatusCode> {
    let removed = state.crm.delete::<Customer>(id).await?;
    found(removed.then_some(()), EntityKind::Customer, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn customer_with_contacts(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<CustomerWithContacts>> {
    let view = state.crm.customer_with_contacts(id).await?;
    Ok(Json(found(view, EntityKind::Customer, id)?))
}

pub async fn customer_with_opportunities(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<CustomerWithOpportunities>> {
    let view = state.crm.customer_with_opportunities(id).await?;
    Ok(Json(found(view, EntityKind::Customer, id)?))
}

pub async fn customers_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> WebResult<Json<Vec<Customer>>> {
    let status: CustomerStatus = parse_segment(&status)?;
    Ok(Json(state.crm.customers_by_status(status).await?))
}

pub async fn customers_by_industry(
    State(state): State<AppState>,
    Path(industry): Path<String>,
) -> WebResult<Json<Vec<Customer>>> {
    Ok(Json(state.crm.customers_in_industry(industry).await?))
}

pub async fn industries(State(state): State<AppState>) -> WebResult<Json<Vec<String>>> {
    Ok(Json(state.crm.industries().await?))
}

pub async fn customer_stats(State(state): State<AppState>) -> WebResult<Json<CustomerStats>> {
    Ok(Json(state.crm.metrics().customer_stats().await?))
}
