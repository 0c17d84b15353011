use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use super::state::AppState;
use super::{WebResult, found, parse_segment};
use crate::core::{EntityId, EntityKind};
use crate::domain::{Contact, ContactDraft, ContactPatch, ContactStatus};
use crate::facade::ContactWithActivities;
use crate::metrics::ContactStats;
use crate::query::ListQuery;
use crate::storage::Page;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
}

pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> WebResult<Json<Page<Contact>>> {
    Ok(Json(state.crm.list::<Contact>(&query).await?))
}

pub async fn create_contact(
    State(state): State<AppState>,
    Json(draft): Json<ContactDraft>,
) -> WebResult<(StatusCode, Json<Contact>)> {
    let contact = state.crm.create_contact(draft).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<Contact>> {
    let contact = state.crm.get::<Contact>(id).await?;
    Ok(Json(found(contact, EntityKind::Contact, id)?))
}

pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(patch): Json<ContactPatch>,
) -> WebResult<Json<Contact>> {
    let contact = state.crm.update_contact(id, patch).await?;
    Ok(Json(found(contact, EntityKind::Contact, id)?))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<StatusCode> {
    let removed = state.crm.delete::<Contact>(id).await?;
    found(removed.then_some(()), EntityKind::Contact, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn contact_with_activities(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> WebResult<Json<ContactWithActivities>> {
    let view = state.crm.contact_with_activities(id).await?;
    Ok(Json(found(view, EntityKind::Contact, id)?))
}

pub async fn contacts_of_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<EntityId>,
) -> WebResult<Json<Vec<Contact>>> {
    Ok(Json(state.crm.contacts_of_customer(customer_id).await?))
}

pub async fn primary_contact(
    State(state): State<AppState>,
    Path(customer_id): Path<EntityId>,
) -> WebResult<Json<Contact>> {
    let contact = state.crm.primary_contact(customer_id).await?;
    Ok(Json(found(
        contact,
        EntityKind::Contact,
        format!("(primary of customer {customer_id})"),
    )?))
}

pub async fn search_customer_contacts(
    State(state): State<AppState>,
    Path(customer_id): Path<EntityId>,
    Query(params): Query<SearchParams>,
) -> WebResult<Json<Vec<Contact>>> {
    let contacts = state
        .crm
        .search_customer_contacts(customer_id, &params.search)
        .await?;
    Ok(Json(contacts))
}

pub async fn contacts_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> WebResult<Json<Vec<Contact>>> {
    let status: ContactStatus = parse_segment(&status)?;
    Ok(Json(state.crm.contacts_by_status(status).await?))
}

pub async fn contact_stats(State(state): State<AppState>) -> WebResult<Json<ContactStats>> {
    Ok(Json(state.crm.metrics().contact_stats().await?))
}
