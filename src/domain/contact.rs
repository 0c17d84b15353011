use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContactStatus, Entity, full_name};
use crate::core::{EntityId, EntityKind, SortValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub linkedin_url: Option<String>,
    pub status: ContactStatus,
    pub is_primary: bool,
    pub customer_id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub linkedin_url: Option<String>,
    pub status: Option<ContactStatus>,
    pub is_primary: Option<bool>,
    pub customer_id: Option<EntityId>,
}

impl ContactDraft {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub linkedin_url: Option<String>,
    pub status: Option<ContactStatus>,
    pub is_primary: Option<bool>,
    pub customer_id: Option<EntityId>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }

    pub fn belongs_to(&self, customer_id: EntityId) -> bool {
        self.customer_id == Some(customer_id)
    }

    pub fn apply_patch(&self, patch: ContactPatch) -> Contact {
        let mut next = self.clone();
        if let Some(first_name) = patch.first_name {
            next.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = patch.last_name {
            next.last_name = last_name.trim().to_string();
        }
        next.job_title = patch.job_title.or(next.job_title);
        next.email = patch.email.or(next.email);
        next.phone = patch.phone.or(next.phone);
        next.mobile = patch.mobile.or(next.mobile);
        next.linkedin_url = patch.linkedin_url.or(next.linkedin_url);
        next.status = patch.status.unwrap_or(next.status);
        next.is_primary = patch.is_primary.unwrap_or(next.is_primary);
        next.customer_id = patch.customer_id.or(next.customer_id);
        next
    }
}

impl Entity for Contact {
    const KIND: EntityKind = EntityKind::Contact;

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn sort_key(&self, field: &str) -> Option<SortValue> {
        let value = match field {
            "id" => SortValue::Integer(self.id.get() as i64),
            "firstName" => SortValue::text(&self.first_name),
            "lastName" => SortValue::text(&self.last_name),
            "jobTitle" => SortValue::optional_text(self.job_title.as_deref()),
            "email" => SortValue::optional_text(self.email.as_deref()),
            "status" => SortValue::Text(self.status.as_str().to_string()),
            "isPrimary" => SortValue::Boolean(self.is_primary),
            "createdAt" => SortValue::Timestamp(self.created_at),
            "updatedAt" => SortValue::Timestamp(self.updated_at),
            _ => return None,
        };
        Some(value)
    }
}
