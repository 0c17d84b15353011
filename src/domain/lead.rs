use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Entity, LeadSource, LeadStatus, full_name};
use crate::core::{EntityId, EntityKind, SortValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: LeadStatus,
    pub source: Option<LeadSource>,
    pub score: u32,
    pub estimated_value: Option<Decimal>,
    pub notes: Option<String>,
    pub converted_at: Option<DateTime<Utc>>,
    pub converted_customer_id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDraft {
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub score: Option<u32>,
    pub estimated_value: Option<Decimal>,
    pub notes: Option<String>,
}

impl LeadDraft {
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
pub struct LeadPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub score: Option<u32>,
    pub estimated_value: Option<Decimal>,
    pub notes: Option<String>,
}

impl Lead {
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }

    pub fn is_converted(&self) -> bool {
        self.status == LeadStatus::Converted
    }

    pub fn apply_patch(&self, patch: LeadPatch) -> Lead {
        let mut next = self.clone();
        if let Some(first_name) = patch.first_name {
            next.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = patch.last_name {
            next.last_name = last_name.trim().to_string();
        }
        next.company = patch.company.or(next.company);
        next.job_title = patch.job_title.or(next.job_title);
        next.email = patch.email.or(next.email);
        next.phone = patch.phone.or(next.phone);
        next.status = patch.status.unwrap_or(next.status);
        next.source = patch.source.or(next.source);
        next.score = patch.score.unwrap_or(next.score);
        next.estimated_value = patch.estimated_value.or(next.estimated_value);
        next.notes = patch.notes.or(next.notes);
        next
    }
}

impl Entity for Lead {
    const KIND: EntityKind = EntityKind::Lead;

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
            "company" => SortValue::optional_text(self.company.as_deref()),
            "email" => SortValue::optional_text(self.email.as_deref()),
            "status" => SortValue::Text(self.status.as_str().to_string()),
            "source" => SortValue::optional_text(self.source.map(LeadSource::as_str)),
            "score" => SortValue::Integer(i64::from(self.score)),
            "estimatedValue" => SortValue::optional_decimal(self.estimated_value),
            "convertedAt" => SortValue::optional_timestamp(self.converted_at),
            "createdAt" => SortValue::Timestamp(self.created_at),
            "updatedAt" => SortValue::Timestamp(self.updated_at),
            _ => return None,
        };
        Some(value)
    }
}
