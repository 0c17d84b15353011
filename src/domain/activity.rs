use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActivityPriority, ActivityStatus, ActivityType, Entity};
use crate::core::{EntityId, EntityKind, SortValue};

/// An interaction that moves a deal or lead forward.
///
/// The four links are weak: they hold ids only and may dangle after the
/// linked record is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: EntityId,
    pub subject: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    pub priority: ActivityPriority,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub outcome: Option<String>,
    pub customer_id: Option<EntityId>,
    pub contact_id: Option<EntityId>,
    pub opportunity_id: Option<EntityId>,
    pub lead_id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    pub subject: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<ActivityType>,
    pub status: Option<ActivityStatus>,
    pub priority: Option<ActivityPriority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub outcome: Option<String>,
    pub customer_id: Option<EntityId>,
    pub contact_id: Option<EntityId>,
    pub opportunity_id: Option<EntityId>,
    pub lead_id: Option<EntityId>,
}

impl ActivityDraft {
    pub fn new(subject: impl Into<String>, activity_type: ActivityType) -> Self {
        Self {
            subject: subject.into(),
            activity_type: Some(activity_type),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPatch {
    pub subject: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<ActivityType>,
    pub status: Option<ActivityStatus>,
    pub priority: Option<ActivityPriority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub outcome: Option<String>,
    pub customer_id: Option<EntityId>,
    pub contact_id: Option<EntityId>,
    pub opportunity_id: Option<EntityId>,
    pub lead_id: Option<EntityId>,
}

impl Activity {
    /// True while the activity is unsettled and its start time has passed.
    /// Computed on read; the value flips as time moves without any write.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_settled() && self.start_date.is_some_and(|start| start < now)
    }

    pub fn apply_patch(&self, patch: ActivityPatch) -> Activity {
        let mut next = self.clone();
        if let Some(subject) = patch.subject {
            next.subject = subject.trim().to_string();
        }
        next.description = patch.description.or(next.description);
        next.activity_type = patch.activity_type.unwrap_or(next.activity_type);
        next.status = patch.status.unwrap_or(next.status);
        next.priority = patch.priority.unwrap_or(next.priority);
        next.start_date = patch.start_date.or(next.start_date);
        next.end_date = patch.end_date.or(next.end_date);
        next.outcome = patch.outcome.or(next.outcome);
        next.customer_id = patch.customer_id.or(next.customer_id);
        next.contact_id = patch.contact_id.or(next.contact_id);
        next.opportunity_id = patch.opportunity_id.or(next.opportunity_id);
        next.lead_id = patch.lead_id.or(next.lead_id);
        next
    }
}

impl Entity for Activity {
    const KIND: EntityKind = EntityKind::Activity;

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
            "subject" => SortValue::text(&self.subject),
            "type" => SortValue::Text(self.activity_type.as_str().to_string()),
            "status" => SortValue::Text(self.status.as_str().to_string()),
            "priority" => SortValue::Integer(self.priority as i64),
            "startDate" => SortValue::optional_timestamp(self.start_date),
            "endDate" => SortValue::optional_timestamp(self.end_date),
            "completedAt" => SortValue::optional_timestamp(self.completed_at),
            "createdAt" => SortValue::Timestamp(self.created_at),
            "updatedAt" => SortValue::Timestamp(self.updated_at),
            _ => return None,
        };
        Some(value)
    }
}
