use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Entity, OpportunitySource, OpportunityStage};
use crate::core::{EntityId, EntityKind, SortValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub stage: OpportunityStage,
    /// Win probability in percent, 0..=100.
    pub probability: u8,
    pub expected_close_date: Option<NaiveDate>,
    pub actual_close_date: Option<NaiveDate>,
    pub source: Option<OpportunitySource>,
    pub notes: Option<String>,
    pub customer_id: EntityId,
    pub primary_contact_id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a deal. `amount` and `customerId` are required;
/// validation rejects drafts without them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityDraft {
    pub name: String,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub stage: Option<OpportunityStage>,
    pub probability: Option<u8>,
    pub expected_close_date: Option<NaiveDate>,
    pub source: Option<OpportunitySource>,
    pub notes: Option<String>,
    pub customer_id: Option<EntityId>,
    pub primary_contact_id: Option<EntityId>,
}

impl OpportunityDraft {
    pub fn new(name: impl Into<String>, amount: Decimal, customer_id: EntityId) -> Self {
        Self {
            name: name.into(),
            amount: Some(amount),
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub stage: Option<OpportunityStage>,
    pub probability: Option<u8>,
    pub expected_close_date: Option<NaiveDate>,
    pub source: Option<OpportunitySource>,
    pub notes: Option<String>,
    pub primary_contact_id: Option<EntityId>,
}

impl Opportunity {
    pub fn is_open(&self) -> bool {
        !self.stage.is_closed()
    }

    /// `amount × probability / 100`, the deal's contribution to the pipeline.
    /// Dividing first keeps every representable amount in range.
    pub fn weighted_amount(&self) -> Decimal {
        (self.amount / Decimal::ONE_HUNDRED).saturating_mul(Decimal::from(self.probability))
    }

    /// Applies a patch without deriving anything; stage-driven probability
    /// and close-date stamping happen in the lifecycle rules afterwards.
    pub fn apply_patch(&self, patch: OpportunityPatch) -> Opportunity {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        next.description = patch.description.or(next.description);
        next.amount = patch.amount.unwrap_or(next.amount);
        next.stage = patch.stage.unwrap_or(next.stage);
        next.probability = patch.probability.unwrap_or(next.probability);
        next.expected_close_date = patch.expected_close_date.or(next.expected_close_date);
        next.source = patch.source.or(next.source);
        next.notes = patch.notes.or(next.notes);
        next.primary_contact_id = patch.primary_contact_id.or(next.primary_contact_id);
        next
    }
}

impl Entity for Opportunity {
    const KIND: EntityKind = EntityKind::Opportunity;

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
            "name" => SortValue::text(&self.name),
            "amount" => SortValue::Decimal(self.amount),
            // stage sorts in pipeline order, not alphabetically
            "stage" => SortValue::Integer(self.stage as i64),
            "probability" => SortValue::Integer(i64::from(self.probability)),
            "expectedCloseDate" => SortValue::optional_date(self.expected_close_date),
            "actualCloseDate" => SortValue::optional_date(self.actual_close_date),
            "source" => SortValue::optional_text(self.source.map(OpportunitySource::as_str)),
            "customerId" => SortValue::Integer(self.customer_id.get() as i64),
            "createdAt" => SortValue::Timestamp(self.created_at),
            "updatedAt" => SortValue::Timestamp(self.updated_at),
            _ => return None,
        };
        Some(value)
    }
}
