pub mod activity;
pub mod contact;
pub mod customer;
pub mod enums;
pub mod lead;
pub mod opportunity;

pub use activity::{Activity, ActivityDraft, ActivityPatch};
pub use contact::{Contact, ContactDraft, ContactPatch};
pub use customer::{Customer, CustomerDraft, CustomerPatch};
pub use enums::{
    ActivityPriority, ActivityStatus, ActivityType, ContactStatus, CustomerStatus, LeadSource,
    LeadStatus, OpportunitySource, OpportunityStage, UnknownVariant,
};
pub use lead::{Lead, LeadDraft, LeadPatch};
pub use opportunity::{Opportunity, OpportunityDraft, OpportunityPatch};

use crate::core::{EntityId, EntityKind, SortValue};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A persisted funnel record.
///
/// Implemented by the five entity structs; the store, the search façade and
/// the service are generic over it.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    fn set_id(&mut self, id: EntityId);

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    /// Projects a camelCase field name to a comparable key, or `None` when
    /// the field is not known for this entity.
    fn sort_key(&self, field: &str) -> Option<SortValue>;
}

/// Joins a first and last name the way every listing displays them.
pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{first_name} {last_name}")
}
