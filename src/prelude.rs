//! Common imports for applications embedding the funnel.
//!
//! `use crm_core::prelude::*;` brings in the façade, the entity types with
//! their drafts and patches, and the store traits.

pub use crate::core::{Clock, CrmError, EntityId, EntityKind, FixedClock, Result, SystemClock};
pub use crate::domain::{
    Activity, ActivityDraft, ActivityPatch, ActivityPriority, ActivityStatus, ActivityType,
    Contact, ContactDraft, ContactPatch, ContactStatus, Customer, CustomerDraft, CustomerPatch,
    CustomerStatus, Entity, Lead, LeadDraft, LeadPatch, LeadSource, LeadStatus, Opportunity,
    OpportunityDraft, OpportunityPatch, OpportunitySource, OpportunityStage,
};
pub use crate::facade::{ConvertLead, Crm};
pub use crate::query::{ActivityLink, ListQuery};
pub use crate::storage::{
    ConversionStore, CrmStore, EntityStore, InMemoryStore, Page, PageRequest, Reconcile,
};
