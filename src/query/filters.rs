//! Predicates behind the filtered listings.

use crate::core::EntityId;
use crate::domain::{
    Activity, ActivityPriority, ActivityStatus, ActivityType, Contact, ContactStatus, Customer,
    CustomerStatus, Lead, LeadSource, LeadStatus, Opportunity, OpportunityStage,
};
use crate::storage::Filter;

pub fn customers_with_status(status: CustomerStatus) -> Filter<Customer> {
    Filter::new(move |c: &Customer| c.status == status)
}

pub fn customers_in_industry(industry: String) -> Filter<Customer> {
    Filter::new(move |c: &Customer| c.industry.as_deref() == Some(industry.as_str()))
}

pub fn contacts_with_status(status: ContactStatus) -> Filter<Contact> {
    Filter::new(move |c: &Contact| c.status == status)
}

pub fn contacts_of_customer(customer_id: EntityId) -> Filter<Contact> {
    Filter::new(move |c: &Contact| c.belongs_to(customer_id))
}

pub fn primary_contact_of(customer_id: EntityId) -> Filter<Contact> {
    Filter::new(move |c: &Contact| c.is_primary && c.belongs_to(customer_id))
}

pub fn leads_with_status(status: LeadStatus) -> Filter<Lead> {
    Filter::new(move |l: &Lead| l.status == status)
}

pub fn leads_from_source(source: LeadSource) -> Filter<Lead> {
    Filter::new(move |l: &Lead| l.source == Some(source))
}

pub fn opportunities_in_stage(stage: OpportunityStage) -> Filter<Opportunity> {
    Filter::new(move |o: &Opportunity| o.stage == stage)
}

pub fn opportunities_of_customer(customer_id: EntityId) -> Filter<Opportunity> {
    Filter::new(move |o: &Opportunity| o.customer_id == customer_id)
}

pub fn activities_with_status(status: ActivityStatus) -> Filter<Activity> {
    Filter::new(move |a: &Activity| a.status == status)
}

pub fn activities_of_type(activity_type: ActivityType) -> Filter<Activity> {
    Filter::new(move |a: &Activity| a.activity_type == activity_type)
}

/// Planned or in-progress activities of one priority.
pub fn open_activities_with_priority(priority: ActivityPriority) -> Filter<Activity> {
    Filter::new(move |a: &Activity| {
        a.priority == priority
            && matches!(a.status, ActivityStatus::Planned | ActivityStatus::InProgress)
    })
}

/// Which weak link an activity listing follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLink {
    Customer(EntityId),
    Contact(EntityId),
    Opportunity(EntityId),
    Lead(EntityId),
}

impl ActivityLink {
    pub fn matches(self, activity: &Activity) -> bool {
        match self {
            Self::Customer(id) => activity.customer_id == Some(id),
            Self::Contact(id) => activity.contact_id == Some(id),
            Self::Opportunity(id) => activity.opportunity_id == Some(id),
            Self::Lead(id) => activity.lead_id == Some(id),
        }
    }
}

pub fn activities_linked_to(link: ActivityLink) -> Filter<Activity> {
    Filter::new(move |a: &Activity| link.matches(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActivityDraft;
    use crate::lifecycle::Lifecycle;
    use chrono::Utc;

    fn activity(status: ActivityStatus, priority: ActivityPriority) -> Activity {
        let mut draft = ActivityDraft::new("Follow up", ActivityType::FollowUp);
        draft.status = Some(status);
        draft.priority = Some(priority);
        draft.lead_id = Some(EntityId(4));
        Activity::apply_create_defaults(draft, Utc::now())
    }

    #[test]
    fn priority_filter_only_keeps_open_work() {
        let filter = open_activities_with_priority(ActivityPriority::High);
        assert!(filter.matches(&activity(ActivityStatus::Planned, ActivityPriority::High)));
        assert!(filter.matches(&activity(ActivityStatus::InProgress, ActivityPriority::High)));
        assert!(!filter.matches(&activity(ActivityStatus::Completed, ActivityPriority::High)));
        assert!(!filter.matches(&activity(ActivityStatus::Planned, ActivityPriority::Low)));
    }

    #[test]
    fn activity_links() {
        let a = activity(ActivityStatus::Planned, ActivityPriority::Medium);
        assert!(activities_linked_to(ActivityLink::Lead(EntityId(4))).matches(&a));
        assert!(!activities_linked_to(ActivityLink::Lead(EntityId(5))).matches(&a));
        assert!(!activities_linked_to(ActivityLink::Customer(EntityId(4))).matches(&a));
    }
}
