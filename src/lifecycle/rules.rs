use chrono::{DateTime, Utc};

use super::Lifecycle;
use crate::core::EntityId;
use crate::domain::{
    Activity, ActivityDraft, ActivityStatus, ActivityType, Contact, ContactDraft, Customer,
    CustomerDraft, Lead, LeadDraft, LeadStatus, Opportunity, OpportunityDraft,
};

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

impl Lifecycle for Customer {
    type Draft = CustomerDraft;

    fn apply_create_defaults(draft: CustomerDraft, now: DateTime<Utc>) -> Self {
        Customer {
            id: EntityId::UNASSIGNED,
            company_name: trimmed(draft.company_name),
            industry: draft.industry,
            company_size: draft.company_size,
            website: draft.website,
            phone: draft.phone,
            email: draft.email,
            address: draft.address,
            city: draft.city,
            state: draft.state,
            postal_code: draft.postal_code,
            country: draft.country,
            status: draft.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_update_derivations(&mut self, old: &Self, now: DateTime<Utc>) {
        self.id = old.id;
        self.created_at = old.created_at;
        self.updated_at = now;
    }
}

impl Lifecycle for Contact {
    type Draft = ContactDraft;

    fn apply_create_defaults(draft: ContactDraft, now: DateTime<Utc>) -> Self {
        Contact {
            id: EntityId::UNASSIGNED,
            first_name: trimmed(draft.first_name),
            last_name: trimmed(draft.last_name),
            job_title: draft.job_title,
            email: draft.email,
            phone: draft.phone,
            mobile: draft.mobile,
            linkedin_url: draft.linkedin_url,
            status: draft.status.unwrap_or_default(),
            is_primary: draft.is_primary.unwrap_or(false),
            customer_id: draft.customer_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_update_derivations(&mut self, old: &Self, now: DateTime<Utc>) {
        self.id = old.id;
        self.created_at = old.created_at;
        self.updated_at = now;
    }
}

impl Lifecycle for Lead {
    type Draft = LeadDraft;

    fn apply_create_defaults(draft: LeadDraft, now: DateTime<Utc>) -> Self {
        let mut lead = Lead {
            id: EntityId::UNASSIGNED,
            first_name: trimmed(draft.first_name),
            last_name: trimmed(draft.last_name),
            company: draft.company,
            job_title: draft.job_title,
            email: draft.email,
            phone: draft.phone,
            status: draft.status.unwrap_or_default(),
            source: draft.source,
            score: draft.score.unwrap_or(0),
            estimated_value: draft.estimated_value,
            notes: draft.notes,
            converted_at: None,
            converted_customer_id: None,
            created_at: now,
            updated_at: now,
        };
        stamp_conversion(&mut lead, now);
        lead
    }

    fn apply_update_derivations(&mut self, old: &Self, now: DateTime<Utc>) {
        self.id = old.id;
        self.created_at = old.created_at;
        self.updated_at = now;
        // a patch never clears the conversion stamp
        self.converted_at = self.converted_at.or(old.converted_at);
        stamp_conversion(self, now);
    }
}

fn stamp_conversion(lead: &mut Lead, now: DateTime<Utc>) {
    if lead.status == LeadStatus::Converted && lead.converted_at.is_none() {
        lead.converted_at = Some(now);
    }
}

impl Lifecycle for Opportunity {
    type Draft = OpportunityDraft;

    fn apply_create_defaults(draft: OpportunityDraft, now: DateTime<Utc>) -> Self {
        let stage = draft.stage.unwrap_or_default();
        let mut opportunity = Opportunity {
            id: EntityId::UNASSIGNED,
            name: trimmed(draft.name),
            description: draft.description,
            amount: draft.amount.unwrap_or_default(),
            stage,
            probability: draft
                .probability
                .unwrap_or_else(|| stage.default_probability()),
            expected_close_date: draft.expected_close_date,
            actual_close_date: None,
            source: draft.source,
            notes: draft.notes,
            customer_id: draft.customer_id.unwrap_or_default(),
            primary_contact_id: draft.primary_contact_id,
            created_at: now,
            updated_at: now,
        };
        stamp_close_date(&mut opportunity, now);
        opportunity
    }

    fn apply_update_derivations(&mut self, old: &Self, now: DateTime<Utc>) {
        self.id = old.id;
        self.created_at = old.created_at;
        self.customer_id = old.customer_id;
        self.updated_at = now;
        self.actual_close_date = self.actual_close_date.or(old.actual_close_date);

        // stage wins over an explicit probability sent in the same update
        if self.stage != old.stage {
            self.probability = self.stage.default_probability();
        }
        stamp_close_date(self, now);
    }
}

fn stamp_close_date(opportunity: &mut Opportunity, now: DateTime<Utc>) {
    if opportunity.stage.is_closed() && opportunity.actual_close_date.is_none() {
        opportunity.actual_close_date = Some(now.date_naive());
    }
}

impl Lifecycle for Activity {
    type Draft = ActivityDraft;

    fn apply_create_defaults(draft: ActivityDraft, now: DateTime<Utc>) -> Self {
        let mut activity = Activity {
            id: EntityId::UNASSIGNED,
            subject: trimmed(draft.subject),
            description: draft.description,
            activity_type: draft.activity_type.unwrap_or(ActivityType::Task),
            status: draft.status.unwrap_or_default(),
            priority: draft.priority.unwrap_or_default(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            completed_at: None,
            outcome: draft.outcome,
            customer_id: draft.customer_id,
            contact_id: draft.contact_id,
            opportunity_id: draft.opportunity_id,
            lead_id: draft.lead_id,
            created_at: now,
            updated_at: now,
        };
        stamp_completion(&mut activity, now);
        activity
    }

    fn apply_update_derivations(&mut self, old: &Self, now: DateTime<Utc>) {
        self.id = old.id;
        self.created_at = old.created_at;
        self.updated_at = now;
        self.completed_at = self.completed_at.or(old.completed_at);
        stamp_completion(self, now);
    }
}

fn stamp_completion(activity: &mut Activity, now: DateTime<Utc>) {
    if activity.status == ActivityStatus::Completed && activity.completed_at.is_none() {
        activity.completed_at = Some(now);
    }
}
