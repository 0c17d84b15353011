//! Service façade: validate, derive, persist.
//!
//! Every mutation runs validation first, then the lifecycle rules with the
//! clock's `now`, then exactly one store write. That write also demotes
//! rival primary contacts, or opens the customer of a converted lead.
//! Lookups of missing ids return `Ok(None)`.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use super::views::{ContactWithActivities, ConvertLead, CustomerWithContacts, CustomerWithOpportunities};
use crate::core::{Clock, CrmError, EntityId, Result};
use crate::domain::{
    Activity, ActivityDraft, ActivityPatch, ActivityStatus, ActivityType, Contact, ContactDraft,
    ContactPatch, ContactStatus, Customer, CustomerDraft, CustomerPatch, CustomerStatus, Entity,
    Lead, LeadDraft, LeadPatch, LeadSource, LeadStatus, Opportunity, OpportunityDraft,
    OpportunityPatch, OpportunityStage, full_name,
};
use crate::lifecycle::{Lifecycle, demote_competing_primaries};
use crate::metrics::MetricsEngine;
use crate::query::filters::{self, ActivityLink};
use crate::query::{ListQuery, Searchable, customer_contacts_filter, search};
use crate::storage::{
    ConversionStore, CrmStore, EntityStore, Filter, Page, PageRequest, Reconcile, SortSpec,
};
use crate::validation::Validate;

pub const DEFAULT_PAGE_SIZE: usize = PageRequest::DEFAULT_SIZE;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct Crm {
    store: Arc<dyn CrmStore>,
    clock: Arc<dyn Clock>,
    metrics: MetricsEngine,
    default_page_size: usize,
    max_page_size: usize,
}

impl Crm {
    pub fn new(store: Arc<dyn CrmStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            metrics: MetricsEngine::new(store.clone()),
            store,
            clock,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_page_limits(mut self, default_size: usize, max_size: usize) -> Self {
        self.max_page_size = max_size.max(1);
        self.default_page_size = default_size.clamp(1, self.max_page_size);
        self
    }

    pub fn metrics(&self) -> &MetricsEngine {
        &self.metrics
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn store(&self) -> &(dyn CrmStore + 'static) {
        &*self.store
    }

    // ========================================================================
    // Generic reads
    // ========================================================================

    pub async fn get<E: Entity>(&self, id: EntityId) -> Result<Option<E>>
    where
        dyn CrmStore: EntityStore<E>,
    {
        EntityStore::<E>::get(self.store(), id).await
    }

    pub async fn exists<E: Entity>(&self, id: EntityId) -> Result<bool>
    where
        dyn CrmStore: EntityStore<E>,
    {
        EntityStore::<E>::exists(self.store(), id).await
    }

    /// Paged listing with optional free-text search over `E`'s field set.
    pub async fn list<E: Searchable>(&self, query: &ListQuery) -> Result<Page<E>>
    where
        dyn CrmStore: EntityStore<E>,
    {
        let page = query.page_request(E::DEFAULT_SORT, self.default_page_size, self.max_page_size);
        search::<E, dyn CrmStore>(self.store(), query.search.as_deref(), &page).await
    }

    /// Returns whether the row existed. Deleting a customer also deletes
    /// its contacts and opportunities.
    pub async fn delete<E: Entity>(&self, id: EntityId) -> Result<bool>
    where
        dyn CrmStore: EntityStore<E>,
    {
        let removed = EntityStore::<E>::delete(self.store(), id).await?;
        if removed {
            info!(kind = %E::KIND, id = %id, "deleted");
        }
        Ok(removed)
    }

    async fn find_all<E: Entity>(&self, filter: Filter<E>, sort: Option<SortSpec>) -> Result<Vec<E>>
    where
        dyn CrmStore: EntityStore<E>,
    {
        let page = match sort {
            Some(sort) => PageRequest::unpaged().sorted(sort),
            None => PageRequest::unpaged(),
        };
        Ok(EntityStore::<E>::query(self.store(), &filter, &page).await?.items)
    }

    async fn save<E: Entity>(&self, entity: E) -> Result<E>
    where
        dyn CrmStore: EntityStore<E>,
    {
        EntityStore::<E>::save(self.store(), entity).await
    }

    async fn require_customer(&self, field: &'static str, id: EntityId) -> Result<()> {
        if self.exists::<Customer>(id).await? {
            Ok(())
        } else {
            Err(CrmError::validation(field, format!("customer {id} does not exist")))
        }
    }

    // ========================================================================
    // Customers
    // ========================================================================

    pub async fn create_customer(&self, draft: CustomerDraft) -> Result<Customer> {
        draft.validate()?;
        let customer = Customer::apply_create_defaults(draft, self.now());
        let saved = self.save(customer).await?;
        info!(id = %saved.id, company = %saved.company_name, "customer created");
        Ok(saved)
    }

    pub async fn update_customer(&self, id: EntityId, patch: CustomerPatch) -> Result<Option<Customer>> {
        patch.validate()?;
        let Some(old) = self.get::<Customer>(id).await? else {
            return Ok(None);
        };
        let mut customer = old.apply_patch(patch);
        customer.apply_update_derivations(&old, self.now());
        let saved = self.save(customer).await?;
        info!(id = %saved.id, "customer updated");
        Ok(Some(saved))
    }

    pub async fn customer_with_contacts(&self, id: EntityId) -> Result<Option<CustomerWithContacts>> {
        let Some(customer) = self.get::<Customer>(id).await? else {
            return Ok(None);
        };
        let contacts = self.contacts_of_customer(id).await?;
        Ok(Some(CustomerWithContacts { customer, contacts }))
    }

    pub async fn customer_with_opportunities(
        &self,
        id: EntityId,
    ) -> Result<Option<CustomerWithOpportunities>> {
        let Some(customer) = self.get::<Customer>(id).await? else {
            return Ok(None);
        };
        let opportunities = self.opportunities_of_customer(id).await?;
        Ok(Some(CustomerWithOpportunities {
            customer,
            opportunities,
        }))
    }

    pub async fn customers_by_status(&self, status: CustomerStatus) -> Result<Vec<Customer>> {
        self.find_all(filters::customers_with_status(status), None).await
    }

    pub async fn customers_in_industry(&self, industry: impl Into<String>) -> Result<Vec<Customer>> {
        self.find_all(filters::customers_in_industry(industry.into()), None)
            .await
    }

    pub async fn industries(&self) -> Result<Vec<String>> {
        self.metrics.distinct_industries().await
    }

    // ========================================================================
    // Contacts
    // ========================================================================

    pub async fn create_contact(&self, draft: ContactDraft) -> Result<Contact> {
        draft.validate()?;
        if let Some(customer_id) = draft.customer_id {
            self.require_customer("customerId", customer_id).await?;
        }
        let now = self.now();
        let contact = Contact::apply_create_defaults(draft, now);
        let saved = self.save_contact(contact, now).await?;
        info!(id = %saved.id, primary = saved.is_primary, "contact created");
        Ok(saved)
    }

    pub async fn update_contact(&self, id: EntityId, patch: ContactPatch) -> Result<Option<Contact>> {
        patch.validate()?;
        if let Some(customer_id) = patch.customer_id {
            self.require_customer("customerId", customer_id).await?;
        }
        let Some(old) = self.get::<Contact>(id).await? else {
            return Ok(None);
        };
        let now = self.now();
        let mut contact = old.apply_patch(patch);
        contact.apply_update_derivations(&old, now);
        let saved = self.save_contact(contact, now).await?;
        info!(id = %saved.id, "contact updated");
        Ok(Some(saved))
    }

    /// Writes the contact and, in the same store write, demotes any rival
    /// primaries of its customer.
    async fn save_contact(&self, contact: Contact, now: DateTime<Utc>) -> Result<Contact> {
        if contact.customer_id.is_none() || !contact.is_primary {
            return self.save(contact).await;
        }
        let reconcile: Reconcile<Contact> = Box::new(move |saved: &Contact, rows: &[Contact]| {
            let demoted = demote_competing_primaries(saved, rows, now);
            if !demoted.is_empty() {
                debug!(demoted = demoted.len(), "demoting previous primary contacts");
            }
            demoted
        });
        EntityStore::<Contact>::save_reconciled(self.store(), contact, reconcile).await
    }

    pub async fn contact_with_activities(&self, id: EntityId) -> Result<Option<ContactWithActivities>> {
        let Some(contact) = self.get::<Contact>(id).await? else {
            return Ok(None);
        };
        let activities = self.activities_linked(ActivityLink::Contact(id)).await?;
        Ok(Some(ContactWithActivities {
            contact,
            activities,
        }))
    }

    pub async fn contacts_of_customer(&self, customer_id: EntityId) -> Result<Vec<Contact>> {
        self.find_all(filters::contacts_of_customer(customer_id), None)
            .await
    }

    pub async fn primary_contact(&self, customer_id: EntityId) -> Result<Option<Contact>> {
        let primaries = self
            .find_all(filters::primary_contact_of(customer_id), None)
            .await?;
        Ok(primaries.into_iter().next())
    }

    pub async fn contacts_by_status(&self, status: ContactStatus) -> Result<Vec<Contact>> {
        self.find_all(filters::contacts_with_status(status), None).await
    }

    /// Contacts of one customer matching `term` on first name, last name or
    /// email.
    pub async fn search_customer_contacts(&self, customer_id: EntityId, term: &str) -> Result<Vec<Contact>> {
        self.find_all(customer_contacts_filter(customer_id, Some(term)), None)
            .await
    }

    // ========================================================================
    // Leads
    // ========================================================================

    pub async fn create_lead(&self, draft: LeadDraft) -> Result<Lead> {
        draft.validate()?;
        let lead = Lead::apply_create_defaults(draft, self.now());
        let saved = self.save(lead).await?;
        info!(id = %saved.id, status = %saved.status, "lead created");
        Ok(saved)
    }

    pub async fn update_lead(&self, id: EntityId, patch: LeadPatch) -> Result<Option<Lead>> {
        patch.validate()?;
        let Some(old) = self.get::<Lead>(id).await? else {
            return Ok(None);
        };
        let mut lead = old.apply_patch(patch);
        lead.apply_update_derivations(&old, self.now());
        let saved = self.save(lead).await?;
        info!(id = %saved.id, status = %saved.status, "lead updated");
        Ok(Some(saved))
    }

    /// Marks the lead converted. `convertedAt` keeps its first value on
    /// repeated conversions.
    ///
    /// With `create_customer`, a customer named after the lead's company and
    /// a primary contact for the lead are created and linked from the lead.
    /// The three rows are written together or not at all.
    pub async fn convert_lead(&self, id: EntityId, options: ConvertLead) -> Result<Option<Lead>> {
        let Some(old) = self.get::<Lead>(id).await? else {
            return Ok(None);
        };
        let now = self.now();
        let mut lead = old.clone();
        lead.status = LeadStatus::Converted;
        lead.apply_update_derivations(&old, now);

        let saved = if options.create_customer && lead.converted_customer_id.is_none() {
            let (customer, contact) = customer_opened_for(&lead, now)?;
            let (customer, _, saved) = self.store().save_conversion(customer, contact, lead).await?;
            info!(customer_id = %customer.id, lead_id = %saved.id, "customer opened from lead");
            saved
        } else {
            self.save(lead).await?
        };
        info!(
            id = %saved.id,
            customer_id = ?saved.converted_customer_id,
            "lead converted"
        );
        Ok(Some(saved))
    }

    /// Leads in `status`, highest score first.
    pub async fn leads_by_status(&self, status: LeadStatus) -> Result<Vec<Lead>> {
        self.metrics.leads_by_status_ranked(status).await
    }

    pub async fn leads_by_source(&self, source: LeadSource) -> Result<Vec<Lead>> {
        self.find_all(filters::leads_from_source(source), None).await
    }

    pub async fn high_score_leads(&self, min_score: u32) -> Result<Vec<Lead>> {
        self.metrics.high_score_leads(min_score).await
    }

    // ========================================================================
    // Opportunities
    // ========================================================================

    pub async fn create_opportunity(&self, draft: OpportunityDraft) -> Result<Opportunity> {
        draft.validate()?;
        if let Some(customer_id) = draft.customer_id {
            self.require_customer("customerId", customer_id).await?;
        }
        let opportunity = Opportunity::apply_create_defaults(draft, self.now());
        let saved = self.save(opportunity).await?;
        info!(id = %saved.id, stage = %saved.stage, amount = %saved.amount, "opportunity created");
        Ok(saved)
    }

    pub async fn update_opportunity(
        &self,
        id: EntityId,
        patch: OpportunityPatch,
    ) -> Result<Option<Opportunity>> {
        patch.validate()?;
        let Some(old) = self.get::<Opportunity>(id).await? else {
            return Ok(None);
        };
        let mut opportunity = old.apply_patch(patch);
        opportunity.apply_update_derivations(&old, self.now());
        let saved = self.save(opportunity).await?;
        info!(
            id = %saved.id,
            stage = %saved.stage,
            probability = saved.probability,
            "opportunity updated"
        );
        Ok(Some(saved))
    }

    /// Newest first.
    pub async fn opportunities_of_customer(&self, customer_id: EntityId) -> Result<Vec<Opportunity>> {
        self.find_all(
            filters::opportunities_of_customer(customer_id),
            Some(SortSpec::desc("createdAt")),
        )
        .await
    }

    /// Largest amount first.
    pub async fn opportunities_by_stage(&self, stage: OpportunityStage) -> Result<Vec<Opportunity>> {
        self.find_all(
            filters::opportunities_in_stage(stage),
            Some(SortSpec::desc("amount")),
        )
        .await
    }

    pub async fn overdue_opportunities(&self) -> Result<Vec<Opportunity>> {
        self.metrics.overdue_opportunities(self.clock.today()).await
    }

    // ========================================================================
    // Activities
    // ========================================================================

    pub async fn create_activity(&self, draft: ActivityDraft) -> Result<Activity> {
        draft.validate()?;
        let activity = Activity::apply_create_defaults(draft, self.now());
        let saved = self.save(activity).await?;
        info!(id = %saved.id, kind = %saved.activity_type, "activity created");
        Ok(saved)
    }

    pub async fn update_activity(&self, id: EntityId, patch: ActivityPatch) -> Result<Option<Activity>> {
        patch.validate()?;
        let Some(old) = self.get::<Activity>(id).await? else {
            return Ok(None);
        };
        let mut activity = old.apply_patch(patch);
        activity.apply_update_derivations(&old, self.now());
        let saved = self.save(activity).await?;
        info!(id = %saved.id, status = %saved.status, "activity updated");
        Ok(Some(saved))
    }

    /// Marks the activity completed, replacing the outcome when one is
    /// given. `completedAt` keeps its first value.
    pub async fn complete_activity(&self, id: EntityId, outcome: Option<String>) -> Result<Option<Activity>> {
        let patch = ActivityPatch {
            status: Some(ActivityStatus::Completed),
            outcome,
            ..ActivityPatch::default()
        };
        self.update_activity(id, patch).await
    }

    /// Activities following one weak link. Customer and contact timelines
    /// are newest start first.
    pub async fn activities_linked(&self, link: ActivityLink) -> Result<Vec<Activity>> {
        let sort = match link {
            ActivityLink::Customer(_) | ActivityLink::Contact(_) => Some(SortSpec::desc("startDate")),
            ActivityLink::Opportunity(_) | ActivityLink::Lead(_) => None,
        };
        self.find_all(filters::activities_linked_to(link), sort).await
    }

    pub async fn activities_by_status(&self, status: ActivityStatus) -> Result<Vec<Activity>> {
        self.find_all(filters::activities_with_status(status), None).await
    }

    pub async fn activities_by_type(&self, activity_type: ActivityType) -> Result<Vec<Activity>> {
        self.find_all(filters::activities_of_type(activity_type), None)
            .await
    }

    pub async fn overdue_activities(&self) -> Result<Vec<Activity>> {
        self.metrics.overdue_activities(self.now()).await
    }

    pub async fn upcoming_activities(&self, horizon: Duration) -> Result<Vec<Activity>> {
        self.metrics.upcoming_activities(self.now(), horizon).await
    }
}

/// The customer and primary contact a converting lead opens, validated but
/// not yet stored.
fn customer_opened_for(lead: &Lead, now: DateTime<Utc>) -> Result<(Customer, Contact)> {
    let company_name = lead
        .company
        .clone()
        .filter(|company| !company.trim().is_empty())
        .unwrap_or_else(|| full_name(&lead.first_name, &lead.last_name));
    let customer = CustomerDraft {
        email: lead.email.clone(),
        phone: lead.phone.clone(),
        status: Some(CustomerStatus::Active),
        ..CustomerDraft::new(company_name)
    };
    customer.validate()?;

    let contact = ContactDraft {
        job_title: lead.job_title.clone(),
        email: lead.email.clone(),
        phone: lead.phone.clone(),
        is_primary: Some(true),
        ..ContactDraft::new(lead.first_name.clone(), lead.last_name.clone())
    };
    contact.validate()?;
    Ok((
        Customer::apply_create_defaults(customer, now),
        Contact::apply_create_defaults(contact, now),
    ))
}
