use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::aggregate::{self, StageTotals, StatusFilter, count_by_status};
use super::stats::{
    ActivityStats, ContactStats, CustomerStats, DashboardStats, LeadStats, OpportunityStats,
};
use crate::core::{EntityKind, Result};
use crate::domain::{
    Activity, ActivityType, Contact, Customer, Lead, LeadSource, LeadStatus, Opportunity,
    OpportunityStage,
};
use crate::storage::{CrmStore, EntityStore};

/// Computes aggregates from fresh store scans. Nothing is cached; every
/// call reads the tables it needs.
#[derive(Clone)]
pub struct MetricsEngine {
    store: Arc<dyn CrmStore>,
}

impl MetricsEngine {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    async fn customers(&self) -> Result<Vec<Customer>> {
        EntityStore::<Customer>::scan(&*self.store).await
    }

    async fn contacts(&self) -> Result<Vec<Contact>> {
        EntityStore::<Contact>::scan(&*self.store).await
    }

    async fn leads(&self) -> Result<Vec<Lead>> {
        EntityStore::<Lead>::scan(&*self.store).await
    }

    async fn opportunities(&self) -> Result<Vec<Opportunity>> {
        EntityStore::<Opportunity>::scan(&*self.store).await
    }

    async fn activities(&self) -> Result<Vec<Activity>> {
        EntityStore::<Activity>::scan(&*self.store).await
    }

    pub async fn count_by_status(&self, status: impl Into<StatusFilter>) -> Result<u64> {
        let count = match status.into() {
            StatusFilter::Customer(s) => count_by_status(&self.customers().await?, s),
            StatusFilter::Contact(s) => count_by_status(&self.contacts().await?, s),
            StatusFilter::Lead(s) => count_by_status(&self.leads().await?, s),
            StatusFilter::Opportunity(s) => count_by_status(&self.opportunities().await?, s),
            StatusFilter::Activity(s) => count_by_status(&self.activities().await?, s),
        };
        Ok(count)
    }

    pub async fn total_count(&self, kind: EntityKind) -> Result<u64> {
        let count = match kind {
            EntityKind::Customer => self.customers().await?.len(),
            EntityKind::Contact => self.contacts().await?.len(),
            EntityKind::Lead => self.leads().await?.len(),
            EntityKind::Opportunity => self.opportunities().await?.len(),
            EntityKind::Activity => self.activities().await?.len(),
        };
        Ok(count as u64)
    }

    pub async fn weighted_pipeline_value(&self) -> Result<Decimal> {
        Ok(aggregate::weighted_pipeline_value(&self.opportunities().await?))
    }

    pub async fn won_revenue(&self) -> Result<Decimal> {
        Ok(aggregate::won_revenue(&self.opportunities().await?))
    }

    pub async fn average_won_deal_size(&self) -> Result<Decimal> {
        Ok(aggregate::average_won_deal_size(&self.opportunities().await?))
    }

    pub async fn stage_breakdown(&self) -> Result<BTreeMap<OpportunityStage, StageTotals>> {
        Ok(aggregate::stage_breakdown(&self.opportunities().await?))
    }

    pub async fn win_rate(&self) -> Result<f64> {
        Ok(aggregate::win_rate(&self.opportunities().await?))
    }

    pub async fn overdue_opportunities(&self, today: NaiveDate) -> Result<Vec<Opportunity>> {
        Ok(aggregate::overdue_opportunities(&self.opportunities().await?, today))
    }

    pub async fn lead_source_breakdown(&self) -> Result<BTreeMap<LeadSource, u64>> {
        Ok(aggregate::lead_source_breakdown(&self.leads().await?))
    }

    pub async fn average_lead_score(&self, status: LeadStatus) -> Result<f64> {
        Ok(aggregate::average_lead_score(&self.leads().await?, status))
    }

    pub async fn lead_conversion_rate(&self) -> Result<f64> {
        Ok(aggregate::lead_conversion_rate(&self.leads().await?))
    }

    pub async fn high_score_leads(&self, min_score: u32) -> Result<Vec<Lead>> {
        Ok(aggregate::high_score_leads(&self.leads().await?, min_score))
    }

    pub async fn leads_by_status_ranked(&self, status: LeadStatus) -> Result<Vec<Lead>> {
        Ok(aggregate::leads_by_status_ranked(&self.leads().await?, status))
    }

    pub async fn overdue_activities(&self, now: DateTime<Utc>) -> Result<Vec<Activity>> {
        Ok(aggregate::overdue_activities(&self.activities().await?, now))
    }

    pub async fn upcoming_activities(&self, now: DateTime<Utc>, horizon: Duration) -> Result<Vec<Activity>> {
        Ok(aggregate::upcoming_activities(&self.activities().await?, now, horizon))
    }

    pub async fn activity_type_breakdown(&self) -> Result<BTreeMap<ActivityType, u64>> {
        Ok(aggregate::activity_type_breakdown(&self.activities().await?))
    }

    pub async fn recent_activities(&self, limit: usize) -> Result<Vec<Activity>> {
        Ok(aggregate::recent_activities(&self.activities().await?, limit))
    }

    pub async fn distinct_industries(&self) -> Result<Vec<String>> {
        Ok(aggregate::distinct_industries(&self.customers().await?))
    }

    pub async fn customer_stats(&self) -> Result<CustomerStats> {
        Ok(CustomerStats::compute(&self.customers().await?))
    }

    pub async fn contact_stats(&self) -> Result<ContactStats> {
        Ok(ContactStats::compute(&self.contacts().await?))
    }

    pub async fn lead_stats(&self) -> Result<LeadStats> {
        Ok(LeadStats::compute(&self.leads().await?))
    }

    pub async fn opportunity_stats(&self) -> Result<OpportunityStats> {
        Ok(OpportunityStats::compute(&self.opportunities().await?))
    }

    pub async fn activity_stats(&self, now: DateTime<Utc>) -> Result<ActivityStats> {
        Ok(ActivityStats::compute(&self.activities().await?, now))
    }

    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let customers = self.customers().await?;
        let leads = self.leads().await?;
        let opportunities = self.opportunities().await?;
        let activities = self.activities().await?;
        Ok(DashboardStats::compute(
            &customers,
            &leads,
            &opportunities,
            &activities,
            now,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use crate::domain::{CustomerDraft, CustomerStatus, LeadDraft, OpportunityDraft};
    use crate::lifecycle::Lifecycle;
    use crate::storage::InMemoryStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn reads_the_current_store_contents() {
        let store = Arc::new(InMemoryStore::new());
        let engine = MetricsEngine::new(store.clone());
        let now = Utc::now();

        assert_eq!(engine.total_count(EntityKind::Customer).await.unwrap(), 0);

        let acme = store
            .save(Customer::apply_create_defaults(CustomerDraft::new("Acme"), now))
            .await
            .unwrap();
        let mut won = OpportunityDraft::new("Deal", dec!(750), acme.id);
        won.stage = Some(OpportunityStage::ClosedWon);
        store
            .save(Opportunity::apply_create_defaults(won, now))
            .await
            .unwrap();
        let mut lead = LeadDraft::new("Ada", "Lovelace");
        lead.source = Some(LeadSource::Website);
        store
            .save(Lead::apply_create_defaults(lead, now))
            .await
            .unwrap();

        assert_eq!(engine.total_count(EntityKind::Customer).await.unwrap(), 1);
        assert_eq!(engine.count_by_status(CustomerStatus::Active).await.unwrap(), 1);
        assert_eq!(engine.count_by_status(LeadStatus::New).await.unwrap(), 1);
        assert_eq!(engine.won_revenue().await.unwrap(), dec!(750));
        assert_eq!(
            engine.lead_source_breakdown().await.unwrap()[&LeadSource::Website],
            1
        );
        assert_eq!(acme.id, EntityId(1));
    }
}
