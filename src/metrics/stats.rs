//! Stats bundles served by the listing and dashboard endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::aggregate::{
    self, StageTotals, average_lead_score, average_won_deal_size, count_by_status,
    lead_conversion_rate, weighted_pipeline_value, win_rate, won_revenue,
};
use crate::domain::{
    Activity, ActivityStatus, Contact, ContactStatus, Customer, CustomerStatus, Lead, LeadStatus,
    Opportunity, OpportunityStage,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total_customers: u64,
    pub active_customers: u64,
    pub prospect_customers: u64,
    pub inactive_customers: u64,
}

impl CustomerStats {
    pub fn compute(customers: &[Customer]) -> Self {
        Self {
            total_customers: customers.len() as u64,
            active_customers: count_by_status(customers, CustomerStatus::Active),
            prospect_customers: count_by_status(customers, CustomerStatus::Prospect),
            inactive_customers: count_by_status(customers, CustomerStatus::Inactive),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactStats {
    pub total_contacts: u64,
    pub active_contacts: u64,
    pub inactive_contacts: u64,
    pub do_not_contact_contacts: u64,
}

impl ContactStats {
    pub fn compute(contacts: &[Contact]) -> Self {
        Self {
            total_contacts: contacts.len() as u64,
            active_contacts: count_by_status(contacts, ContactStatus::Active),
            inactive_contacts: count_by_status(contacts, ContactStatus::Inactive),
            do_not_contact_contacts: count_by_status(contacts, ContactStatus::DoNotContact),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total_leads: u64,
    pub new_leads: u64,
    pub contacted_leads: u64,
    pub qualified_leads: u64,
    pub converted_leads: u64,
    pub lost_leads: u64,
    /// Average score of qualified leads.
    pub average_score: f64,
    pub conversion_rate: f64,
}

impl LeadStats {
    pub fn compute(leads: &[Lead]) -> Self {
        Self {
            total_leads: leads.len() as u64,
            new_leads: count_by_status(leads, LeadStatus::New),
            contacted_leads: count_by_status(leads, LeadStatus::Contacted),
            qualified_leads: count_by_status(leads, LeadStatus::Qualified),
            converted_leads: count_by_status(leads, LeadStatus::Converted),
            lost_leads: count_by_status(leads, LeadStatus::Lost),
            average_score: average_lead_score(leads, LeadStatus::Qualified),
            conversion_rate: lead_conversion_rate(leads),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityStats {
    pub total_opportunities: u64,
    /// Won revenue.
    pub total_value: Decimal,
    pub pipeline_value: Decimal,
    pub average_deal_size: Decimal,
    pub win_rate: f64,
    pub stage_breakdown: BTreeMap<OpportunityStage, StageTotals>,
}

impl OpportunityStats {
    pub fn compute(opportunities: &[Opportunity]) -> Self {
        Self {
            total_opportunities: opportunities.len() as u64,
            total_value: won_revenue(opportunities),
            pipeline_value: weighted_pipeline_value(opportunities),
            average_deal_size: average_won_deal_size(opportunities),
            win_rate: win_rate(opportunities),
            stage_breakdown: aggregate::stage_breakdown(opportunities),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub total_activities: u64,
    pub planned_activities: u64,
    pub completed_activities: u64,
    pub overdue_activities: u64,
}

impl ActivityStats {
    pub fn compute(activities: &[Activity], now: DateTime<Utc>) -> Self {
        Self {
            total_activities: activities.len() as u64,
            planned_activities: count_by_status(activities, ActivityStatus::Planned),
            completed_activities: count_by_status(activities, ActivityStatus::Completed),
            overdue_activities: activities.iter().filter(|a| a.is_overdue(now)).count() as u64,
        }
    }
}

/// Headline numbers across the whole funnel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_customers: u64,
    pub active_customers: u64,
    pub prospect_customers: u64,
    pub total_leads: u64,
    pub new_leads: u64,
    pub qualified_leads: u64,
    pub converted_leads: u64,
    pub lead_conversion_rate: f64,
    pub total_opportunities: u64,
    pub total_revenue: Decimal,
    pub pipeline_value: Decimal,
    pub average_deal_size: Decimal,
    pub win_rate: f64,
    pub total_activities: u64,
    pub overdue_activities: u64,
}

impl DashboardStats {
    pub fn compute(
        customers: &[Customer],
        leads: &[Lead],
        opportunities: &[Opportunity],
        activities: &[Activity],
        now: DateTime<Utc>,
    ) -> Self {
        let customer = CustomerStats::compute(customers);
        let lead = LeadStats::compute(leads);
        let opportunity = OpportunityStats::compute(opportunities);
        let activity = ActivityStats::compute(activities, now);
        Self {
            total_customers: customer.total_customers,
            active_customers: customer.active_customers,
            prospect_customers: customer.prospect_customers,
            total_leads: lead.total_leads,
            new_leads: lead.new_leads,
            qualified_leads: lead.qualified_leads,
            converted_leads: lead.converted_leads,
            lead_conversion_rate: lead.conversion_rate,
            total_opportunities: opportunity.total_opportunities,
            total_revenue: opportunity.total_value,
            pipeline_value: opportunity.pipeline_value,
            average_deal_size: opportunity.average_deal_size,
            win_rate: opportunity.win_rate,
            total_activities: activity.total_activities,
            overdue_activities: activity.overdue_activities,
        }
    }
}
