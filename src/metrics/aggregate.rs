//! Pure aggregate functions over entity slices.
//!
//! Every function is total: empty input yields zero, an empty list or a
//! zero-filled breakdown.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::EntityKind;
use crate::domain::{
    Activity, ActivityStatus, ActivityType, Contact, ContactStatus, Customer, CustomerStatus, Lead,
    LeadSource, LeadStatus, Opportunity, OpportunityStage,
};

// ============================================================================
// Status counting
// ============================================================================

/// An entity whose rows carry one status-like enum.
pub trait HasStatus {
    type Status: Copy + PartialEq;

    fn status(&self) -> Self::Status;
}

impl HasStatus for Customer {
    type Status = CustomerStatus;

    fn status(&self) -> CustomerStatus {
        self.status
    }
}

impl HasStatus for Contact {
    type Status = ContactStatus;

    fn status(&self) -> ContactStatus {
        self.status
    }
}

impl HasStatus for Lead {
    type Status = LeadStatus;

    fn status(&self) -> LeadStatus {
        self.status
    }
}

impl HasStatus for Opportunity {
    type Status = OpportunityStage;

    fn status(&self) -> OpportunityStage {
        self.stage
    }
}

impl HasStatus for Activity {
    type Status = ActivityStatus;

    fn status(&self) -> ActivityStatus {
        self.status
    }
}

/// A status value of any entity type; the variant picks the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Customer(CustomerStatus),
    Contact(ContactStatus),
    Lead(LeadStatus),
    Opportunity(OpportunityStage),
    Activity(ActivityStatus),
}

impl StatusFilter {
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Customer(_) => EntityKind::Customer,
            Self::Contact(_) => EntityKind::Contact,
            Self::Lead(_) => EntityKind::Lead,
            Self::Opportunity(_) => EntityKind::Opportunity,
            Self::Activity(_) => EntityKind::Activity,
        }
    }
}

impl From<CustomerStatus> for StatusFilter {
    fn from(status: CustomerStatus) -> Self {
        Self::Customer(status)
    }
}

impl From<ContactStatus> for StatusFilter {
    fn from(status: ContactStatus) -> Self {
        Self::Contact(status)
    }
}

impl From<LeadStatus> for StatusFilter {
    fn from(status: LeadStatus) -> Self {
        Self::Lead(status)
    }
}

impl From<OpportunityStage> for StatusFilter {
    fn from(stage: OpportunityStage) -> Self {
        Self::Opportunity(stage)
    }
}

impl From<ActivityStatus> for StatusFilter {
    fn from(status: ActivityStatus) -> Self {
        Self::Activity(status)
    }
}

pub fn count_by_status<E: HasStatus>(rows: &[E], status: E::Status) -> u64 {
    rows.iter().filter(|row| row.status() == status).count() as u64
}

// ============================================================================
// Opportunity money
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTotals {
    pub count: u64,
    pub total_amount: Decimal,
}

/// Money totals clamp at `Decimal::MAX` instead of overflowing.
fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Sum of `amount × probability / 100` over open opportunities.
pub fn weighted_pipeline_value(opportunities: &[Opportunity]) -> Decimal {
    saturating_sum(
        opportunities
            .iter()
            .filter(|o| o.is_open())
            .map(Opportunity::weighted_amount),
    )
}

pub fn won_revenue(opportunities: &[Opportunity]) -> Decimal {
    saturating_sum(won(opportunities).map(|o| o.amount))
}

/// Mean won amount rounded to cents.
pub fn average_won_deal_size(opportunities: &[Opportunity]) -> Decimal {
    let (count, total) = won(opportunities).fold((0u64, Decimal::ZERO), |(count, total), o| {
        (count + 1, total.saturating_add(o.amount))
    });
    if count == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(count)).round_dp(2)
}

fn won(opportunities: &[Opportunity]) -> impl Iterator<Item = &Opportunity> {
    opportunities
        .iter()
        .filter(|o| o.stage == OpportunityStage::ClosedWon)
}

/// Every stage, zeros included.
pub fn stage_breakdown(opportunities: &[Opportunity]) -> BTreeMap<OpportunityStage, StageTotals> {
    let mut breakdown: BTreeMap<_, _> = OpportunityStage::ALL
        .iter()
        .map(|stage| (*stage, StageTotals::default()))
        .collect();
    for opportunity in opportunities {
        let totals = breakdown.entry(opportunity.stage).or_default();
        totals.count += 1;
        totals.total_amount = totals.total_amount.saturating_add(opportunity.amount);
    }
    breakdown
}

/// Won share of closed opportunities as a percentage.
pub fn win_rate(opportunities: &[Opportunity]) -> f64 {
    let won = count_by_status(opportunities, OpportunityStage::ClosedWon);
    let lost = count_by_status(opportunities, OpportunityStage::ClosedLost);
    percentage(won, won + lost)
}

/// Open opportunities whose expected close date is before `today`.
pub fn overdue_opportunities(opportunities: &[Opportunity], today: NaiveDate) -> Vec<Opportunity> {
    opportunities
        .iter()
        .filter(|o| o.is_open() && o.expected_close_date.is_some_and(|date| date < today))
        .cloned()
        .collect()
}

// ============================================================================
// Leads
// ============================================================================

/// Every lead source, zeros included. Leads without a source are skipped.
pub fn lead_source_breakdown(leads: &[Lead]) -> BTreeMap<LeadSource, u64> {
    let mut breakdown: BTreeMap<_, _> = LeadSource::ALL.iter().map(|s| (*s, 0u64)).collect();
    for source in leads.iter().filter_map(|lead| lead.source) {
        *breakdown.entry(source).or_default() += 1;
    }
    breakdown
}

/// Mean score of leads in `status`; 0 when there are none.
pub fn average_lead_score(leads: &[Lead], status: LeadStatus) -> f64 {
    let scores: Vec<u32> = leads
        .iter()
        .filter(|lead| lead.status == status)
        .map(|lead| lead.score)
        .collect();
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64
}

pub fn lead_conversion_rate(leads: &[Lead]) -> f64 {
    let converted = count_by_status(leads, LeadStatus::Converted);
    percentage(converted, leads.len() as u64)
}

/// Leads scoring at least `min_score`, best first.
pub fn high_score_leads(leads: &[Lead], min_score: u32) -> Vec<Lead> {
    ranked(leads.iter().filter(|lead| lead.score >= min_score))
}

/// Leads in `status`, best first.
pub fn leads_by_status_ranked(leads: &[Lead], status: LeadStatus) -> Vec<Lead> {
    ranked(leads.iter().filter(|lead| lead.status == status))
}

fn ranked<'a>(leads: impl Iterator<Item = &'a Lead>) -> Vec<Lead> {
    let mut leads: Vec<Lead> = leads.cloned().collect();
    leads.sort_by(|a, b| b.score.cmp(&a.score));
    leads
}

// ============================================================================
// Activities
// ============================================================================

pub fn is_overdue(activity: &Activity, now: DateTime<Utc>) -> bool {
    activity.is_overdue(now)
}

/// Overdue activities, oldest start first.
pub fn overdue_activities(activities: &[Activity], now: DateTime<Utc>) -> Vec<Activity> {
    by_start_date(activities.iter().filter(|a| is_overdue(a, now)))
}

/// Planned activities starting in `[now, now + horizon)`, soonest first.
pub fn upcoming_activities(activities: &[Activity], now: DateTime<Utc>, horizon: Duration) -> Vec<Activity> {
    let end = now + horizon;
    by_start_date(activities.iter().filter(|a| {
        a.status == ActivityStatus::Planned
            && a.start_date.is_some_and(|start| start >= now && start < end)
    }))
}

fn by_start_date<'a>(activities: impl Iterator<Item = &'a Activity>) -> Vec<Activity> {
    let mut activities: Vec<Activity> = activities.cloned().collect();
    activities.sort_by_key(|a| a.start_date);
    activities
}

/// Every activity type, zeros included.
pub fn activity_type_breakdown(activities: &[Activity]) -> BTreeMap<ActivityType, u64> {
    let mut breakdown: BTreeMap<_, _> = ActivityType::ALL.iter().map(|t| (*t, 0u64)).collect();
    for activity in activities {
        *breakdown.entry(activity.activity_type).or_default() += 1;
    }
    breakdown
}

/// The `limit` most recently created activities, newest first.
pub fn recent_activities(activities: &[Activity], limit: usize) -> Vec<Activity> {
    let mut recent = activities.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    recent.truncate(limit);
    recent
}

// ============================================================================
// Customers
// ============================================================================

/// Sorted, distinct, non-blank industries.
pub fn distinct_industries(customers: &[Customer]) -> Vec<String> {
    customers
        .iter()
        .filter_map(|c| c.industry.as_deref())
        .map(str::trim)
        .filter(|industry| !industry.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}
