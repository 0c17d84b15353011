#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use crm_core::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
}

pub struct Harness {
    pub crm: Crm,
    pub clock: Arc<FixedClock>,
    pub store: Arc<InMemoryStore>,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::new(t0()));
    let crm = Crm::new(store.clone(), clock.clone());
    Harness { crm, clock, store }
}

pub async fn customer(crm: &Crm, name: &str) -> Customer {
    crm.create_customer(CustomerDraft::new(name)).await.unwrap()
}

pub async fn contact(crm: &Crm, customer_id: EntityId, first: &str, primary: bool) -> Contact {
    let draft = ContactDraft {
        customer_id: Some(customer_id),
        is_primary: Some(primary),
        email: Some(format!("{}@example.com", first.to_lowercase())),
        ..ContactDraft::new(first, "Tester")
    };
    crm.create_contact(draft).await.unwrap()
}

pub async fn opportunity(
    crm: &Crm,
    customer_id: EntityId,
    name: &str,
    amount: Decimal,
    stage: OpportunityStage,
) -> Opportunity {
    let draft = OpportunityDraft {
        stage: Some(stage),
        ..OpportunityDraft::new(name, amount, customer_id)
    };
    crm.create_opportunity(draft).await.unwrap()
}

pub async fn lead(crm: &Crm, first: &str, status: LeadStatus, score: u32) -> Lead {
    let draft = LeadDraft {
        status: Some(status),
        score: Some(score),
        ..LeadDraft::new(first, "Prospect")
    };
    crm.create_lead(draft).await.unwrap()
}
