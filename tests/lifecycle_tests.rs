mod common;

use chrono::Duration;
use common::{contact, customer, harness, lead, opportunity, t0};
use crm_core::prelude::*;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_update_keeps_created_at_and_moves_updated_at() {
    let h = harness();
    let acme = customer(&h.crm, "Acme").await;

    h.clock.advance(Duration::hours(3));
    let patch = CustomerPatch {
        industry: Some("Manufacturing".to_string()),
        ..CustomerPatch::default()
    };
    let updated = h.crm.update_customer(acme.id, patch).await.unwrap().unwrap();

    assert_eq!(updated.created_at, t0());
    assert_eq!(updated.updated_at, t0() + Duration::hours(3));
    assert_eq!(updated.industry.as_deref(), Some("Manufacturing"));
    assert_eq!(updated.company_name, "Acme");
}

#[tokio::test]
async fn test_update_missing_entity_returns_none() {
    let h = harness();
    let result = h
        .crm
        .update_customer(EntityId(42), CustomerPatch::default())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_stage_change_resets_probability() {
    let h = harness();
    let acme = customer(&h.crm, "Acme").await;
    let deal = opportunity(&h.crm, acme.id, "Rollout", dec!(1000), OpportunityStage::Prospecting).await;
    assert_eq!(deal.probability, 10);

    let patch = OpportunityPatch {
        stage: Some(OpportunityStage::Proposal),
        probability: Some(33),
        ..OpportunityPatch::default()
    };
    let moved = h.crm.update_opportunity(deal.id, patch).await.unwrap().unwrap();
    assert_eq!(moved.probability, 75);

    let patch = OpportunityPatch {
        probability: Some(60),
        ..OpportunityPatch::default()
    };
    let tuned = h.crm.update_opportunity(deal.id, patch).await.unwrap().unwrap();
    assert_eq!(tuned.stage, OpportunityStage::Proposal);
    assert_eq!(tuned.probability, 60);
}

#[tokio::test]
async fn test_closing_stamps_actual_close_date_once() {
    let h = harness();
    let acme = customer(&h.crm, "Acme").await;
    let deal = opportunity(&h.crm, acme.id, "Rollout", dec!(1000), OpportunityStage::Negotiation).await;
    assert!(deal.actual_close_date.is_none());

    h.clock.advance(Duration::days(2));
    let won = h
        .crm
        .update_opportunity(
            deal.id,
            OpportunityPatch {
                stage: Some(OpportunityStage::ClosedWon),
                ..OpportunityPatch::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    let closed_on = (t0() + Duration::days(2)).date_naive();
    assert_eq!(won.actual_close_date, Some(closed_on));
    assert_eq!(won.probability, 100);

    h.clock.advance(Duration::days(5));
    let edited = h
        .crm
        .update_opportunity(
            deal.id,
            OpportunityPatch {
                notes: Some("signed".to_string()),
                ..OpportunityPatch::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edited.actual_close_date, Some(closed_on));
}

#[tokio::test]
async fn test_new_primary_contact_demotes_previous() {
    let h = harness();
    let acme = customer(&h.crm, "Acme").await;
    let first = contact(&h.crm, acme.id, "Ada", true).await;
    let second = contact(&h.crm, acme.id, "Grace", true).await;

    let first = h.crm.get::<Contact>(first.id).await.unwrap().unwrap();
    assert!(!first.is_primary);
    assert!(second.is_primary);

    let primary = h.crm.primary_contact(acme.id).await.unwrap().unwrap();
    assert_eq!(primary.id, second.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_primary_contacts_leave_one_primary() {
    let h = harness();
    let acme = customer(&h.crm, "Acme").await;

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let crm = h.crm.clone();
            tokio::spawn(async move {
                let name = format!("Rep{i}");
                contact(&crm, acme.id, &name, true).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let contacts = h.crm.contacts_of_customer(acme.id).await.unwrap();
    assert_eq!(contacts.len(), 16);
    assert_eq!(contacts.iter().filter(|c| c.is_primary).count(), 1);
    assert!(h.crm.primary_contact(acme.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_primary_contacts_are_scoped_per_customer() {
    let h = harness();
    let acme = customer(&h.crm, "Acme").await;
    let globex = customer(&h.crm, "Globex").await;
    let ada = contact(&h.crm, acme.id, "Ada", true).await;
    contact(&h.crm, globex.id, "Grace", true).await;

    let ada = h.crm.get::<Contact>(ada.id).await.unwrap().unwrap();
    assert!(ada.is_primary);
}

#[tokio::test]
async fn test_lead_conversion_stamps_once() {
    let h = harness();
    let prospect = lead(&h.crm, "Linus", LeadStatus::Qualified, 80).await;
    assert!(prospect.converted_at.is_none());

    h.clock.advance(Duration::hours(1));
    let converted = h
        .crm
        .convert_lead(prospect.id, ConvertLead::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(converted.status, LeadStatus::Converted);
    assert_eq!(converted.converted_at, Some(t0() + Duration::hours(1)));
    assert!(converted.converted_customer_id.is_none());

    h.clock.advance(Duration::hours(1));
    let again = h
        .crm
        .convert_lead(prospect.id, ConvertLead::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.converted_at, Some(t0() + Duration::hours(1)));
}

#[tokio::test]
async fn test_convert_lead_can_open_customer() {
    let h = harness();
    let draft = LeadDraft {
        company: Some("Initech".to_string()),
        email: Some("peter@initech.test".to_string()),
        ..LeadDraft::new("Peter", "Gibbons")
    };
    let prospect = h.crm.create_lead(draft).await.unwrap();

    let converted = h
        .crm
        .convert_lead(prospect.id, ConvertLead { create_customer: true })
        .await
        .unwrap()
        .unwrap();

    let customer_id = converted.converted_customer_id.unwrap();
    let opened = h.crm.get::<Customer>(customer_id).await.unwrap().unwrap();
    assert_eq!(opened.company_name, "Initech");

    let primary = h.crm.primary_contact(customer_id).await.unwrap().unwrap();
    assert_eq!(primary.first_name, "Peter");
    assert_eq!(primary.email.as_deref(), Some("peter@initech.test"));
}

#[tokio::test]
async fn test_completing_activity_stamps_completed_at_once() {
    let h = harness();
    let call = h
        .crm
        .create_activity(ActivityDraft::new("Intro call", ActivityType::Call))
        .await
        .unwrap();
    assert_eq!(call.status, ActivityStatus::Planned);
    assert!(call.completed_at.is_none());

    h.clock.advance(Duration::minutes(30));
    let done = h
        .crm
        .complete_activity(call.id, Some("went well".to_string()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status, ActivityStatus::Completed);
    assert_eq!(done.completed_at, Some(t0() + Duration::minutes(30)));
    assert_eq!(done.outcome.as_deref(), Some("went well"));

    h.clock.advance(Duration::minutes(30));
    let repeated = h.crm.complete_activity(call.id, None).await.unwrap().unwrap();
    assert_eq!(repeated.completed_at, Some(t0() + Duration::minutes(30)));
    assert_eq!(repeated.outcome.as_deref(), Some("went well"));
}

#[tokio::test]
async fn test_validation_rejects_before_any_write() {
    let h = harness();
    let err = h
        .crm
        .create_customer(CustomerDraft::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));
    assert!(err.field_errors().iter().any(|e| e.field == "companyName"));

    let err = h
        .crm
        .create_opportunity(OpportunityDraft::new("Ghost", dec!(10), EntityId(99)))
        .await
        .unwrap_err();
    assert!(err.field_errors().iter().any(|e| e.field == "customerId"));

    let page = h.crm.list::<Customer>(&ListQuery::default()).await.unwrap();
    assert_eq!(page.total, 0);
}
