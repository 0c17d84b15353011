mod common;

use common::{contact, customer, harness, opportunity};
use crm_core::prelude::*;
use rust_decimal_macros::dec;

fn query(search: Option<&str>, sort_by: Option<&str>, sort_dir: Option<&str>) -> ListQuery {
    ListQuery {
        search: search.map(str::to_string),
        sort_by: sort_by.map(str::to_string),
        sort_dir: sort_dir.map(str::to_string),
        ..ListQuery::default()
    }
}

#[tokio::test]
async fn test_customer_search_is_case_insensitive_substring() {
    let h = harness();
    customer(&h.crm, "Acme Rockets").await;
    customer(&h.crm, "Globex").await;
    let draft = CustomerDraft {
        industry: Some("ACME supplies".to_string()),
        ..CustomerDraft::new("Initech")
    };
    h.crm.create_customer(draft).await.unwrap();

    let page = h
        .crm
        .list::<Customer>(&query(Some("acme"), None, None))
        .await
        .unwrap();
    let names: Vec<&str> = page.items.iter().map(|c| c.company_name.as_str()).collect();
    assert_eq!(names, vec!["Acme Rockets", "Initech"]);
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_blank_search_lists_everything() {
    let h = harness();
    customer(&h.crm, "Beta").await;
    customer(&h.crm, "Alpha").await;

    let page = h
        .crm
        .list::<Customer>(&query(Some("   "), None, None))
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].company_name, "Alpha");
}

#[tokio::test]
async fn test_contact_search_reaches_customer_name() {
    let h = harness();
    let acme = customer(&h.crm, "Acme").await;
    let globex = customer(&h.crm, "Globex").await;
    contact(&h.crm, acme.id, "Ada", false).await;
    contact(&h.crm, globex.id, "Grace", false).await;

    let page = h
        .crm
        .list::<Contact>(&query(Some("globex"), None, None))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].first_name, "Grace");
}

#[tokio::test]
async fn test_opportunity_search_and_sort_by_amount() {
    let h = harness();
    let acme = customer(&h.crm, "Acme").await;
    opportunity(&h.crm, acme.id, "Small", dec!(100), OpportunityStage::Prospecting).await;
    opportunity(&h.crm, acme.id, "Large", dec!(9000), OpportunityStage::Proposal).await;
    opportunity(&h.crm, acme.id, "Medium", dec!(500), OpportunityStage::Qualification).await;

    let page = h
        .crm
        .list::<Opportunity>(&query(Some("ACME"), Some("amount"), Some("desc")))
        .await
        .unwrap();
    let names: Vec<&str> = page.items.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Large", "Medium", "Small"]);
}

#[tokio::test]
async fn test_paging_reports_totals() {
    let h = harness();
    for name in ["A", "B", "C", "D", "E"] {
        customer(&h.crm, name).await;
    }

    let request = ListQuery {
        page: Some(1),
        size: Some(2),
        ..ListQuery::default()
    };
    let page = h.crm.list::<Customer>(&request).await.unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);
    let names: Vec<&str> = page.items.iter().map(|c| c.company_name.as_str()).collect();
    assert_eq!(names, vec!["C", "D"]);

    let past_end = ListQuery {
        page: Some(9),
        size: Some(2),
        ..ListQuery::default()
    };
    let page = h.crm.list::<Customer>(&past_end).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn test_page_size_is_clamped() {
    let h = harness();
    let crm = h.crm.clone().with_page_limits(2, 3);
    for name in ["A", "B", "C", "D"] {
        customer(&crm, name).await;
    }

    let page = crm.list::<Customer>(&ListQuery::default()).await.unwrap();
    assert_eq!(page.items.len(), 2);

    let oversized = ListQuery {
        size: Some(50),
        ..ListQuery::default()
    };
    let page = crm.list::<Customer>(&oversized).await.unwrap();
    assert_eq!(page.items.len(), 3);
}

#[tokio::test]
async fn test_search_customer_contacts_stays_within_customer() {
    let h = harness();
    let acme = customer(&h.crm, "Acme").await;
    let globex = customer(&h.crm, "Globex").await;
    contact(&h.crm, acme.id, "Ada", false).await;
    contact(&h.crm, acme.id, "Adam", false).await;
    contact(&h.crm, globex.id, "Adele", false).await;

    let found = h.crm.search_customer_contacts(acme.id, "AD").await.unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|c| c.customer_id == Some(acme.id)));

    let all = h.crm.search_customer_contacts(acme.id, "").await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_activities_by_link_newest_first() {
    let h = harness();
    let acme = customer(&h.crm, "Acme").await;
    let now = h.crm.now();
    for (subject, offset) in [("old", -48), ("new", 2), ("mid", -1)] {
        let draft = ActivityDraft {
            customer_id: Some(acme.id),
            start_date: Some(now + chrono::Duration::hours(offset)),
            ..ActivityDraft::new(subject, ActivityType::Meeting)
        };
        h.crm.create_activity(draft).await.unwrap();
    }
    h.crm
        .create_activity(ActivityDraft::new("unlinked", ActivityType::Note))
        .await
        .unwrap();

    let timeline = h
        .crm
        .activities_linked(ActivityLink::Customer(acme.id))
        .await
        .unwrap();
    let subjects: Vec<&str> = timeline.iter().map(|a| a.subject.as_str()).collect();
    assert_eq!(subjects, vec!["new", "mid", "old"]);
}
