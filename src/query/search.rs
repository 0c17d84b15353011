//! Free-text search over the fixed field set of each entity.

use std::collections::HashMap;

use super::pattern::SearchTerm;
use crate::core::{EntityId, Result};
use crate::domain::{Activity, Contact, Customer, Entity, Lead, Opportunity};
use crate::storage::{EntityStore, Filter, Page, PageRequest};

/// Joined data a search predicate may need beyond the row itself.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    customer_names: HashMap<EntityId, String>,
}

impl SearchContext {
    pub fn with_customers(customers: &[Customer]) -> Self {
        Self {
            customer_names: customers
                .iter()
                .map(|c| (c.id, c.company_name.clone()))
                .collect(),
        }
    }

    /// `None` for unlinked rows and for dangling ids.
    pub fn customer_name(&self, id: Option<EntityId>) -> Option<&str> {
        id.and_then(|id| self.customer_names.get(&id))
            .map(String::as_str)
    }
}

/// An entity with a searchable field set.
pub trait Searchable: Entity {
    /// Sort field used by listings that do not name one.
    const DEFAULT_SORT: &'static str;

    /// Whether `search_fields` reads the parent customer's name.
    const JOINS_CUSTOMER: bool = false;

    fn search_fields<'a>(&'a self, ctx: &'a SearchContext) -> Vec<Option<&'a str>>;
}

impl Searchable for Customer {
    const DEFAULT_SORT: &'static str = "companyName";

    fn search_fields<'a>(&'a self, _ctx: &'a SearchContext) -> Vec<Option<&'a str>> {
        vec![
            Some(self.company_name.as_str()),
            self.industry.as_deref(),
            self.email.as_deref(),
            self.city.as_deref(),
        ]
    }
}

impl Searchable for Contact {
    const DEFAULT_SORT: &'static str = "firstName";
    const JOINS_CUSTOMER: bool = true;

    fn search_fields<'a>(&'a self, ctx: &'a SearchContext) -> Vec<Option<&'a str>> {
        vec![
            Some(self.first_name.as_str()),
            Some(self.last_name.as_str()),
            self.email.as_deref(),
            self.job_title.as_deref(),
            ctx.customer_name(self.customer_id),
        ]
    }
}

impl Searchable for Lead {
    const DEFAULT_SORT: &'static str = "createdAt";

    fn search_fields<'a>(&'a self, _ctx: &'a SearchContext) -> Vec<Option<&'a str>> {
        vec![
            Some(self.first_name.as_str()),
            Some(self.last_name.as_str()),
            self.email.as_deref(),
            self.company.as_deref(),
            self.job_title.as_deref(),
        ]
    }
}

impl Searchable for Opportunity {
    const DEFAULT_SORT: &'static str = "createdAt";
    const JOINS_CUSTOMER: bool = true;

    fn search_fields<'a>(&'a self, ctx: &'a SearchContext) -> Vec<Option<&'a str>> {
        vec![
            Some(self.name.as_str()),
            self.description.as_deref(),
            ctx.customer_name(Some(self.customer_id)),
        ]
    }
}

impl Searchable for Activity {
    const DEFAULT_SORT: &'static str = "startDate";

    fn search_fields<'a>(&'a self, _ctx: &'a SearchContext) -> Vec<Option<&'a str>> {
        vec![Some(self.subject.as_str()), self.description.as_deref()]
    }
}

/// Predicate for `term` over `E`'s field set. Blank terms match everything.
pub fn search_filter<E: Searchable>(term: Option<&str>, ctx: SearchContext) -> Filter<E> {
    match SearchTerm::parse(term) {
        Some(term) => Filter::new(move |entity: &E| term.matches_any(entity.search_fields(&ctx))),
        None => Filter::all(),
    }
}

/// Runs a search against the store, loading customer names first when the
/// entity's field set joins them.
pub async fn search<E, S>(store: &S, term: Option<&str>, page: &PageRequest) -> Result<Page<E>>
where
    E: Searchable,
    S: EntityStore<E> + EntityStore<Customer> + ?Sized,
{
    let needs_join = E::JOINS_CUSTOMER && SearchTerm::parse(term).is_some();
    let ctx = if needs_join {
        let customers = EntityStore::<Customer>::scan(store).await?;
        SearchContext::with_customers(&customers)
    } else {
        SearchContext::default()
    };
    EntityStore::<E>::query(store, &search_filter(term, ctx), page).await
}

/// Contacts of one customer whose first name, last name or email contains
/// the term. A blank term returns every contact of the customer.
pub fn customer_contacts_filter(customer_id: EntityId, term: Option<&str>) -> Filter<Contact> {
    let term = SearchTerm::parse(term);
    Filter::new(move |contact: &Contact| {
        contact.belongs_to(customer_id)
            && term.as_ref().is_none_or(|term| {
                term.matches_any([
                    Some(contact.first_name.as_str()),
                    Some(contact.last_name.as_str()),
                    contact.email.as_deref(),
                ])
            })
    })
}
