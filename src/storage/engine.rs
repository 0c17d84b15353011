use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::{EntityId, Result};
use crate::domain::{Activity, Contact, Customer, Entity, Lead, Opportunity};

/// Storage contract for one entity type.
///
/// Every method is a single atomic operation; a failing backend reports
/// `CrmError::StorageUnavailable` and nothing is retried.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    async fn get(&self, id: EntityId) -> Result<Option<E>>;

    /// Persists `entity`. An unassigned id gets the next free id; an
    /// assigned id replaces the stored value.
    async fn save(&self, entity: E) -> Result<E>;

    /// Persists several values of the same type in one atomic write.
    async fn save_batch(&self, entities: Vec<E>) -> Result<Vec<E>>;

    /// Saves `entity`, then hands the saved value and the table's current
    /// rows to `reconcile` and saves the rows it returns, all in one
    /// atomic write that no other write can interleave with.
    async fn save_reconciled(&self, entity: E, reconcile: Reconcile<E>) -> Result<E>;

    /// Returns whether the id existed.
    async fn delete(&self, id: EntityId) -> Result<bool>;

    async fn query(&self, filter: &Filter<E>, page: &PageRequest) -> Result<Page<E>>;

    async fn exists(&self, id: EntityId) -> Result<bool>;

    /// Current contents in ascending id order.
    async fn scan(&self) -> Result<Vec<E>>;
}

/// Computes the extra rows written alongside a saved entity.
pub type Reconcile<E> = Box<dyn FnOnce(&E, &[E]) -> Vec<E> + Send>;

/// Writes spanning several tables.
#[async_trait]
pub trait ConversionStore: Send + Sync {
    /// Saves a new customer, its contact and the converting lead as one
    /// atomic write. The contact's `customer_id` and the lead's
    /// `converted_customer_id` are pointed at the new customer's id.
    async fn save_conversion(
        &self,
        customer: Customer,
        contact: Contact,
        lead: Lead,
    ) -> Result<(Customer, Contact, Lead)>;
}

/// The full set of tables the service needs.
pub trait CrmStore:
    EntityStore<Customer>
    + EntityStore<Contact>
    + EntityStore<Lead>
    + EntityStore<Opportunity>
    + EntityStore<Activity>
    + ConversionStore
{
}

impl<T> CrmStore for T where
    T: EntityStore<Customer>
        + EntityStore<Contact>
        + EntityStore<Lead>
        + EntityStore<Opportunity>
        + EntityStore<Activity>
        + ConversionStore
{
}

type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Row predicate handed to `EntityStore::query`.
pub struct Filter<E> {
    predicate: Option<Predicate<E>>,
}

impl<E> Filter<E> {
    pub fn all() -> Self {
        Self { predicate: None }
    }

    pub fn new(predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Some(Arc::new(predicate)),
        }
    }

    pub fn matches(&self, entity: &E) -> bool {
        self.predicate.as_ref().is_none_or(|predicate| predicate(entity))
    }

    pub fn is_unfiltered(&self) -> bool {
        self.predicate.is_none()
    }
}

impl<E> Clone for Filter<E> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
        }
    }
}

impl<E> Default for Filter<E> {
    fn default() -> Self {
        Self::all()
    }
}

impl<E> fmt::Debug for Filter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("filtered", &self.predicate.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = std::convert::Infallible;

    /// Anything other than `desc` (any case) sorts ascending.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Ok(Self::Asc)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Zero-indexed page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    pub sort: Option<SortSpec>,
}

impl PageRequest {
    pub const DEFAULT_SIZE: usize = 10;

    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size: size.max(1),
            sort: None,
        }
    }

    /// One page holding everything.
    pub fn unpaged() -> Self {
        Self::new(0, usize::MAX)
    }

    pub fn sorted(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// Filters, sorts and slices rows that arrive in ascending id order.
///
/// Unknown sort fields leave that order untouched; pages past the end are
/// empty.
pub fn select_page<E: Entity>(rows: Vec<E>, filter: &Filter<E>, request: &PageRequest) -> Page<E> {
    let mut rows: Vec<E> = rows.into_iter().filter(|row| filter.matches(row)).collect();

    if let Some(sort) = &request.sort {
        let known = rows
            .first()
            .is_some_and(|row| row.sort_key(&sort.field).is_some());
        if known {
            // stable sort keeps id order among equal keys
            rows.sort_by(|left, right| {
                let order = left.sort_key(&sort.field).cmp(&right.sort_key(&sort.field));
                match sort.direction {
                    SortDirection::Asc => order,
                    SortDirection::Desc => order.reverse(),
                }
            });
        }
    }

    let total = rows.len();
    let size = request.size.max(1);
    let start = request.page.saturating_mul(size);
    let items = if start >= total {
        Vec::new()
    } else {
        rows.into_iter().skip(start).take(size).collect()
    };

    Page {
        items,
        page: request.page,
        page_size: size,
        total,
        total_pages: total.div_ceil(size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CustomerDraft;
    use crate::lifecycle::Lifecycle;
    use chrono::{TimeZone, Utc};

    fn customers(names: &[&str]) -> Vec<Customer> {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut customer = Customer::apply_create_defaults(CustomerDraft::new(*name), now);
                customer.id = EntityId(idx as u64 + 1);
                customer
            })
            .collect()
    }

    fn names(page: &Page<Customer>) -> Vec<&str> {
        page.items.iter().map(|c| c.company_name.as_str()).collect()
    }

    #[test]
    fn sorts_by_known_field_in_both_directions() {
        let rows = customers(&["beta", "Acme", "gamma"]);

        let asc = select_page(
            rows.clone(),
            &Filter::all(),
            &PageRequest::default().sorted(SortSpec::asc("companyName")),
        );
        assert_eq!(names(&asc), vec!["Acme", "beta", "gamma"]);

        let desc = select_page(
            rows,
            &Filter::all(),
            &PageRequest::default().sorted(SortSpec::desc("companyName")),
        );
        assert_eq!(names(&desc), vec!["gamma", "beta", "Acme"]);
    }

    #[test]
    fn unknown_sort_field_keeps_id_order() {
        let rows = customers(&["beta", "Acme", "gamma"]);
        let page = select_page(
            rows,
            &Filter::all(),
            &PageRequest::default().sorted(SortSpec::asc("favouriteColour")),
        );
        assert_eq!(names(&page), vec!["beta", "Acme", "gamma"]);
    }

    #[test]
    fn out_of_range_page_is_empty_not_an_error() {
        let rows = customers(&["a", "b", "c"]);
        let page = select_page(rows, &Filter::all(), &PageRequest::new(5, 2));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn filter_applies_before_paging() {
        let rows = customers(&["a1", "b1", "a2", "a3"]);
        let filter = Filter::new(|c: &Customer| c.company_name.starts_with('a'));
        let page = select_page(rows, &filter, &PageRequest::new(1, 2));
        assert_eq!(names(&page), vec!["a3"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn sort_direction_defaults_to_ascending() {
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert_eq!("sideways".parse::<SortDirection>().unwrap(), SortDirection::Asc);
    }
}
