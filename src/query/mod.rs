//! Listing, filtering and free-text search on top of the entity store.

pub mod filters;
pub mod pattern;
pub mod request;
pub mod search;

pub use filters::ActivityLink;
pub use pattern::SearchTerm;
pub use request::ListQuery;
pub use search::{SearchContext, Searchable, customer_contacts_filter, search, search_filter};
