pub mod engine;
pub mod memory;
pub mod persistence;
pub mod table;

pub use engine::{
    ConversionStore, CrmStore, EntityStore, Filter, Page, PageRequest, Reconcile, SortDirection,
    SortSpec, select_page,
};
pub use memory::{InMemoryStore, StoredEntity};
pub use persistence::{DurabilityMode, PersistenceManager, StoreSnapshot};
pub use table::Table;
