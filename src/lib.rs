// ============================================================================
// CRM Core Library
// ============================================================================
//
// Sales funnel domain model over an async entity store:
//
// - `domain`     entities, drafts, patches and closed value sets
// - `lifecycle`  derived fields stamped on create and update
// - `validation` field checks run before any write
// - `storage`    the store contract plus the in-memory implementation
// - `query`      filters, free-text search and paging
// - `metrics`    pipeline, conversion and activity aggregates
// - `facade`     the `Crm` service tying the above together
// - `web`        axum routes over the façade

pub mod config;
pub mod core;
pub mod domain;
pub mod facade;
pub mod lifecycle;
pub mod metrics;
pub mod prelude;
pub mod query;
pub mod storage;
pub mod validation;
pub mod web;

// Re-export main types for convenience
pub use core::{Clock, CrmError, EntityId, EntityKind, FieldError, FixedClock, Result, SystemClock};
pub use facade::Crm;
pub use metrics::MetricsEngine;
pub use storage::{ConversionStore, CrmStore, DurabilityMode, EntityStore, InMemoryStore};
