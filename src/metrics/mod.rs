//! Read-only funnel metrics.
//!
//! `aggregate` holds the pure functions, `stats` the bundled views, and
//! `engine` feeds both from store scans.

pub mod aggregate;
pub mod engine;
pub mod stats;

pub use aggregate::{HasStatus, StageTotals, StatusFilter};
pub use engine::MetricsEngine;
pub use stats::{
    ActivityStats, ContactStats, CustomerStats, DashboardStats, LeadStats, OpportunityStats,
};
