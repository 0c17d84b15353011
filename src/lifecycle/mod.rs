//! Lifecycle rules: create defaults and update derivations per entity.
//!
//! Rules run after validation and before the single store write. They never
//! reject input and every stamp is set only while the target field is empty,
//! so re-applying a rule to an already-derived value changes nothing but
//! `updated_at`.

pub mod primary_contact;
mod rules;

use chrono::{DateTime, Utc};

pub use primary_contact::demote_competing_primaries;

/// Field derivations attached to an entity type.
pub trait Lifecycle: Sized {
    type Draft;

    /// Builds a new, not yet persisted entity from validated input, stamping
    /// `created_at = updated_at = now` and filling documented defaults.
    fn apply_create_defaults(draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Derives fields of `self` (the patched value) from the stored `old`
    /// value. Keeps `id` and `created_at` from `old` and refreshes
    /// `updated_at`.
    fn apply_update_derivations(&mut self, old: &Self, now: DateTime<Utc>);
}
