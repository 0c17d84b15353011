//! One primary contact per customer.
//!
//! Saving a contact as primary demotes every other primary contact of the
//! same customer. The demoted values are written in the same store batch as
//! the promoted contact.

use chrono::{DateTime, Utc};

use crate::domain::Contact;

/// Returns the demoted copies of `siblings` that compete with `promoted`.
///
/// Empty when `promoted` is not primary or is not attached to a customer.
pub fn demote_competing_primaries(
    promoted: &Contact,
    siblings: &[Contact],
    now: DateTime<Utc>,
) -> Vec<Contact> {
    let Some(customer_id) = promoted.customer_id.filter(|_| promoted.is_primary) else {
        return Vec::new();
    };

    siblings
        .iter()
        .filter(|other| other.id != promoted.id && other.is_primary && other.belongs_to(customer_id))
        .map(|other| {
            let mut demoted = other.clone();
            demoted.is_primary = false;
            demoted.updated_at = now;
            demoted
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use crate::domain::ContactDraft;
    use crate::lifecycle::Lifecycle;
    use chrono::TimeZone;

    fn contact(id: u64, customer: Option<u64>, primary: bool) -> Contact {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut draft = ContactDraft::new(format!("First{id}"), "Last");
        draft.customer_id = customer.map(EntityId);
        draft.is_primary = Some(primary);
        let mut contact = Contact::apply_create_defaults(draft, now);
        contact.id = EntityId(id);
        contact
    }

    #[test]
    fn demotes_other_primaries_of_the_same_customer_only() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let promoted = contact(1, Some(10), true);
        let siblings = vec![
            promoted.clone(),
            contact(2, Some(10), true),
            contact(3, Some(10), false),
            contact(4, Some(20), true),
            contact(5, None, true),
        ];

        let demoted = demote_competing_primaries(&promoted, &siblings, now);

        assert_eq!(demoted.len(), 1);
        assert_eq!(demoted[0].id, EntityId(2));
        assert!(!demoted[0].is_primary);
        assert_eq!(demoted[0].updated_at, now);
    }

    #[test]
    fn non_primary_or_unattached_contacts_demote_nobody() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let siblings = vec![contact(2, Some(10), true)];

        assert!(demote_competing_primaries(&contact(1, Some(10), false), &siblings, now).is_empty());
        assert!(demote_competing_primaries(&contact(1, None, true), &siblings, now).is_empty());
    }
}
