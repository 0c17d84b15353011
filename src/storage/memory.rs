use async_trait::async_trait;
use std::path::Path;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};

use super::engine::{ConversionStore, EntityStore, Filter, Page, PageRequest, Reconcile, select_page};
use super::persistence::{DurabilityMode, PersistenceManager, StoreSnapshot};
use super::table::Table;
use crate::core::{EntityId, EntityKind, Result};
use crate::domain::{Activity, Contact, Customer, Entity, Lead, Opportunity};

/// Async in-memory store with one lock per entity table.
///
/// Multi-table operations take locks in the fixed order customers,
/// contacts, leads, opportunities, activities.
pub struct InMemoryStore {
    customers: RwLock<Table<Customer>>,
    contacts: RwLock<Table<Contact>>,
    leads: RwLock<Table<Lead>>,
    opportunities: RwLock<Table<Opportunity>>,
    activities: RwLock<Table<Activity>>,
    persistence: Option<Mutex<PersistenceManager>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::from_tables(
            Table::new(),
            Table::new(),
            Table::new(),
            Table::new(),
            Table::new(),
        )
    }

    /// Opens a store backed by the snapshot at `path`, loading it when the
    /// file exists.
    pub fn open<P: AsRef<Path>>(path: P, mode: DurabilityMode) -> Result<Self> {
        let manager = PersistenceManager::new(path, mode);
        let mut store = match manager.load()? {
            Some(snapshot) => {
                info!(
                    path = %manager.path().display(),
                    entities = snapshot.metadata.entity_count,
                    "restored store from snapshot"
                );
                Self::from_snapshot(snapshot)
            }
            None => Self::new(),
        };
        store.persistence = Some(Mutex::new(manager));
        Ok(store)
    }

    fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self::from_tables(
            snapshot.customers,
            snapshot.contacts,
            snapshot.leads,
            snapshot.opportunities,
            snapshot.activities,
        )
    }

    fn from_tables(
        customers: Table<Customer>,
        contacts: Table<Contact>,
        leads: Table<Lead>,
        opportunities: Table<Opportunity>,
        activities: Table<Activity>,
    ) -> Self {
        Self {
            customers: RwLock::new(customers),
            contacts: RwLock::new(contacts),
            leads: RwLock::new(leads),
            opportunities: RwLock::new(opportunities),
            activities: RwLock::new(activities),
            persistence: None,
        }
    }

    /// Writes a snapshot now, whatever the durability mode, unless the
    /// store has no backing file or persistence is off.
    pub async fn checkpoint(&self) -> Result<()> {
        match &self.persistence {
            Some(persistence) => {
                let manager = persistence.lock().await;
                if manager.durability_mode() == DurabilityMode::None {
                    return Ok(());
                }
                let snapshot = self.snapshot().await;
                manager.save(&snapshot)
            }
            None => Ok(()),
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let customers = self.customers.read().await;
        let contacts = self.contacts.read().await;
        let leads = self.leads.read().await;
        let opportunities = self.opportunities.read().await;
        let activities = self.activities.read().await;
        StoreSnapshot::new(
            customers.clone(),
            contacts.clone(),
            leads.clone(),
            opportunities.clone(),
            activities.clone(),
        )
    }

    /// Held by every writer while the store has a backing file, so staged
    /// snapshots never race each other.
    async fn lock_persistence(&self) -> Option<MutexGuard<'_, PersistenceManager>> {
        match &self.persistence {
            Some(persistence) => Some(persistence.lock().await),
            None => None,
        }
    }

    /// Snapshot of every table outside `held`. Held tables are left empty
    /// for the caller, which already has them write-locked, to fill in.
    async fn snapshot_around(&self, held: &[EntityKind]) -> StoreSnapshot {
        StoreSnapshot::new(
            self.copy_unless::<Customer>(held).await,
            self.copy_unless::<Contact>(held).await,
            self.copy_unless::<Lead>(held).await,
            self.copy_unless::<Opportunity>(held).await,
            self.copy_unless::<Activity>(held).await,
        )
    }

    async fn copy_unless<E: StoredEntity>(&self, held: &[EntityKind]) -> Table<E> {
        if held.contains(&E::KIND) {
            Table::new()
        } else {
            E::table(self).read().await.clone()
        }
    }

    /// Applies `change` to one table.
    ///
    /// Under write-through durability the change runs on a staged copy,
    /// which replaces the live table only once the snapshot holding it is
    /// on disk. A failed snapshot leaves the table untouched.
    async fn commit<E, T>(&self, change: impl FnOnce(&mut Table<E>) -> T + Send) -> Result<T>
    where
        E: StoredEntity,
        T: Send,
    {
        let guard = self.lock_persistence().await;
        let mut table = E::table(self).write().await;
        let Some(manager) = guard.as_deref().filter(|m| m.writes_through()) else {
            return Ok(change(&mut *table));
        };

        let mut snapshot = self.snapshot_around(&[E::KIND]).await;
        *E::slot(&mut snapshot) = table.clone();
        let out = change(E::slot(&mut snapshot));
        snapshot.recount();
        manager.save(&snapshot)?;
        *table = std::mem::take(E::slot(&mut snapshot));
        Ok(out)
    }

    async fn delete_customer_cascade(&self, id: EntityId) -> Result<bool> {
        let guard = self.lock_persistence().await;
        let mut customers = self.customers.write().await;
        let mut contacts = self.contacts.write().await;
        let mut opportunities = self.opportunities.write().await;
        if !customers.contains(id) {
            return Ok(false);
        }

        match guard.as_deref().filter(|m| m.writes_through()) {
            None => cascade_customer(&mut customers, &mut contacts, &mut opportunities, id),
            Some(manager) => {
                let mut snapshot = self
                    .snapshot_around(&[
                        EntityKind::Customer,
                        EntityKind::Contact,
                        EntityKind::Opportunity,
                    ])
                    .await;
                snapshot.customers = customers.clone();
                snapshot.contacts = contacts.clone();
                snapshot.opportunities = opportunities.clone();
                cascade_customer(
                    &mut snapshot.customers,
                    &mut snapshot.contacts,
                    &mut snapshot.opportunities,
                    id,
                );
                snapshot.recount();
                manager.save(&snapshot)?;
                *customers = snapshot.customers;
                *contacts = snapshot.contacts;
                *opportunities = snapshot.opportunities;
            }
        }
        Ok(true)
    }
}

fn cascade_customer(
    customers: &mut Table<Customer>,
    contacts: &mut Table<Contact>,
    opportunities: &mut Table<Opportunity>,
    id: EntityId,
) {
    customers.remove(id);
    let contacts_removed = contacts.remove_where(|c| c.customer_id == Some(id));
    let opportunities_removed = opportunities.remove_where(|o| o.customer_id == id);
    debug!(
        customer_id = %id,
        contacts_removed,
        opportunities_removed,
        "customer deleted with owned records"
    );
}

/// Inserts a converted lead's customer and contact and links both rows to
/// the new customer id.
fn link_conversion(
    customers: &mut Table<Customer>,
    contacts: &mut Table<Contact>,
    leads: &mut Table<Lead>,
    customer: Customer,
    mut contact: Contact,
    mut lead: Lead,
) -> (Customer, Contact, Lead) {
    let customer = customers.upsert(customer);
    contact.customer_id = Some(customer.id);
    let contact = contacts.upsert(contact);
    lead.converted_customer_id = Some(customer.id);
    let lead = leads.upsert(lead);
    (customer, contact, lead)
}

/// Maps an entity type to its table inside [`InMemoryStore`] and inside a
/// [`StoreSnapshot`].
pub trait StoredEntity: Entity {
    fn table(store: &InMemoryStore) -> &RwLock<Table<Self>>;

    fn slot(snapshot: &mut StoreSnapshot) -> &mut Table<Self>;
}

impl StoredEntity for Customer {
    fn table(store: &InMemoryStore) -> &RwLock<Table<Self>> {
        &store.customers
    }

    fn slot(snapshot: &mut StoreSnapshot) -> &mut Table<Self> {
        &mut snapshot.customers
    }
}

impl StoredEntity for Contact {
    fn table(store: &InMemoryStore) -> &RwLock<Table<Self>> {
        &store.contacts
    }

    fn slot(snapshot: &mut StoreSnapshot) -> &mut Table<Self> {
        &mut snapshot.contacts
    }
}

impl StoredEntity for Lead {
    fn table(store: &InMemoryStore) -> &RwLock<Table<Self>> {
        &store.leads
    }

    fn slot(snapshot: &mut StoreSnapshot) -> &mut Table<Self> {
        &mut snapshot.leads
    }
}

impl StoredEntity for Opportunity {
    fn table(store: &InMemoryStore) -> &RwLock<Table<Self>> {
        &store.opportunities
    }

    fn slot(snapshot: &mut StoreSnapshot) -> &mut Table<Self> {
        &mut snapshot.opportunities
    }
}

impl StoredEntity for Activity {
    fn table(store: &InMemoryStore) -> &RwLock<Table<Self>> {
        &store.activities
    }

    fn slot(snapshot: &mut StoreSnapshot) -> &mut Table<Self> {
        &mut snapshot.activities
    }
}

#[async_trait]
impl<E: StoredEntity> EntityStore<E> for InMemoryStore {
    async fn get(&self, id: EntityId) -> Result<Option<E>> {
        Ok(E::table(self).read().await.get(id).cloned())
    }

    async fn save(&self, entity: E) -> Result<E> {
        let saved = self.commit(|table: &mut Table<E>| table.upsert(entity)).await?;
        debug!(kind = %E::KIND, id = %saved.id(), "saved");
        Ok(saved)
    }

    async fn save_batch(&self, entities: Vec<E>) -> Result<Vec<E>> {
        if entities.is_empty() {
            return Ok(entities);
        }
        let saved = self
            .commit(|table: &mut Table<E>| {
                entities
                    .into_iter()
                    .map(|entity| table.upsert(entity))
                    .collect::<Vec<_>>()
            })
            .await?;
        debug!(kind = %E::KIND, count = saved.len(), "saved batch");
        Ok(saved)
    }

    async fn save_reconciled(&self, entity: E, reconcile: Reconcile<E>) -> Result<E> {
        let (saved, reconciled) = self
            .commit(|table: &mut Table<E>| {
                let saved = table.upsert(entity);
                let changed = reconcile(&saved, &table.rows());
                let reconciled = changed.len();
                for row in changed {
                    table.upsert(row);
                }
                (saved, reconciled)
            })
            .await?;
        debug!(kind = %E::KIND, id = %saved.id(), reconciled, "saved");
        Ok(saved)
    }

    async fn delete(&self, id: EntityId) -> Result<bool> {
        let removed = if E::KIND == EntityKind::Customer {
            self.delete_customer_cascade(id).await?
        } else if E::table(self).read().await.contains(id) {
            self.commit(|table: &mut Table<E>| table.remove(id).is_some())
                .await?
        } else {
            false
        };
        if removed {
            debug!(kind = %E::KIND, id = %id, "deleted");
        }
        Ok(removed)
    }

    async fn query(&self, filter: &Filter<E>, page: &PageRequest) -> Result<Page<E>> {
        let rows = E::table(self).read().await.rows();
        Ok(select_page(rows, filter, page))
    }

    async fn exists(&self, id: EntityId) -> Result<bool> {
        Ok(E::table(self).read().await.contains(id))
    }

    async fn scan(&self) -> Result<Vec<E>> {
        Ok(E::table(self).read().await.rows())
    }
}

#[async_trait]
impl ConversionStore for InMemoryStore {
    async fn save_conversion(
        &self,
        customer: Customer,
        contact: Contact,
        lead: Lead,
    ) -> Result<(Customer, Contact, Lead)> {
        let guard = self.lock_persistence().await;
        let mut customers = self.customers.write().await;
        let mut contacts = self.contacts.write().await;
        let mut leads = self.leads.write().await;

        let saved = match guard.as_deref().filter(|m| m.writes_through()) {
            None => link_conversion(&mut customers, &mut contacts, &mut leads, customer, contact, lead),
            Some(manager) => {
                let mut snapshot = self
                    .snapshot_around(&[EntityKind::Customer, EntityKind::Contact, EntityKind::Lead])
                    .await;
                snapshot.customers = customers.clone();
                snapshot.contacts = contacts.clone();
                snapshot.leads = leads.clone();
                let saved = link_conversion(
                    &mut snapshot.customers,
                    &mut snapshot.contacts,
                    &mut snapshot.leads,
                    customer,
                    contact,
                    lead,
                );
                snapshot.recount();
                manager.save(&snapshot)?;
                *customers = snapshot.customers;
                *contacts = snapshot.contacts;
                *leads = snapshot.leads;
                saved
            }
        };
        debug!(customer_id = %saved.0.id, lead_id = %saved.2.id, "conversion saved");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CrmError;
    use crate::domain::{
        ActivityDraft, ActivityType, ContactDraft, CustomerDraft, LeadDraft, LeadStatus,
        OpportunityDraft,
    };
    use crate::lifecycle::Lifecycle;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn customer(name: &str) -> Customer {
        Customer::apply_create_defaults(CustomerDraft::new(name), Utc::now())
    }

    fn contact_of(customer_id: EntityId) -> Contact {
        let mut draft = ContactDraft::new("Jane", "Doe");
        draft.customer_id = Some(customer_id);
        Contact::apply_create_defaults(draft, Utc::now())
    }

    #[tokio::test]
    async fn save_assigns_id_and_get_finds_it() {
        let store = InMemoryStore::new();
        let saved = store.save(customer("Acme")).await.unwrap();
        assert_eq!(saved.id, EntityId(1));

        let found: Option<Customer> = store.get(saved.id).await.unwrap();
        assert_eq!(found.unwrap().company_name, "Acme");
        assert!(EntityStore::<Customer>::exists(&store, saved.id).await.unwrap());
        assert!(!EntityStore::<Customer>::exists(&store, EntityId(99)).await.unwrap());
    }

    #[tokio::test]
    async fn tables_have_independent_sequences() {
        let store = InMemoryStore::new();
        let acme = store.save(customer("Acme")).await.unwrap();
        let jane = store.save(contact_of(acme.id)).await.unwrap();
        assert_eq!(acme.id, EntityId(1));
        assert_eq!(jane.id, EntityId(1));
    }

    #[tokio::test]
    async fn deleting_customer_cascades_but_keeps_activities() {
        let store = InMemoryStore::new();
        let acme = store.save(customer("Acme")).await.unwrap();
        let globex = store.save(customer("Globex")).await.unwrap();
        store.save(contact_of(acme.id)).await.unwrap();
        let kept_contact = store.save(contact_of(globex.id)).await.unwrap();
        store
            .save(Opportunity::apply_create_defaults(
                OpportunityDraft::new("Deal", Decimal::from(10), acme.id),
                Utc::now(),
            ))
            .await
            .unwrap();
        let mut activity = ActivityDraft::new("Call Acme", ActivityType::Call);
        activity.customer_id = Some(acme.id);
        let activity = store
            .save(Activity::apply_create_defaults(activity, Utc::now()))
            .await
            .unwrap();

        assert!(EntityStore::<Customer>::delete(&store, acme.id).await.unwrap());

        let contacts: Vec<Contact> = store.scan().await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].id, kept_contact.id);
        let opportunities: Vec<Opportunity> = store.scan().await.unwrap();
        assert!(opportunities.is_empty());
        let still_there: Option<Activity> = store.get(activity.id).await.unwrap();
        assert_eq!(still_there.unwrap().customer_id, Some(acme.id));
    }

    #[tokio::test]
    async fn deleting_missing_row_reports_false() {
        let store = InMemoryStore::new();
        assert!(!EntityStore::<Lead>::delete(&store, EntityId(7)).await.unwrap());
        assert!(!EntityStore::<Customer>::delete(&store, EntityId(7)).await.unwrap());
    }

    #[tokio::test]
    async fn save_batch_writes_every_row() {
        let store = InMemoryStore::new();
        let saved = store
            .save_batch(vec![customer("a"), customer("b"), customer("c")])
            .await
            .unwrap();
        let ids: Vec<u64> = saved.iter().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn reopened_store_sees_data_and_continues_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crm.snapshot");
        {
            let store = InMemoryStore::open(&path, DurabilityMode::Sync).unwrap();
            store.save(customer("Acme")).await.unwrap();
            let doomed = store.save(customer("Doomed")).await.unwrap();
            EntityStore::<Customer>::delete(&store, doomed.id).await.unwrap();
        }

        let store = InMemoryStore::open(&path, DurabilityMode::Sync).unwrap();
        let customers: Vec<Customer> = store.scan().await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].company_name, "Acme");

        let next = store.save(customer("Globex")).await.unwrap();
        assert_eq!(next.id, EntityId(3));
    }

    /// Makes every later snapshot write fail by putting a plain file where
    /// the snapshot directory should be.
    fn block_dir(dir: &Path) {
        std::fs::remove_dir_all(dir).unwrap();
        std::fs::write(dir, b"").unwrap();
    }

    fn unblock_dir(dir: &Path) {
        std::fs::remove_file(dir).unwrap();
        std::fs::create_dir(dir).unwrap();
    }

    #[tokio::test]
    async fn failed_snapshot_leaves_tables_untouched() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("data");
        let store = InMemoryStore::open(dir.join("crm.snapshot"), DurabilityMode::Sync).unwrap();
        let acme = store.save(customer("Acme")).await.unwrap();
        store.save(contact_of(acme.id)).await.unwrap();

        block_dir(&dir);
        let err = store.save(customer("Globex")).await.unwrap_err();
        assert!(matches!(err, CrmError::StorageUnavailable(_)));
        assert!(store.save_batch(vec![customer("a"), customer("b")]).await.is_err());
        assert!(EntityStore::<Customer>::delete(&store, acme.id).await.is_err());
        assert!(EntityStore::<Contact>::delete(&store, EntityId(1)).await.is_err());

        let customers: Vec<Customer> = store.scan().await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].company_name, "Acme");
        let contacts: Vec<Contact> = store.scan().await.unwrap();
        assert_eq!(contacts.len(), 1);

        unblock_dir(&dir);
        let globex = store.save(customer("Globex")).await.unwrap();
        assert_eq!(globex.id, EntityId(2));
    }

    #[tokio::test]
    async fn failed_conversion_writes_nothing() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("data");
        let store = InMemoryStore::open(dir.join("crm.snapshot"), DurabilityMode::Sync).unwrap();
        let lead = store
            .save(Lead::apply_create_defaults(LeadDraft::new("Ada", "Lovelace"), Utc::now()))
            .await
            .unwrap();

        block_dir(&dir);
        let mut converted = lead.clone();
        converted.status = LeadStatus::Converted;
        let result = store
            .save_conversion(customer("Lovelace Ltd"), contact_of(EntityId::UNASSIGNED), converted.clone())
            .await;
        assert!(result.is_err());
        let customers: Vec<Customer> = store.scan().await.unwrap();
        assert!(customers.is_empty());
        let contacts: Vec<Contact> = store.scan().await.unwrap();
        assert!(contacts.is_empty());
        let stored: Option<Lead> = store.get(lead.id).await.unwrap();
        assert_eq!(stored.unwrap().status, LeadStatus::New);

        unblock_dir(&dir);
        let (opened, contact, lead) = store
            .save_conversion(customer("Lovelace Ltd"), contact_of(EntityId::UNASSIGNED), converted)
            .await
            .unwrap();
        assert_eq!(opened.id, EntityId(1));
        assert_eq!(contact.customer_id, Some(opened.id));
        assert_eq!(lead.converted_customer_id, Some(opened.id));
        assert_eq!(lead.status, LeadStatus::Converted);
    }

    #[tokio::test]
    async fn reconciled_rows_are_written_with_the_entity() {
        let store = InMemoryStore::new();
        let acme = store.save(customer("Acme")).await.unwrap();
        let first = store.save(contact_of(acme.id)).await.unwrap();

        let second = store
            .save_reconciled(
                contact_of(acme.id),
                Box::new(|saved: &Contact, rows: &[Contact]| {
                    rows.iter()
                        .filter(|row| row.id != saved.id)
                        .map(|row| Contact {
                            job_title: Some("touched".into()),
                            ..row.clone()
                        })
                        .collect()
                }),
            )
            .await
            .unwrap();

        assert_eq!(second.id, EntityId(2));
        let first: Option<Contact> = store.get(first.id).await.unwrap();
        assert_eq!(first.unwrap().job_title.as_deref(), Some("touched"));
        let second: Option<Contact> = store.get(second.id).await.unwrap();
        assert_eq!(second.unwrap().job_title, None);
    }

    #[tokio::test]
    async fn async_mode_writes_only_on_checkpoint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crm.snapshot");
        let store = InMemoryStore::open(&path, DurabilityMode::Async).unwrap();
        store.save(customer("Acme")).await.unwrap();
        assert!(!path.exists());

        store.checkpoint().await.unwrap();
        assert!(path.exists());
    }
}
