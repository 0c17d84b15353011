use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::EntityId;
use crate::domain::Entity;

/// Rows of one entity type keyed by id, plus the id sequence.
///
/// Ids start at 1 and never repeat, deletes included. A row saved with an
/// explicit id above the sequence moves the sequence past it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "E: Serialize", deserialize = "E: Deserialize<'de>"))]
pub struct Table<E> {
    rows: BTreeMap<EntityId, E>,
    next_id: u64,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<E: Entity> Table<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `entity`, assigning an id first when it has none.
    pub fn upsert(&mut self, mut entity: E) -> E {
        let id = if entity.id().is_assigned() {
            entity.id()
        } else {
            let id = EntityId(self.next_id);
            entity.set_id(id);
            id
        };
        self.next_id = self.next_id.max(id.get() + 1);
        self.rows.insert(id, entity.clone());
        entity
    }

    pub fn get(&self, id: EntityId) -> Option<&E> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<E> {
        self.rows.remove(&id)
    }

    /// Removes every row matching `predicate` and returns how many went.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&E) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, row| !predicate(row));
        before - self.rows.len()
    }

    /// Cloned rows in ascending id order.
    pub fn rows(&self) -> Vec<E> {
        self.rows.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}
