//! Snapshot durability for the in-memory store.
//!
//! The whole store is written as one versioned MessagePack document. Writes
//! go to a temp file in the target directory which is then renamed over the
//! old snapshot, so a crash leaves either the previous or the new file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::debug;

use super::table::Table;
use crate::core::{CrmError, Result};
use crate::domain::{Activity, Contact, Customer, Lead, Opportunity};

pub const SNAPSHOT_VERSION: u32 = 1;

// ============================================================================
// Durability Configuration
// ============================================================================

/// When the store writes its snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityMode {
    /// After every successful write.
    #[default]
    Sync,
    /// Only on `checkpoint`.
    Async,
    /// Never; an existing snapshot is still loaded on open.
    None,
}

impl fmt::Display for DurabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sync => "sync",
            Self::Async => "async",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for DurabilityMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(Self::Sync),
            "async" => Ok(Self::Async),
            "none" | "off" => Ok(Self::None),
            other => Err(format!("unknown durability mode '{other}'")),
        }
    }
}

// ============================================================================
// Store Snapshot
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub entity_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub metadata: SnapshotMetadata,
    pub customers: Table<Customer>,
    pub contacts: Table<Contact>,
    pub leads: Table<Lead>,
    pub opportunities: Table<Opportunity>,
    pub activities: Table<Activity>,
}

impl StoreSnapshot {
    pub fn new(
        customers: Table<Customer>,
        contacts: Table<Contact>,
        leads: Table<Lead>,
        opportunities: Table<Opportunity>,
        activities: Table<Activity>,
    ) -> Self {
        let mut snapshot = Self {
            version: SNAPSHOT_VERSION,
            metadata: SnapshotMetadata {
                created_at: Utc::now(),
                entity_count: 0,
            },
            customers,
            contacts,
            leads,
            opportunities,
            activities,
        };
        snapshot.recount();
        snapshot
    }

    /// Refreshes `metadata.entity_count` after tables were changed in place.
    pub fn recount(&mut self) {
        self.metadata.entity_count = self.customers.len()
            + self.contacts.len()
            + self.leads.len()
            + self.opportunities.len()
            + self.activities.len();
    }
}

// ============================================================================
// Persistence Manager
// ============================================================================

pub struct PersistenceManager {
    snapshot_path: PathBuf,
    durability_mode: DurabilityMode,
}

impl PersistenceManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P, durability_mode: DurabilityMode) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
            durability_mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn durability_mode(&self) -> DurabilityMode {
        self.durability_mode
    }

    /// Whether a write should be followed by a snapshot.
    pub fn writes_through(&self) -> bool {
        self.durability_mode == DurabilityMode::Sync
    }

    pub fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.snapshot_path)?;
        let snapshot: StoreSnapshot = rmp_serde::from_slice(&data)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CrmError::storage(format!(
                "unsupported snapshot version {} in {}",
                snapshot.version,
                self.snapshot_path.display()
            )));
        }
        debug!(
            path = %self.snapshot_path.display(),
            entities = snapshot.metadata.entity_count,
            "snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let dir = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let serialized = rmp_serde::to_vec_named(snapshot)?;
        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(&serialized)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| CrmError::storage(format!("failed to replace snapshot: {}", e.error)))?;

        debug!(
            path = %self.snapshot_path.display(),
            bytes = serialized.len(),
            "snapshot written"
        );
        Ok(())
    }
}
