use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned identifier shared by every entity kind.
///
/// `EntityId::UNASSIGNED` marks a value that has not been persisted yet;
/// the store replaces it with the next free id on `save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    pub const UNASSIGNED: EntityId = EntityId(0);

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<u64>().map(EntityId)
    }
}

/// The five entity tables of the sales funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Customer,
    Contact,
    Lead,
    Opportunity,
    Activity,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Customer,
        EntityKind::Contact,
        EntityKind::Lead,
        EntityKind::Opportunity,
        EntityKind::Activity,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            Self::Customer => "customers",
            Self::Contact => "contacts",
            Self::Lead => "leads",
            Self::Opportunity => "opportunities",
            Self::Activity => "activities",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Customer => "customer",
            Self::Contact => "contact",
            Self::Lead => "lead",
            Self::Opportunity => "opportunity",
            Self::Activity => "activity",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_id_is_zero() {
        assert!(!EntityId::UNASSIGNED.is_assigned());
        assert!(EntityId(7).is_assigned());
        assert_eq!("42".parse::<EntityId>().unwrap(), EntityId(42));
    }

    #[test]
    fn entity_id_serializes_as_bare_number() {
        assert_eq!(serde_json::to_string(&EntityId(3)).unwrap(), "3");
    }
}
