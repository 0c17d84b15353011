//! Closed value sets for statuses, stages, sources and activity kinds.
//!
//! Every enum carries an `ALL` table in declaration order so breakdowns can
//! enumerate variants that have no rows, and parses from / prints as the
//! upper snake case names used on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned when a path segment or query value names no variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! funnel_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
                match normalized.as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $label,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

funnel_enum! {
    CustomerStatus ("customer status") {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Prospect => "PROSPECT",
    }
}

funnel_enum! {
    ContactStatus ("contact status") {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        DoNotContact => "DO_NOT_CONTACT",
    }
}

funnel_enum! {
    LeadStatus ("lead status") {
        New => "NEW",
        Contacted => "CONTACTED",
        Qualified => "QUALIFIED",
        Unqualified => "UNQUALIFIED",
        Converted => "CONVERTED",
        Lost => "LOST",
    }
}

funnel_enum! {
    LeadSource ("lead source") {
        Website => "WEBSITE",
        SocialMedia => "SOCIAL_MEDIA",
        EmailCampaign => "EMAIL_CAMPAIGN",
        Referral => "REFERRAL",
        ColdCall => "COLD_CALL",
        TradeShow => "TRADE_SHOW",
        Advertisement => "ADVERTISEMENT",
        Other => "OTHER",
    }
}

funnel_enum! {
    OpportunityStage ("opportunity stage") {
        Prospecting => "PROSPECTING",
        Qualification => "QUALIFICATION",
        NeedsAnalysis => "NEEDS_ANALYSIS",
        Proposal => "PROPOSAL",
        Negotiation => "NEGOTIATION",
        ClosedWon => "CLOSED_WON",
        ClosedLost => "CLOSED_LOST",
    }
}

funnel_enum! {
    OpportunitySource ("opportunity source") {
        InboundLead => "INBOUND_LEAD",
        OutboundProspecting => "OUTBOUND_PROSPECTING",
        Referral => "REFERRAL",
        ExistingCustomer => "EXISTING_CUSTOMER",
        Partner => "PARTNER",
        TradeShow => "TRADE_SHOW",
        Other => "OTHER",
    }
}

funnel_enum! {
    ActivityType ("activity type") {
        Call => "CALL",
        Email => "EMAIL",
        Meeting => "MEETING",
        Task => "TASK",
        Note => "NOTE",
        Demo => "DEMO",
        Proposal => "PROPOSAL",
        FollowUp => "FOLLOW_UP",
    }
}

funnel_enum! {
    ActivityStatus ("activity status") {
        Planned => "PLANNED",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
        Overdue => "OVERDUE",
    }
}

funnel_enum! {
    ActivityPriority ("activity priority") {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Urgent => "URGENT",
    }
}

impl Default for CustomerStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl Default for ContactStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        Self::New
    }
}

impl Default for OpportunityStage {
    fn default() -> Self {
        Self::Prospecting
    }
}

impl Default for ActivityStatus {
    fn default() -> Self {
        Self::Planned
    }
}

impl Default for ActivityPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl OpportunityStage {
    /// Win probability (percent) a deal gets when it enters this stage.
    pub fn default_probability(self) -> u8 {
        match self {
            Self::Prospecting => 10,
            Self::Qualification => 25,
            Self::NeedsAnalysis => 50,
            Self::Proposal => 75,
            Self::Negotiation => 90,
            Self::ClosedWon => 100,
            Self::ClosedLost => 0,
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Self::ClosedWon | Self::ClosedLost)
    }
}

impl ActivityStatus {
    /// Statuses that can no longer fall behind schedule.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_probability_table_matches_sales_process() {
        let table: Vec<(OpportunityStage, u8)> = OpportunityStage::ALL
            .iter()
            .map(|stage| (*stage, stage.default_probability()))
            .collect();

        assert_eq!(
            table,
            vec![
                (OpportunityStage::Prospecting, 10),
                (OpportunityStage::Qualification, 25),
                (OpportunityStage::NeedsAnalysis, 50),
                (OpportunityStage::Proposal, 75),
                (OpportunityStage::Negotiation, 90),
                (OpportunityStage::ClosedWon, 100),
                (OpportunityStage::ClosedLost, 0),
            ]
        );
    }

    #[test]
    fn only_won_and_lost_are_closed() {
        let closed: Vec<_> = OpportunityStage::ALL
            .iter()
            .copied()
            .filter(|stage| stage.is_closed())
            .collect();
        assert_eq!(
            closed,
            vec![OpportunityStage::ClosedWon, OpportunityStage::ClosedLost]
        );
    }

    #[test]
    fn parses_wire_names_case_insensitively() {
        assert_eq!(
            "closed_won".parse::<OpportunityStage>().unwrap(),
            OpportunityStage::ClosedWon
        );
        assert_eq!(
            "do-not-contact".parse::<ContactStatus>().unwrap(),
            ContactStatus::DoNotContact
        );
        let err = "SOMEDAY".parse::<LeadStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown lead status 'SOMEDAY'");
    }

    #[test]
    fn serde_uses_upper_snake_case() {
        assert_eq!(
            serde_json::to_string(&LeadSource::EmailCampaign).unwrap(),
            "\"EMAIL_CAMPAIGN\""
        );
        let parsed: ActivityType = serde_json::from_str("\"FOLLOW_UP\"").unwrap();
        assert_eq!(parsed, ActivityType::FollowUp);
    }

    #[test]
    fn every_table_lists_each_variant_once() {
        assert_eq!(LeadSource::ALL.len(), 8);
        assert_eq!(ActivityStatus::ALL.len(), 5);
        assert_eq!(ActivityPriority::ALL.len(), 4);
    }
}
