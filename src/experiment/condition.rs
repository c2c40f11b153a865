//! Experimental conditions.

use std::fmt;

use serde::Serialize;

use super::latency::LatencyTier;
use super::persona::{self, Persona};

/// The manipulation a session runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentCondition {
    /// Warm partner, fast replies.
    Acceptance,
    /// Hedging partner, hesitant replies.
    Ambiguous,
    /// Cold partner, slow replies with typing flicker.
    Rejection,
    /// Partner that openly identifies as an AI.
    AiClear,
    /// Casual partner that talks like a friend.
    FriendLike,
    /// Fallback for anything unrecognised.
    Neutral,
}

struct ConditionEntry {
    id: &'static str,
    persona: &'static Persona,
    tier: LatencyTier,
}

impl ExperimentCondition {
    /// Every condition, in display order.
    pub const ALL: [ExperimentCondition; 6] = [
        Self::Acceptance,
        Self::Ambiguous,
        Self::Rejection,
        Self::AiClear,
        Self::FriendLike,
        Self::Neutral,
    ];

    fn entry(self) -> ConditionEntry {
        match self {
            Self::Acceptance => ConditionEntry {
                id: "acceptance",
                persona: &persona::ACCEPTANCE,
                tier: LatencyTier::Fast,
            },
            Self::Ambiguous => ConditionEntry {
                id: "ambiguous",
                persona: &persona::AMBIGUOUS,
                tier: LatencyTier::Ambiguous,
            },
            Self::Rejection => ConditionEntry {
                id: "rejection",
                persona: &persona::REJECTION,
                tier: LatencyTier::Slow,
            },
            Self::AiClear => ConditionEntry {
                id: "ai_clear",
                persona: &persona::AI_CLEAR,
                tier: LatencyTier::Fast,
            },
            Self::FriendLike => ConditionEntry {
                id: "friend_like",
                persona: &persona::FRIEND_LIKE,
                tier: LatencyTier::Fast,
            },
            Self::Neutral => ConditionEntry {
                id: "neutral",
                persona: &persona::NEUTRAL,
                tier: LatencyTier::Default,
            },
        }
    }

    /// Parse a condition identifier.
    ///
    /// Case and surrounding whitespace are ignored, and `-` or spaces may
    /// stand in for `_`. Unknown identifiers return `None`.
    pub fn parse(id: &str) -> Option<Self> {
        let normalized = id.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|condition| condition.entry().id == normalized)
    }

    /// Canonical identifier.
    pub fn id(self) -> &'static str {
        self.entry().id
    }

    /// Persona played under this condition.
    pub fn persona(self) -> &'static Persona {
        self.entry().persona
    }

    /// Latency tier used when the request does not name one.
    pub fn default_tier(self) -> LatencyTier {
        self.entry().tier
    }
}

impl fmt::Display for ExperimentCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
