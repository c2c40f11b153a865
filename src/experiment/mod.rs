//! Condition resolution: from a request parameter to a persona and a latency
//! profile.
//!
//! Resolution never fails. Unrecognised conditions run the neutral persona
//! with the default one-second profile, and unrecognised latency tiers fall
//! back to the condition's own tier.

use serde::Serialize;

pub mod condition;
pub mod latency;
pub mod persona;

pub use condition::ExperimentCondition;
pub use latency::{DelayPhase, LatencyProfile, LatencyTier};
pub use persona::Persona;

/// Everything a turn needs to know about its condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolution {
    /// Resolved condition (`Neutral` for unknown identifiers).
    pub condition: ExperimentCondition,
    /// Persona to play.
    pub persona: &'static Persona,
    /// Delays to apply before replying.
    pub latency: LatencyProfile,
}

/// Resolve a condition identifier using the condition's own latency tier.
pub fn resolve(condition_id: &str) -> Resolution {
    resolve_with_tier(condition_id, None)
}

/// Resolve a condition identifier with an optional latency tier override.
pub fn resolve_with_tier(condition_id: &str, tier_id: Option<&str>) -> Resolution {
    let condition = ExperimentCondition::parse(condition_id).unwrap_or(ExperimentCondition::Neutral);
    let tier = tier_id
        .and_then(LatencyTier::parse)
        .unwrap_or_else(|| condition.default_tier());
    Resolution {
        condition,
        persona: condition.persona(),
        latency: tier.profile(),
    }
}
