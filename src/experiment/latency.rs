//! Simulated response latency.
//!
//! A [`LatencyProfile`] is an ordered list of [`DelayPhase`]s executed one
//! after the other before the partner reply is released. Multi-phase profiles
//! reproduce a partner who starts typing, stops, and resumes.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;

/// One waiting period before a reply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DelayPhase {
    /// Lower bound of the wait in seconds.
    pub min_secs: f64,
    /// Upper bound of the wait in seconds.
    pub max_secs: f64,
    /// Whether the partner appears to be typing during this phase.
    pub shows_typing: bool,
}

impl DelayPhase {
    const fn typing(min_secs: f64, max_secs: f64) -> Self {
        Self {
            min_secs,
            max_secs,
            shows_typing: true,
        }
    }

    const fn silent(min_secs: f64, max_secs: f64) -> Self {
        Self {
            min_secs,
            max_secs,
            shows_typing: false,
        }
    }

    /// Draw a wait uniformly from `[min_secs, max_secs]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let lo = self.min_secs.max(0.0);
        let hi = self.max_secs.max(lo);
        let secs = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
        Duration::from_secs_f64(secs)
    }
}

/// Named latency tier, selectable independently from the persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyTier {
    /// Prompt replies, well under a second or two.
    Fast,
    /// Several seconds of typing, enough to feel hesitant.
    Ambiguous,
    /// Typing flicker, a pause, then a long final stretch.
    Slow,
    /// Fixed one second, used for unrecognised conditions.
    Default,
}

impl LatencyTier {
    /// Every tier, in display order.
    pub const ALL: [LatencyTier; 4] = [Self::Fast, Self::Ambiguous, Self::Slow, Self::Default];

    /// Parse a tier identifier. Matching ignores case and surrounding
    /// whitespace; unknown identifiers return `None`.
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "fast" => Some(Self::Fast),
            "ambiguous" => Some(Self::Ambiguous),
            "slow" => Some(Self::Slow),
            "default" => Some(Self::Default),
            _ => None,
        }
    }

    /// Tag written to the turn log.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Ambiguous => "ambiguous",
            Self::Slow => "slow",
            Self::Default => "default",
        }
    }

    /// The static profile for this tier.
    pub fn profile(self) -> LatencyProfile {
        let phases: &'static [DelayPhase] = match self {
            Self::Fast => &FAST_PHASES,
            Self::Ambiguous => &AMBIGUOUS_PHASES,
            Self::Slow => &SLOW_PHASES,
            Self::Default => &DEFAULT_PHASES,
        };
        LatencyProfile { tier: self, phases }
    }
}

impl fmt::Display for LatencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

static FAST_PHASES: [DelayPhase; 1] = [DelayPhase::typing(0.5, 1.0)];

static AMBIGUOUS_PHASES: [DelayPhase; 1] = [DelayPhase::typing(5.0, 8.0)];

static SLOW_PHASES: [DelayPhase; 3] = [
    DelayPhase::typing(1.5, 3.0),
    DelayPhase::silent(0.5, 1.5),
    DelayPhase::typing(8.0, 12.0),
];

static DEFAULT_PHASES: [DelayPhase; 1] = [DelayPhase::typing(1.0, 1.0)];

/// An ordered, immutable sequence of delay phases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyProfile {
    /// Tier this profile belongs to.
    pub tier: LatencyTier,
    /// Phases, executed in order.
    pub phases: &'static [DelayPhase],
}

impl LatencyProfile {
    /// Sum of the phase lower bounds.
    pub fn min_total(&self) -> Duration {
        self.phases
            .iter()
            .map(|p| Duration::from_secs_f64(p.min_secs.max(0.0)))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Sum of the phase upper bounds.
    pub fn max_total(&self) -> Duration {
        self.phases
            .iter()
            .map(|p| Duration::from_secs_f64(p.max_secs.max(p.min_secs).max(0.0)))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Draw one wait per phase.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Duration> {
        self.phases.iter().map(|p| p.sample(rng)).collect()
    }
}
