//! Conversation state for one participant.
//!
//! A [`ConversationSession`] is owned by the caller and handed to the turn
//! handler by `&mut` for each turn. Messages are append-only; the only way to
//! add one is through a turn.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::experiment::{self, Resolution};

/// Participant identifier used when none is supplied.
pub const ANONYMOUS_PARTICIPANT: &str = "anon";

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The participant.
    User,
    /// The simulated partner.
    Partner,
}

impl Speaker {
    /// Label used in transcripts.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Partner => "Partner",
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author.
    pub speaker: Speaker,
    /// Message text as entered or generated.
    pub text: String,
    /// When the message was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// ISO-8601 UTC timestamp with microsecond precision.
    pub fn iso_timestamp(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

/// Format a timestamp the way it appears in logs and transcripts.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// One participant's conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSession {
    id: Uuid,
    participant_id: String,
    condition: String,
    latency_tier: Option<String>,
    intro: Message,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
}

impl ConversationSession {
    /// Start a session.
    ///
    /// A blank `participant_id` becomes [`ANONYMOUS_PARTICIPANT`]. The
    /// condition and tier are stored as given; resolution happens per turn.
    pub fn new(
        participant_id: &str,
        condition: &str,
        latency_tier: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let participant_id = match participant_id.trim() {
            "" => ANONYMOUS_PARTICIPANT.to_owned(),
            pid => pid.to_owned(),
        };
        let latency_tier = latency_tier
            .map(str::trim)
            .filter(|tier| !tier.is_empty())
            .map(str::to_owned);
        let resolution = experiment::resolve_with_tier(condition, latency_tier.as_deref());

        Self {
            id: Uuid::new_v4(),
            participant_id,
            condition: condition.trim().to_owned(),
            latency_tier,
            intro: Message {
                speaker: Speaker::Partner,
                text: resolution.persona.intro.to_owned(),
                timestamp: created_at,
            },
            messages: Vec::new(),
            created_at,
        }
    }

    /// Unique session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Participant identifier (never blank).
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Condition identifier as requested.
    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// Latency tier as requested, if any.
    pub fn latency_tier(&self) -> Option<&str> {
        self.latency_tier.as_deref()
    }

    /// Resolve this session's condition and tier.
    pub fn resolution(&self) -> Resolution {
        experiment::resolve_with_tier(&self.condition, self.latency_tier.as_deref())
    }

    /// Greeting shown before the first turn. Not part of the turn history.
    pub fn intro(&self) -> &Message {
        &self.intro
    }

    /// Turn history, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// When the session started.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn push(&mut self, speaker: Speaker, text: String, timestamp: DateTime<Utc>) {
        self.messages.push(Message {
            speaker,
            text,
            timestamp,
        });
    }
}

/// Render the intro and history, one line per message, oldest first.
pub fn render_transcript(session: &ConversationSession) -> String {
    std::iter::once(session.intro())
        .chain(session.messages())
        .map(|m| format!("{} ({}): {}", m.speaker.label(), m.iso_timestamp(), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}
