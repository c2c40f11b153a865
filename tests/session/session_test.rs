//! Session construction and transcript rendering.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tandem::clock::ManualClock;
use tandem::experiment::{ExperimentCondition, LatencyTier};
use tandem::session::{
    render_transcript, ConversationSession, Speaker, ANONYMOUS_PARTICIPANT,
};
use tandem::turn::TurnHandler;
use tandem::turn_log::MemoryTurnLog;

use crate::support::ScriptedProvider;

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

#[test]
fn blank_participant_becomes_anonymous() {
    for pid in ["", "   "] {
        let session = ConversationSession::new(pid, "acceptance", None, start());
        assert_eq!(session.participant_id(), ANONYMOUS_PARTICIPANT);
    }
    let named = ConversationSession::new(" p-12 ", "acceptance", None, start());
    assert_eq!(named.participant_id(), "p-12");
}

#[test]
fn intro_comes_from_persona_and_is_not_history() {
    let session = ConversationSession::new("p1", "rejection", None, start());
    assert_eq!(session.intro().speaker, Speaker::Partner);
    assert_eq!(
        session.intro().text,
        ExperimentCondition::Rejection.persona().intro
    );
    assert_eq!(session.intro().timestamp, start());
    assert!(session.messages().is_empty());
    assert_eq!(session.created_at(), start());
}

#[test]
fn requested_condition_and_tier_are_kept_verbatim() {
    let session = ConversationSession::new("p1", "Friend-Like", Some("slow"), start());
    assert_eq!(session.condition(), "Friend-Like");
    assert_eq!(session.latency_tier(), Some("slow"));

    let resolution = session.resolution();
    assert_eq!(resolution.condition, ExperimentCondition::FriendLike);
    assert_eq!(resolution.latency.tier, LatencyTier::Slow);
}

#[test]
fn sessions_get_distinct_ids() {
    let a = ConversationSession::new("p1", "acceptance", None, start());
    let b = ConversationSession::new("p1", "acceptance", None, start());
    assert_ne!(a.id(), b.id());
}

#[test]
fn message_timestamps_use_microsecond_utc() {
    let session = ConversationSession::new("p1", "acceptance", None, start());
    assert_eq!(
        session.intro().iso_timestamp(),
        "2024-03-01T09:30:00.000000Z"
    );
}

#[test]
fn fresh_transcript_shows_only_intro() {
    let session = ConversationSession::new("p1", "ambiguous", None, start());
    assert_eq!(
        render_transcript(&session),
        "Partner (2024-03-01T09:30:00.000000Z): Hey, I'm Jordan. We can chat if you want, I guess."
    );
}

#[tokio::test]
async fn transcript_lists_turns_in_order() {
    let handler = TurnHandler::new(
        ScriptedProvider::replying("cool"),
        Arc::new(MemoryTurnLog::new()),
        Arc::new(ManualClock::new(start())),
    );
    let mut session = ConversationSession::new("p1", "no-such-condition", None, start());
    handler
        .handle_turn(&mut session, "hi")
        .await
        .expect("turn should run");

    let transcript = render_transcript(&session);
    let lines: Vec<&str> = transcript.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Partner (2024-03-01T09:30:00.000000Z): Hi.");
    assert_eq!(lines[1], "You (2024-03-01T09:30:00.000000Z): hi");
    assert_eq!(lines[2], "Partner (2024-03-01T09:30:01.000000Z): cool");
}
