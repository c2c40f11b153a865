//! Conversation turn handling.
//!
//! [`TurnHandler::handle_turn`] runs one participant message end to end:
//!
//! 1. record the user message
//! 2. resolve the session's condition
//! 3. wait through the latency profile, toggling the typing indicator
//! 4. ask the provider for a reply in the persona's voice
//! 5. record the partner message
//! 6. append a [`LogRecord`]
//!
//! Provider failures never escape a turn. The partner message becomes a
//! placeholder and the turn is still recorded and logged.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::experiment::{LatencyProfile, Persona};
use crate::providers::{CompletionRequest, LlmProvider, Message, ProviderError};
use crate::session::{format_timestamp, ConversationSession, Speaker};
use crate::turn_log::{LogRecord, TurnLog};

pub mod typing;

pub use typing::{NoTypingIndicator, TypingIndicator};

/// Partner text when no API key is available.
pub const NO_API_KEY_REPLY: &str = "[No API key found]";

/// Partner text when generation failed, timed out, or came back empty.
pub const NO_RESPONSE_REPLY: &str = "[No response]";

/// How the partner reply was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// The provider produced text.
    Generated,
    /// No credential was available; the reply is [`NO_API_KEY_REPLY`].
    MissingCredential,
    /// The call failed, timed out, or returned nothing; the reply is
    /// [`NO_RESPONSE_REPLY`].
    GenerationFailed,
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Partner text appended to the session.
    pub reply: String,
    /// Where the reply came from.
    pub status: ReplyStatus,
    /// Clock time between the user message and the reply.
    pub elapsed: Duration,
    /// Whether the turn record reached the log.
    pub logged: bool,
}

/// Errors that prevent a turn from starting.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// The message was empty or whitespace only.
    #[error("message is empty")]
    EmptyMessage,
}

/// Runs turns against a provider, a turn log, and a clock.
pub struct TurnHandler {
    provider: Arc<dyn LlmProvider>,
    log: Arc<dyn TurnLog>,
    clock: Arc<dyn Clock>,
    typing: Arc<dyn TypingIndicator>,
    rng: Mutex<StdRng>,
    generation_timeout: Option<Duration>,
}

impl TurnHandler {
    /// Create a handler with no typing indicator and no generation timeout.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        log: Arc<dyn TurnLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            log,
            clock,
            typing: Arc::new(NoTypingIndicator),
            rng: Mutex::new(StdRng::from_entropy()),
            generation_timeout: None,
        }
    }

    /// Send typing signals to `typing`.
    #[must_use]
    pub fn with_typing_indicator(mut self, typing: Arc<dyn TypingIndicator>) -> Self {
        self.typing = typing;
        self
    }

    /// Bound each provider call; `None` waits indefinitely.
    #[must_use]
    pub fn with_generation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Make delay sampling reproducible.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Run one turn and return the partner reply.
    ///
    /// Exactly one user message and one partner message are appended to
    /// `session`, in that order, whatever the provider does.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::EmptyMessage`] for blank input, before the session
    /// is modified.
    pub async fn handle_turn(
        &self,
        session: &mut ConversationSession,
        user_text: &str,
    ) -> Result<TurnOutcome, TurnError> {
        if user_text.trim().is_empty() {
            return Err(TurnError::EmptyMessage);
        }

        let user_at = self.clock.now();
        session.push(Speaker::User, user_text.to_owned(), user_at);

        let resolution = session.resolution();
        info!(
            session_id = %session.id(),
            pid = session.participant_id(),
            condition = %resolution.condition,
            latency = %resolution.latency.tier,
            "turn started"
        );

        self.simulate_latency(&resolution.latency).await;

        let (reply, status) = self.generate(resolution.persona, user_text).await;
        let reply_at = self.clock.now();
        session.push(Speaker::Partner, reply.clone(), reply_at);

        let record = LogRecord {
            pid: session.participant_id().to_owned(),
            user_time: format_timestamp(user_at),
            user_text: user_text.to_owned(),
            bot_time: format_timestamp(reply_at),
            bot_text: reply.clone(),
            condition: session.condition().to_owned(),
            latency: resolution.latency.tier.tag().to_owned(),
        };
        let logged = match self.log.append(&record) {
            Ok(()) => true,
            Err(e) => {
                warn!(session_id = %session.id(), error = %e, "failed to append turn record");
                false
            }
        };

        let elapsed = reply_at
            .signed_duration_since(user_at)
            .to_std()
            .unwrap_or_default();
        info!(
            session_id = %session.id(),
            ?status,
            elapsed_ms = millis(elapsed),
            logged,
            "turn completed"
        );

        Ok(TurnOutcome {
            reply,
            status,
            elapsed,
            logged,
        })
    }

    async fn simulate_latency(&self, profile: &LatencyProfile) {
        let waits = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            profile.sample(&mut *rng)
        };

        for (index, (phase, wait)) in profile.phases.iter().zip(waits).enumerate() {
            debug!(
                phase = index,
                wait_ms = millis(wait),
                typing = phase.shows_typing,
                "latency phase"
            );
            if phase.shows_typing {
                self.typing.set_typing(true);
            }
            self.clock.sleep(wait).await;
            if phase.shows_typing {
                self.typing.set_typing(false);
            }
        }
    }

    async fn generate(&self, persona: &Persona, user_text: &str) -> (String, ReplyStatus) {
        let request = CompletionRequest {
            system: Some(persona.system_prompt.to_owned()),
            messages: vec![Message::user(user_text)],
            temperature: Some(persona.temperature),
            max_tokens: Some(persona.max_output_tokens),
        };

        let call = self.provider.complete(request);
        let result = match self.generation_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        model = self.provider.model_id(),
                        timeout_ms = millis(limit),
                        "generation timed out"
                    );
                    return (NO_RESPONSE_REPLY.to_owned(), ReplyStatus::GenerationFailed);
                }
            },
            None => call.await,
        };

        match result {
            Ok(response) => {
                let text = response.text.trim();
                if text.is_empty() {
                    warn!(model = %response.model, "generation returned no text");
                    (NO_RESPONSE_REPLY.to_owned(), ReplyStatus::GenerationFailed)
                } else {
                    debug!(
                        model = %response.model,
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        "generation succeeded"
                    );
                    (text.to_owned(), ReplyStatus::Generated)
                }
            }
            Err(ProviderError::MissingCredential { key }) => {
                warn!(key = %key, "no API key available");
                (NO_API_KEY_REPLY.to_owned(), ReplyStatus::MissingCredential)
            }
            Err(e) => {
                warn!(model = self.provider.model_id(), error = %e, "generation failed");
                (NO_RESPONSE_REPLY.to_owned(), ReplyStatus::GenerationFailed)
            }
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
