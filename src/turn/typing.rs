//! Typing indicator hook for the presentation layer.

/// Receives typing on/off signals while latency phases run.
pub trait TypingIndicator: Send + Sync {
    /// `true` when the partner starts "typing", `false` when it stops.
    fn set_typing(&self, typing: bool);
}

/// Indicator that ignores every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTypingIndicator;

impl TypingIndicator for NoTypingIndicator {
    fn set_typing(&self, _typing: bool) {}
}
