//! Token-bounded views of conversation history.
//!
//! Trimming never touches the stored history. It produces the (shorter)
//! sequence that is actually sent to the model on one call.

use std::sync::Arc;

use parley_core::{ChatMessage, Role};
use tracing::debug;

/// Measures how many tokens a message costs.
pub trait TokenCounter: Send + Sync {
    fn count(&self, message: &ChatMessage) -> usize;

    fn count_all(&self, messages: &[ChatMessage]) -> usize {
        messages.iter().map(|m| self.count(m)).sum()
    }
}

/// Character-based estimate: roughly four characters per token plus a fixed
/// per-message overhead for role and framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproxTokenCounter {
    pub chars_per_token: usize,
    pub tokens_per_message: usize,
}

impl Default for ApproxTokenCounter {
    fn default() -> Self {
        Self {
            chars_per_token: 4,
            tokens_per_message: 3,
        }
    }
}

impl TokenCounter for ApproxTokenCounter {
    fn count(&self, message: &ChatMessage) -> usize {
        let chars = message.content.chars().count();
        chars.div_ceil(self.chars_per_token.max(1)) + self.tokens_per_message
    }
}

/// Counts every message as one token, turning the budget into a message limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageCounter;

impl TokenCounter for MessageCounter {
    fn count(&self, _message: &ChatMessage) -> usize {
        1
    }
}

/// Which end of the history to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimStrategy {
    /// Keep the most recent messages.
    Last,
    /// Keep the oldest messages.
    First,
}

/// Configuration for trimming a message sequence to a token budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimPolicy {
    /// Token budget for the returned sequence.
    pub max_tokens: usize,
    pub strategy: TrimStrategy,
    /// Always keep a leading system message.
    pub include_system: bool,
    /// Allow cutting the content of the first message that does not fit.
    pub allow_partial: bool,
    /// Drop leading window messages until one with this role.
    pub start_on: Option<Role>,
}

impl Default for TrimPolicy {
    fn default() -> Self {
        Self {
            max_tokens: 65,
            strategy: TrimStrategy::Last,
            include_system: true,
            allow_partial: false,
            start_on: Some(Role::User),
        }
    }
}

impl TrimPolicy {
    #[must_use]
    pub const fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }

    #[must_use]
    pub const fn with_strategy(mut self, strategy: TrimStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub const fn include_system(mut self, include: bool) -> Self {
        self.include_system = include;
        self
    }

    #[must_use]
    pub const fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    #[must_use]
    pub const fn start_on(mut self, role: Option<Role>) -> Self {
        self.start_on = role;
        self
    }
}

/// Reduce `messages` to fit `policy.max_tokens` as measured by `counter`.
///
/// With `include_system`, a leading system message is always kept and its
/// cost is taken from the budget first; if it alone exceeds the budget the
/// result is just that message. Whole messages are then taken from the
/// chosen end until the next one does not fit.
#[must_use]
pub fn trim_messages(
    messages: &[ChatMessage],
    policy: &TrimPolicy,
    counter: &dyn TokenCounter,
) -> Vec<ChatMessage> {
    let (system, rest) = match messages.split_first() {
        Some((first, rest)) if policy.include_system && first.role == Role::System => {
            (Some(first), rest)
        }
        _ => (None, messages),
    };

    let budget = system.map_or(policy.max_tokens, |s| {
        policy.max_tokens.saturating_sub(counter.count(s))
    });

    let mut window = match policy.strategy {
        TrimStrategy::Last => {
            let mut picked = take_within(rest.iter().rev(), budget, counter, policy, Keep::Tail);
            picked.reverse();
            picked
        }
        TrimStrategy::First => take_within(rest.iter(), budget, counter, policy, Keep::Head),
    };

    if let Some(role) = policy.start_on {
        let skip = window
            .iter()
            .position(|m| m.role == role)
            .unwrap_or(window.len());
        window.drain(..skip);
    }

    let trimmed: Vec<ChatMessage> = system.cloned().into_iter().chain(window).collect();
    debug!(
        "Trimmed history: {} -> {} messages ({} token budget)",
        messages.len(),
        trimmed.len(),
        policy.max_tokens
    );
    trimmed
}

#[derive(Debug, Clone, Copy)]
enum Keep {
    Head,
    Tail,
}

fn take_within<'a>(
    candidates: impl Iterator<Item = &'a ChatMessage>,
    budget: usize,
    counter: &dyn TokenCounter,
    policy: &TrimPolicy,
    keep: Keep,
) -> Vec<ChatMessage> {
    let mut used = 0;
    let mut picked = Vec::new();

    for message in candidates {
        let cost = counter.count(message);
        if used + cost <= budget {
            used += cost;
            picked.push(message.clone());
            continue;
        }
        if policy.allow_partial {
            picked.extend(partial(message, budget - used, counter, keep));
        }
        break;
    }

    picked
}

/// Longest word-aligned head or tail of `message` that fits in `remaining`.
fn partial(
    message: &ChatMessage,
    remaining: usize,
    counter: &dyn TokenCounter,
    keep: Keep,
) -> Option<ChatMessage> {
    let words: Vec<&str> = message.content.split_whitespace().collect();

    (1..words.len()).rev().find_map(|n| {
        let content = match keep {
            Keep::Head => words[..n].join(" "),
            Keep::Tail => words[words.len() - n..].join(" "),
        };
        let candidate = ChatMessage::new(message.role, content);
        (counter.count(&candidate) <= remaining).then_some(candidate)
    })
}

/// A trim policy bundled with the counter that measures it.
#[derive(Clone)]
pub struct MessageTrimmer {
    policy: TrimPolicy,
    counter: Arc<dyn TokenCounter>,
}

impl MessageTrimmer {
    #[must_use]
    pub fn new(policy: TrimPolicy, counter: Arc<dyn TokenCounter>) -> Self {
        Self { policy, counter }
    }

    #[must_use]
    pub fn trim(&self, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        trim_messages(messages, &self.policy, self.counter.as_ref())
    }

    #[must_use]
    pub const fn policy(&self) -> &TrimPolicy {
        &self.policy
    }
}

impl std::fmt::Debug for MessageTrimmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageTrimmer")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
