//! Pairing messages into indexed exchanges

use crate::config::RecallConfig;
use crate::types::{Exchange, Message, Role};

/// Marker appended to stored text that was cut at the size cap
pub const TRUNCATION_MARKER: &str = "\n\n[...truncated...]";

/// Exchanges built from a message run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    pub exchanges: Vec<Exchange>,
    /// Line start of a trailing user message still waiting for a reply
    pub pending_user_offset: Option<u64>,
}

/// Build exchanges from messages, numbering from `start_idx`
///
/// Only a user message immediately followed by an assistant message forms
/// an exchange. A user message followed by another user message is skipped.
pub fn build_exchanges(messages: &[Message], start_idx: u32, config: &RecallConfig) -> BuildOutcome {
    let mut exchanges = Vec::new();
    let mut next_idx = start_idx;
    let mut i = 0;

    while i < messages.len() {
        let current = &messages[i];
        match messages.get(i + 1) {
            Some(reply) if current.role == Role::User && reply.role == Role::Assistant => {
                exchanges.push(Exchange {
                    idx: next_idx,
                    preview: make_preview(&current.text, config.preview_length),
                    user_text: truncate_text(&current.text, config.max_chars_per_message),
                    assistant_text: truncate_text(&reply.text, config.max_chars_per_message),
                    timestamp: current.timestamp.clone(),
                });
                next_idx += 1;
                i += 2;
            }
            _ => i += 1,
        }
    }

    let pending_user_offset = messages
        .last()
        .filter(|m| m.role == Role::User)
        .map(|m| m.line_start);

    BuildOutcome {
        exchanges,
        pending_user_offset,
    }
}

/// Collapse whitespace and cut to `max_len` characters, ellipsis included
pub fn make_preview(text: &str, max_len: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_len {
        return collapsed;
    }
    let kept: String = collapsed.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Cut text to `max_chars` characters and mark the cut
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}{}", &text[..end], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
