//! Core type definitions for transcripts and the conversation index

use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Accept exactly `user` or `assistant`, nothing else
    pub fn from_label(label: &str) -> Option<Role> {
        match label {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A typed content item, e.g. `{"type": "text", "text": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// One element of a structured content list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentItem {
    Bare(String),
    Typed(TypedItem),
    Other(serde_json::Value),
}

impl ContentItem {
    /// Text contributed by this item, if it is plain text
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentItem::Bare(s) => Some(s),
            ContentItem::Typed(item) if item.kind.as_deref() == Some("text") => {
                item.text.as_deref()
            }
            _ => None,
        }
    }
}

/// Message payload: a plain string or a list of content items
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    PlainText(String),
    Structured(Vec<ContentItem>),
    Other(serde_json::Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Structured(Vec::new())
    }
}

impl MessageContent {
    /// Extract text content, joining text fragments with newlines
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::PlainText(s) => s.clone(),
            MessageContent::Structured(items) => items
                .iter()
                .filter_map(ContentItem::text)
                .collect::<Vec<_>>()
                .join("\n"),
            MessageContent::Other(_) => String::new(),
        }
    }
}

/// Nested `message` object of a transcript record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: MessageContent,
}

/// A single line of the transcript, reduced to the fields recall needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptRecord {
    #[serde(rename = "type", default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub message: Option<RecordMessage>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A user or assistant turn extracted from the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// ISO-8601 timestamp as written in the transcript
    pub timestamp: String,
    /// Byte position where this message's line starts
    pub line_start: u64,
    /// Byte position just past this message's line
    pub line_end: u64,
}

/// One user turn paired with the assistant turn that immediately follows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// 1-based position within the session
    pub idx: u32,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub user_text: String,
    #[serde(default)]
    pub assistant_text: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Exchange {
    /// User text for matching and display, falling back to the preview
    pub fn user_text_or_preview(&self) -> &str {
        if self.user_text.is_empty() {
            &self.preview
        } else {
            &self.user_text
        }
    }
}

/// Persisted index of all exchanges in one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationIndex {
    pub session_id: String,
    #[serde(default)]
    pub session_start: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub total_exchanges: u32,
    #[serde(default)]
    pub transcript_path: String,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
    /// Last transcript byte position fully consumed by indexing
    #[serde(default, alias = "_byte_offset")]
    pub byte_offset: u64,
}

impl ConversationIndex {
    /// Look up an exchange by its 1-based index
    pub fn get(&self, idx: u32) -> Option<&Exchange> {
        let pos = idx.checked_sub(1)? as usize;
        self.exchanges.get(pos).filter(|ex| ex.idx == idx)
    }

    /// Resolve indices against the exchange list, ascending by `idx`
    pub fn select(&self, indices: &[u32]) -> Vec<&Exchange> {
        let mut selected: Vec<&Exchange> = self
            .exchanges
            .iter()
            .filter(|ex| indices.contains(&ex.idx))
            .collect();
        selected.sort_by_key(|ex| ex.idx);
        selected
    }

    /// Append freshly built exchanges and keep `total_exchanges` in step
    pub fn append(&mut self, exchanges: Vec<Exchange>) {
        self.exchanges.extend(exchanges);
        self.total_exchanges = self.exchanges.len() as u32;
    }

    /// Whether indices are exactly `1..=total_exchanges`
    pub fn is_contiguous(&self) -> bool {
        self.total_exchanges as usize == self.exchanges.len()
            && self
                .exchanges
                .iter()
                .enumerate()
                .all(|(i, ex)| ex.idx as usize == i + 1)
    }
}
