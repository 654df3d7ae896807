//! Incremental index maintenance
//!
//! Each call either resumes from the stored byte offset, leaves the index
//! alone when the transcript has not grown, or rebuilds it from scratch when
//! no usable index exists for the session.

use std::path::Path;

use chrono::Utc;
use recall_core::{build_exchanges, parse_transcript_from, transcript_size, ConversationIndex, RecallConfig};

use crate::store::IndexStore;

/// What an update did to the stored index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Built from offset 0 (new session, missing or unusable index)
    Rebuilt,
    /// Resumed from the stored offset
    Resumed { new_exchanges: usize },
    /// Transcript has not grown since the last update
    Unchanged,
}

/// The in-memory index after an update, whether or not it was persisted
#[derive(Debug, Clone)]
pub struct IndexUpdate {
    pub index: ConversationIndex,
    pub outcome: UpdateOutcome,
}

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Bring the stored index for `session_id` up to date with the transcript
///
/// Persistence failures are logged and otherwise ignored; the returned index
/// is still valid for the rest of the invocation.
pub fn update_index(
    store: &IndexStore,
    session_id: &str,
    transcript_path: &Path,
    config: &RecallConfig,
) -> IndexUpdate {
    match store.load_for_session(session_id) {
        Some(existing) if existing.is_contiguous() => resume(store, existing, transcript_path, config),
        Some(_) => {
            tracing::warn!(session_id, "stored index has gaps in exchange numbering, rebuilding");
            rebuild(store, session_id, transcript_path, config)
        }
        None => rebuild(store, session_id, transcript_path, config),
    }
}

fn resume(
    store: &IndexStore,
    mut index: ConversationIndex,
    transcript_path: &Path,
    config: &RecallConfig,
) -> IndexUpdate {
    let size = transcript_size(transcript_path);
    if size <= index.byte_offset {
        tracing::debug!(size, offset = index.byte_offset, "transcript has not grown");
        return IndexUpdate {
            index,
            outcome: UpdateOutcome::Unchanged,
        };
    }

    let parsed = parse_transcript_from(transcript_path, index.byte_offset);
    let built = build_exchanges(&parsed.messages, index.total_exchanges + 1, config);
    let new_offset = built.pending_user_offset.unwrap_or(parsed.offset);
    let new_exchanges = built.exchanges.len();

    if new_exchanges == 0 && new_offset == index.byte_offset {
        return IndexUpdate {
            index,
            outcome: UpdateOutcome::Unchanged,
        };
    }

    index.append(built.exchanges);
    index.byte_offset = new_offset;
    index.updated_at = now_iso();
    index.transcript_path = transcript_path.display().to_string();

    tracing::info!(
        session_id = %index.session_id,
        new_exchanges,
        total = index.total_exchanges,
        offset = new_offset,
        "index resumed"
    );
    persist(store, &index);

    IndexUpdate {
        index,
        outcome: UpdateOutcome::Resumed { new_exchanges },
    }
}

fn rebuild(
    store: &IndexStore,
    session_id: &str,
    transcript_path: &Path,
    config: &RecallConfig,
) -> IndexUpdate {
    let parsed = parse_transcript_from(transcript_path, 0);
    let built = build_exchanges(&parsed.messages, 1, config);
    let now = now_iso();

    let session_start = built
        .exchanges
        .first()
        .map(|ex| ex.timestamp.clone())
        .filter(|ts| !ts.is_empty())
        .unwrap_or_else(|| now.clone());

    let mut index = ConversationIndex {
        session_id: session_id.to_string(),
        session_start,
        updated_at: now,
        total_exchanges: 0,
        transcript_path: transcript_path.display().to_string(),
        exchanges: Vec::new(),
        byte_offset: built.pending_user_offset.unwrap_or(parsed.offset),
    };
    index.append(built.exchanges);

    tracing::info!(
        session_id,
        total = index.total_exchanges,
        offset = index.byte_offset,
        "index rebuilt"
    );
    persist(store, &index);

    IndexUpdate {
        index,
        outcome: UpdateOutcome::Rebuilt,
    }
}

fn persist(store: &IndexStore, index: &ConversationIndex) {
    if let Err(e) = store.save(index) {
        tracing::warn!(error = %e, "could not persist index, continuing with in-memory copy");
    }
}
