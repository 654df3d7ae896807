//! JSON output formatting

use recall_core::{ConversationIndex, Exchange, SearchResult};
use recall_indexer::UpdateOutcome;
use serde_json::{json, Value};

/// Selected exchanges with the query that produced them
///
/// Keyword searches also report how many exchanges matched before capping.
pub fn format_exchanges(
    query: &str,
    exchanges: &[&Exchange],
    search: Option<&SearchResult>,
) -> Value {
    let mut value = json!({
        "query": query,
        "count": exchanges.len(),
        "exchanges": exchanges,
    });
    if let Some(search) = search {
        value["total_matches"] = json!(search.total_matches);
        value["truncated"] = json!(search.truncated);
    }
    value
}

/// Summary of the stored index, without the exchanges themselves
pub fn format_status(index: &ConversationIndex, index_path: &str, date_range: &str) -> Value {
    json!({
        "index_path": index_path,
        "session_id": index.session_id,
        "session_start": index.session_start,
        "updated_at": index.updated_at,
        "total_exchanges": index.total_exchanges,
        "transcript_path": index.transcript_path,
        "byte_offset": index.byte_offset,
        "date_range": date_range,
    })
}

/// Result of a manual index update
pub fn format_update(index: &ConversationIndex, outcome: UpdateOutcome) -> Value {
    let (name, new_exchanges) = match outcome {
        UpdateOutcome::Rebuilt => ("rebuilt", index.total_exchanges as usize),
        UpdateOutcome::Resumed { new_exchanges } => ("resumed", new_exchanges),
        UpdateOutcome::Unchanged => ("unchanged", 0),
    };
    json!({
        "session_id": index.session_id,
        "outcome": name,
        "new_exchanges": new_exchanges,
        "total_exchanges": index.total_exchanges,
        "byte_offset": index.byte_offset,
    })
}
