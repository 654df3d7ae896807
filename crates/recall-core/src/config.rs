//! Tunable limits for indexing and rendering

use serde::{Deserialize, Serialize};

use crate::clock::TimeBasis;

/// Configuration shared by the indexer, the query engine and the formatter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    /// Maximum preview length in characters (ellipsis included)
    pub preview_length: usize,
    /// Cap for stored and displayed user/assistant text
    pub max_chars_per_message: usize,
    /// Character budget for a flat rendering
    pub max_total_chars: usize,
    /// Exchanges per page in the index browser
    pub page_size: usize,
    /// Number of exchanges returned around a time match
    pub around_window: usize,
    /// Maximum keyword search results
    pub search_limit: usize,
    /// Maximum rows in a search listing
    pub listing_limit: usize,
    /// How timestamps are turned into wall-clock times
    pub time_basis: TimeBasis,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            preview_length: 80,
            max_chars_per_message: 1000,
            max_total_chars: 8000,
            page_size: 20,
            around_window: 5,
            search_limit: 10,
            listing_limit: 20,
            time_basis: TimeBasis::Recorded,
        }
    }
}
