//! recall-core - Core types and query logic for conversation recall
//!
//! This crate parses Claude Code session transcripts into indexed
//! user/assistant exchanges and answers recall queries (recency, time
//! proximity, keyword search) against the resulting index.

pub mod builder;
pub mod clock;
pub mod config;
pub mod parser;
pub mod query;
pub mod render;
pub mod time_query;
pub mod types;

pub use types::*;
pub use builder::{build_exchanges, BuildOutcome};
pub use clock::TimeBasis;
pub use config::RecallConfig;
pub use parser::{parse_transcript_from, transcript_size, ParseOutcome};
pub use query::{QueryError, RecallQuery, SearchResult};
pub use time_query::{parse_time_query, TimeQuery};
