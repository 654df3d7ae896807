//! recall-indexer - Incremental conversation index for recall
//!
//! This crate owns all **write** operations on the persisted index. The index
//! for the current session lives in `~/.claude/context-recall/index.json` by
//! default and is replaced atomically on every change.

pub mod store;
pub mod update;

pub use store::{default_index_dir, IndexStore, IndexerError};
pub use update::{update_index, IndexUpdate, UpdateOutcome};
