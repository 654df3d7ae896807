//! On-disk storage of the per-session conversation index

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use recall_core::ConversationIndex;
use thiserror::Error;

/// Index file name inside the storage directory
pub const INDEX_FILE: &str = "index.json";

/// Append-only log of observed `/recall` prompts
pub const EVENT_LOG_FILE: &str = "recall-events.log";

/// Pause before the single read retry
const RETRY_DELAY: Duration = Duration::from_millis(50);

/// Run `attempt`, and once more after [`RETRY_DELAY`] if it fails
fn retry_once<T, F>(mut attempt: F) -> Result<T, IndexerError>
where
    F: FnMut() -> Result<T, IndexerError>,
{
    attempt().or_else(|first| {
        tracing::debug!(error = %first, "index read failed, retrying");
        thread::sleep(RETRY_DELAY);
        attempt()
    })
}

/// Index store errors
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to persist index to {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Default storage directory, `~/.claude/context-recall`
pub fn default_index_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("~"))
        .join(".claude")
        .join("context-recall")
}

/// Reads and replaces the persisted index inside one directory
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at [`default_index_dir`]
    pub fn open_default() -> Self {
        Self::new(default_index_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn event_log_path(&self) -> PathBuf {
        self.dir.join(EVENT_LOG_FILE)
    }

    fn read(&self) -> Result<ConversationIndex, IndexerError> {
        let raw = fs::read(self.index_path())?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Load whatever index is stored, regardless of session
    ///
    /// A failed read is retried once in case a writer was mid-replace.
    pub fn load_any(&self) -> Option<ConversationIndex> {
        if !self.index_path().exists() {
            return None;
        }

        match retry_once(|| self.read()) {
            Ok(index) => Some(index),
            Err(e) => {
                tracing::warn!(path = %self.index_path().display(), error = %e, "index unreadable");
                None
            }
        }
    }

    /// Load the stored index only if it belongs to `session_id`
    pub fn load_for_session(&self, session_id: &str) -> Option<ConversationIndex> {
        self.load_any().filter(|index| {
            let matches = index.session_id == session_id;
            if !matches {
                tracing::debug!(
                    stored = %index.session_id,
                    requested = session_id,
                    "index belongs to another session"
                );
            }
            matches
        })
    }

    /// Replace the stored index atomically
    ///
    /// The JSON is written to a sibling temp file which is then renamed over
    /// the index, so readers see either the old or the new file.
    pub fn save(&self, index: &ConversationIndex) -> Result<(), IndexerError> {
        let persist = |source: std::io::Error| IndexerError::Persist {
            path: self.index_path(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(persist)?;

        let json = serde_json::to_string_pretty(index)?;
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", INDEX_FILE, std::process::id()));

        fs::write(&tmp, json).map_err(persist)?;
        if let Err(e) = fs::rename(&tmp, self.index_path()) {
            let _ = fs::remove_file(&tmp);
            return Err(persist(e));
        }
        Ok(())
    }

    /// Append a line recording that recall was triggered at `exchange_count`
    pub fn log_recall_event(&self, session_id: &str, exchange_count: u32) -> Result<(), IndexerError> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.event_log_path())?;
        writeln!(
            file,
            "{} | session={} | exchanges={} | CONTEXT_RECALL_TRIGGERED",
            Utc::now().to_rfc3339(),
            session_id,
            exchange_count
        )?;
        Ok(())
    }
}
