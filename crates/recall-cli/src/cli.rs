//! CLI argument definitions

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use recall_core::RecallConfig;
use recall_indexer::IndexStore;
use std::path::{Path, PathBuf};

/// Recall earlier exchanges of a Claude Code conversation
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(author = "Claude Code SDK")]
#[command(version)]
#[command(about = "Recall earlier exchanges of a Claude Code conversation")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding index.json (default: ~/.claude/context-recall)
    #[arg(long, global = true, env = "RECALL_INDEX_DIR")]
    pub index_dir: Option<PathBuf>,

    /// JSON file overriding limits such as page size or preview length
    #[arg(long, global = true, env = "RECALL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "markdown")]
    pub format: OutputFormat,

    /// Indent JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable color output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Index store for the configured or default directory
    pub fn store(&self) -> IndexStore {
        match &self.index_dir {
            Some(dir) => IndexStore::new(dir),
            None => IndexStore::open_default(),
        }
    }

    /// Load the recall configuration, falling back to defaults
    pub fn recall_config(&self) -> Result<RecallConfig> {
        match &self.config {
            Some(path) => load_config(path),
            None => Ok(RecallConfig::default()),
        }
    }

    /// Check if colors should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && atty::is(atty::Stream::Stdout)
    }

    /// Serialize a value according to `--pretty`
    pub fn to_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}

/// Read a JSON config file; missing fields take their defaults
pub fn load_config(path: &Path) -> Result<RecallConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
}

/// Output format for commands
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown for recall output, styled text for status
    #[default]
    Markdown,
    /// JSON output
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run as the UserPromptSubmit hook: update the index from stdin input
    Hook,

    /// Fetch full exchanges: lastN, around <time>, or search <term>
    Fetch {
        /// Query words, e.g. `last10`, `around jan 5 2pm`, `search auth flow`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Browse the paginated index of exchange previews
    Show {
        /// Page number, 1 being the most recent
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Jump to the page holding the exchange closest to this time
        #[arg(long)]
        around: Option<String>,

        /// List exchanges containing a keyword
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Update the index from a transcript file
    Index {
        /// Path to the session transcript (JSONL)
        transcript: PathBuf,

        /// Session id (default: transcript file name without extension)
        #[arg(long)]
        session_id: Option<String>,
    },

    /// Show where the index lives and what it holds
    Status,
}
