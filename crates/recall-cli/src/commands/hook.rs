//! Hook command - keep the index current on every submitted prompt
//!
//! Reads the UserPromptSubmit payload from stdin and always answers with a
//! JSON object on stdout, even when something goes wrong.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use recall_core::RecallConfig;
use recall_indexer::{update_index, IndexStore};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cli::Cli;

/// Fields of the hook payload used here; everything else is ignored
#[derive(Debug, Deserialize)]
struct HookInput {
    #[serde(default = "unknown_session")]
    session_id: String,
    #[serde(default)]
    transcript_path: String,
    #[serde(default)]
    user_prompt: String,
}

fn unknown_session() -> String {
    "unknown".to_string()
}

fn is_recall_prompt(prompt: &str) -> bool {
    prompt.trim().to_lowercase().starts_with("/recall")
}

pub fn run(cli: &Cli) -> Result<()> {
    let config = config_or_default(cli.recall_config());
    let response = match read_stdin().and_then(|raw| respond(&raw, &cli.store(), &config)) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "hook failed");
            json!({ "systemMessage": format!("[context-recall] Hook error (non-blocking): {:#}", e) })
        }
    };

    println!("{}", response);
    Ok(())
}

/// An unreadable config must not stop the index from being updated
fn config_or_default(config: Result<RecallConfig>) -> RecallConfig {
    config.unwrap_or_else(|e| {
        tracing::warn!("config unreadable, using defaults: {:#}", e);
        RecallConfig::default()
    })
}

fn read_stdin() -> Result<String> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("Failed to read hook input")?;
    Ok(raw)
}

/// Update the index for the payload's session and build the hook response
pub fn respond(raw: &str, store: &IndexStore, config: &RecallConfig) -> Result<Value> {
    let input: HookInput = serde_json::from_str(raw).context("Invalid hook input")?;

    let update = update_index(
        store,
        &input.session_id,
        Path::new(&input.transcript_path),
        config,
    );
    let total = update.index.total_exchanges;

    if !is_recall_prompt(&input.user_prompt) {
        return Ok(json!({}));
    }

    tracing::info!(session_id = %input.session_id, exchange = total, "context recall triggered");
    if let Err(e) = store.log_recall_event(&input.session_id, total) {
        tracing::warn!(error = %e, "could not append recall event");
    }

    Ok(json!({
        "systemMessage": format!("[Observability] Context recall logged at exchange #{}", total)
    }))
}
