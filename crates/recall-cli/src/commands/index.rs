//! Index command - update the index from a transcript by hand

use std::path::Path;

use anyhow::{bail, Result};
use recall_indexer::{update_index, UpdateOutcome};

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json};

/// Session id derived from the transcript file name
pub fn session_id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

pub fn run(cli: &Cli, transcript: &Path, session_id: Option<&str>) -> Result<()> {
    if !transcript.is_file() {
        bail!("Transcript not found: {}", transcript.display());
    }

    let session_id = match session_id {
        Some(id) => id.to_string(),
        None => match session_id_from_path(transcript) {
            Some(id) => id,
            None => bail!("Cannot derive a session id from {}", transcript.display()),
        },
    };

    let config = cli.recall_config()?;
    let store = cli.store();
    let update = update_index(&store, &session_id, transcript, &config);
    let index = &update.index;

    match cli.format {
        OutputFormat::Markdown => {
            let message = match update.outcome {
                UpdateOutcome::Rebuilt => format!(
                    "Rebuilt index for {}: {} exchanges",
                    colors::colored_session(&index.session_id),
                    index.total_exchanges
                ),
                UpdateOutcome::Resumed { new_exchanges } => format!(
                    "Added {} exchange(s) to {}: {} total",
                    new_exchanges,
                    colors::colored_session(&index.session_id),
                    index.total_exchanges
                ),
                UpdateOutcome::Unchanged => format!(
                    "Index for {} is up to date: {} exchanges",
                    colors::colored_session(&index.session_id),
                    index.total_exchanges
                ),
            };
            println!("{}", colors::success(&message));
            if store.load_for_session(&session_id).as_ref() != Some(index) {
                println!(
                    "{}",
                    colors::warning(&format!("Could not write {}", store.index_path().display()))
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", cli.to_json(&json::format_update(index, update.outcome))?);
        }
    }

    Ok(())
}
