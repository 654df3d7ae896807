//! Status command - where the index lives and what it holds

use anyhow::Result;
use recall_core::{clock, query};

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, json};

pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.recall_config()?;
    let store = cli.store();
    let index_path = store.index_path();
    let index = store.load_any();

    match cli.format {
        OutputFormat::Markdown => {
            println!("{}", colors::header("Recall Index"));
            println!();
            println!(
                "  {}: {}",
                colors::label("Location"),
                index_path.display()
            );

            let Some(index) = index else {
                println!();
                println!("{}", colors::warning("No index yet. It is created by the hook on the next prompt."));
                return Ok(());
            };

            if let Ok(meta) = std::fs::metadata(&index_path) {
                println!(
                    "  {}: {}",
                    colors::label("Size"),
                    colors::format_size(meta.len())
                );
            }
            println!();
            println!(
                "  {}: {}",
                colors::label("Session"),
                colors::colored_session(&index.session_id)
            );
            println!(
                "  {}: {}",
                colors::label("Started"),
                colors::value(&clock::format_date(&index.session_start, config.time_basis))
            );
            let range = query::session_date_range(&index.exchanges, config.time_basis);
            if !range.is_empty() {
                println!("  {}: {}", colors::label("Dates"), colors::value(&range));
            }
            println!(
                "  {}: {}",
                colors::label("Exchanges"),
                colors::format_count(u64::from(index.total_exchanges))
            );
            println!(
                "  {}: {}",
                colors::label("Byte offset"),
                colors::format_count(index.byte_offset)
            );
            println!(
                "  {}: {}",
                colors::label("Transcript"),
                colors::value(&index.transcript_path)
            );
            println!(
                "  {}: {}",
                colors::label("Updated"),
                colors::value(&clock::format_date(&index.updated_at, config.time_basis))
            );
        }

        OutputFormat::Json => {
            let value = match &index {
                Some(index) => {
                    let range = query::session_date_range(&index.exchanges, config.time_basis);
                    json::format_status(index, &index_path.to_string_lossy(), &range)
                }
                None => serde_json::json!({
                    "index_path": index_path.to_string_lossy(),
                    "status": "missing",
                }),
            };
            println!("{}", cli.to_json(&value)?);
        }
    }

    Ok(())
}
