//! Fetch command - full content of recalled exchanges

use anyhow::Result;
use chrono::NaiveDate;
use recall_core::render::{self, emphasis};
use recall_core::{clock, query, ConversationIndex, QueryError, RecallConfig, RecallQuery};

use crate::cli::{Cli, OutputFormat};
use crate::output::json;

pub fn run(cli: &Cli, args: &[String]) -> Result<()> {
    let config = cli.recall_config()?;
    let index = cli.store().load_any();
    let today = clock::today(config.time_basis);

    match cli.format {
        OutputFormat::Markdown => println!("{}", markdown(index.as_ref(), args, today, &config)),
        OutputFormat::Json => {
            let value = match (&index, RecallQuery::parse(args, today)) {
                (Some(index), Ok(query)) => {
                    let outcome = query::execute(&query, &index.exchanges, &config);
                    json::format_exchanges(
                        &query.label(),
                        &index.select(&outcome.indices),
                        outcome.search.as_ref(),
                    )
                }
                (None, _) => serde_json::json!({ "error": "no conversation index found" }),
                (_, Err(e)) => serde_json::json!({ "error": e.to_string() }),
            };
            println!("{}", cli.to_json(&value)?);
        }
    }
    Ok(())
}

/// Render the markdown answer for a fetch request
pub fn markdown(
    index: Option<&ConversationIndex>,
    args: &[String],
    today: NaiveDate,
    config: &RecallConfig,
) -> String {
    let Some(index) = index else {
        return render::NO_INDEX.to_string();
    };
    if index.total_exchanges == 0 {
        return render::NO_EXCHANGES.to_string();
    }

    match RecallQuery::parse(args, today) {
        Ok(query) => render::render_fetch(index, &query, config),
        Err(QueryError::UnknownVerb(verb)) => {
            format!("*Unknown command: '{}'*\n\n{}", verb, render::usage())
        }
        Err(e) => emphasis(&e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::Exchange;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    fn sample_index() -> ConversationIndex {
        let mut index = ConversationIndex {
            session_id: "s1".to_string(),
            session_start: "2025-01-05T09:00:00Z".to_string(),
            updated_at: String::new(),
            total_exchanges: 0,
            transcript_path: String::new(),
            exchanges: Vec::new(),
            byte_offset: 0,
        };
        index.append(
            (1..=3)
                .map(|i| Exchange {
                    idx: i,
                    preview: format!("Question {}", i),
                    user_text: format!("Question {}", i),
                    assistant_text: format!("Answer {}", i),
                    timestamp: format!("2025-01-05T1{}:00:00Z", i),
                })
                .collect(),
        );
        index
    }

    #[test]
    fn test_no_index() {
        let out = markdown(None, &[], today(), &RecallConfig::default());
        assert!(out.starts_with("*No conversation index found."));
    }

    #[test]
    fn test_default_is_last_five() {
        let index = sample_index();
        let out = markdown(Some(&index), &[], today(), &RecallConfig::default());
        assert!(out.starts_with("*Fetched 3 exchange(s) (last5):*"));
    }

    #[test]
    fn test_invalid_last_n() {
        let index = sample_index();
        let out = markdown(Some(&index), &args(&["lastx"]), today(), &RecallConfig::default());
        assert_eq!(out, "*Invalid format: lastx. Try 'last5' or 'last10'.*");
    }

    #[test]
    fn test_unknown_verb_shows_usage() {
        let index = sample_index();
        let out = markdown(Some(&index), &args(&["summon"]), today(), &RecallConfig::default());
        assert!(out.starts_with("*Unknown command: 'summon'*\n\n**Usage:**"));
    }

    #[test]
    fn test_around_time() {
        let index = sample_index();
        let out = markdown(
            Some(&index),
            &args(&["around", "12pm"]),
            today(),
            &RecallConfig::default(),
        );
        assert!(out.starts_with("*Fetched 3 exchange(s) (around 12pm):*"));
    }
}
