//! Show command - paginated index of exchange previews

use anyhow::Result;
use chrono::NaiveDate;
use recall_core::render;
use recall_core::{clock, parse_time_query, query, ConversationIndex, Exchange, RecallConfig};
use serde_json::json;

use crate::cli::{Cli, OutputFormat};

/// What the browser was asked to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Page(usize),
    Around(String),
    Search(String),
}

impl View {
    pub fn from_args(page: usize, around: Option<&str>, search: Option<&str>) -> View {
        match (search, around) {
            (Some(term), _) => View::Search(term.to_string()),
            (None, Some(time)) => View::Around(time.to_string()),
            (None, None) => View::Page(page),
        }
    }
}

pub fn run(cli: &Cli, view: View) -> Result<()> {
    let config = cli.recall_config()?;
    let index = cli.store().load_any();
    let today = clock::today(config.time_basis);

    match cli.format {
        OutputFormat::Markdown => println!("{}", markdown(index.as_ref(), &view, today, &config)),
        OutputFormat::Json => {
            let value = match &index {
                Some(index) => json_view(index, &view, today, &config),
                None => json!({ "error": "no conversation index found" }),
            };
            println!("{}", cli.to_json(&value)?);
        }
    }
    Ok(())
}

/// Page number for a view, `None` when a time could not be parsed
fn resolve_page(
    index: &ConversationIndex,
    view: &View,
    today: NaiveDate,
    config: &RecallConfig,
) -> Option<usize> {
    match view {
        View::Page(page) => Some(*page),
        View::Around(expression) => {
            let time = parse_time_query(expression, today)?;
            Some(query::page_for_time(
                &index.exchanges,
                &time,
                config.page_size,
                config.time_basis,
            ))
        }
        View::Search(_) => None,
    }
}

/// Render the markdown answer for a show request
pub fn markdown(
    index: Option<&ConversationIndex>,
    view: &View,
    today: NaiveDate,
    config: &RecallConfig,
) -> String {
    let Some(index) = index else {
        return render::NO_INDEX.to_string();
    };
    if index.exchanges.is_empty() {
        return render::NO_EXCHANGES.to_string();
    }

    if let View::Search(term) = view {
        return render::render_search_listing(index, term, config);
    }

    match resolve_page(index, view, today, config) {
        Some(page) => render::render_page(index, page, config),
        None => {
            let expression = match view {
                View::Around(expression) => expression.as_str(),
                _ => "",
            };
            format!(
                "*Could not parse time: {}. Try formats like '2:30pm' or '14:30'*",
                expression
            )
        }
    }
}

fn json_view(
    index: &ConversationIndex,
    view: &View,
    today: NaiveDate,
    config: &RecallConfig,
) -> serde_json::Value {
    if let View::Search(term) = view {
        let results = query::search_listing(&index.exchanges, term);
        return json!({
            "query": term,
            "matches": results.len(),
            "exchanges": results,
        });
    }

    let Some(page) = resolve_page(index, view, today, config) else {
        return json!({ "error": "could not parse time" });
    };
    let page_size = config.page_size.max(1);
    let rows: Vec<&Exchange> = index
        .exchanges
        .iter()
        .rev()
        .skip(page.saturating_sub(1) * page_size)
        .take(page_size)
        .collect();

    json!({
        "page": page,
        "total_pages": render::page_count(index, page_size),
        "total_exchanges": index.total_exchanges,
        "exchanges": rows,
    })
}
