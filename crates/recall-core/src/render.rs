//! Markdown rendering of recalled exchanges and the paginated index

use chrono::NaiveDate;

use crate::builder::truncate_text;
use crate::clock::{self, TimeBasis};
use crate::config::RecallConfig;
use crate::query::{self, RecallQuery};
use crate::types::{ConversationIndex, Exchange};

pub const NO_INDEX: &str = "*No conversation index found. The recall hook may not be active yet.*\n*Try sending another message first, then run /recall again.*";

pub const NO_EXCHANGES: &str = "*No exchanges found in the current session.*";

const SEARCH_HINT: &str = "*Search looks in both user prompts AND assistant responses.*";

/// Help text shown for unrecognized recall verbs
pub fn usage() -> String {
    [
        "**Usage:**",
        "- `/recall last5` - Recall last 5 exchanges",
        "- `/recall last10` - Recall last 10 exchanges",
        "- `/recall around 2pm` - Recall exchanges around 2pm",
        "- `/recall around \"jan 5 2pm\"` - Recall exchanges around 2pm on Jan 5",
        "- `/recall search keyword` - Search for exchanges containing keyword",
        "",
        "Or just run `/recall` for the interactive menu.",
    ]
    .join("\n")
}

/// Wrap a message in markdown emphasis
pub fn emphasis(message: &str) -> String {
    format!("*{}*", message)
}

/// Bracketed time label for an exchange header, e.g. ` [Jan 5 2:30 pm]`
fn time_label(timestamp: &str, basis: TimeBasis) -> String {
    let time = clock::format_time(timestamp, basis);
    let date = clock::format_short_date(timestamp, basis);
    match (date.is_empty(), time.is_empty()) {
        (false, false) => format!(" [{} {}]", date, time),
        (_, false) => format!(" [{}]", time),
        _ => String::new(),
    }
}

/// Render exchanges as full labeled blocks within the character budget
pub fn render_exchanges(exchanges: &[&Exchange], config: &RecallConfig) -> String {
    if exchanges.is_empty() {
        return "*No exchanges found.*".to_string();
    }

    let mut parts: Vec<String> = Vec::new();
    let mut total_chars = 0usize;

    for (shown, ex) in exchanges.iter().enumerate() {
        let user_text = truncate_text(ex.user_text_or_preview(), config.max_chars_per_message);
        let assistant_text = truncate_text(&ex.assistant_text, config.max_chars_per_message);

        let exchange_chars = user_text.chars().count() + assistant_text.chars().count();
        if total_chars + exchange_chars > config.max_total_chars {
            parts.push(format!(
                "\n*[Reached size limit - {} more exchanges not shown]*",
                exchanges.len() - shown
            ));
            break;
        }

        parts.push(format!(
            "### Exchange #{}{}",
            ex.idx,
            time_label(&ex.timestamp, config.time_basis)
        ));
        parts.push(String::new());
        parts.push(format!("**User:**\n{}", user_text));
        parts.push(String::new());
        if !assistant_text.is_empty() {
            parts.push(format!("**Assistant:**\n{}", assistant_text));
            parts.push(String::new());
        }
        parts.push("---".to_string());
        parts.push(String::new());

        total_chars += exchange_chars;
    }

    parts.join("\n")
}

/// Run a recall query against the index and render the complete response
pub fn render_fetch(
    index: &ConversationIndex,
    query: &RecallQuery,
    config: &RecallConfig,
) -> String {
    let exchanges = &index.exchanges;
    if index.total_exchanges == 0 || exchanges.is_empty() {
        return NO_EXCHANGES.to_string();
    }

    let outcome = query::execute(query, exchanges, config);
    let mut parts: Vec<String> = Vec::new();

    match query {
        RecallQuery::Around { expression, time } => {
            let dates = query::session_dates(exchanges, config.time_basis);
            if dates.len() > 1 && time.date.is_none() {
                let listed = dates
                    .iter()
                    .map(|d| clock::format_day(*d))
                    .collect::<Vec<_>>()
                    .join(", ");
                parts.push(format!(
                    "*Note: Session spans {} days: {}*",
                    dates.len(),
                    listed
                ));
                parts.push(format!(
                    "*Showing closest match to {}. Specify date for precision (e.g., 'jan 5 2pm')*\n",
                    expression
                ));
            }
            if outcome.indices.is_empty() {
                parts.push(format!("*No exchanges found around {}*", expression));
                return parts.join("\n");
            }
        }
        RecallQuery::Search(term) => {
            if outcome.indices.is_empty() {
                return format!("*No exchanges found matching '{}'*\n{}", term, SEARCH_HINT);
            }
            if outcome.search.as_ref().is_some_and(|s| s.truncated) {
                parts.push(format!(
                    "*Found many matches for '{}', showing {} most recent:*\n",
                    term, config.search_limit
                ));
            }
        }
        RecallQuery::LastN(_) => {}
    }

    let selected = index.select(&outcome.indices);
    if selected.is_empty() {
        parts.push("*Could not fetch exchanges.*".to_string());
        return parts.join("\n");
    }

    parts.push(format!(
        "*Fetched {} exchange(s) ({}):*\n",
        selected.len(),
        query.label()
    ));
    parts.push(render_exchanges(&selected, config));
    parts.join("\n")
}

/// Number of pages needed for `total` exchanges
pub fn total_pages(total: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total.div_ceil(page_size)
}

/// Pages in the index browser, counted from the exchanges actually stored
pub fn page_count(index: &ConversationIndex, page_size: usize) -> usize {
    total_pages(index.exchanges.len(), page_size)
}

/// Append one listing row per exchange, with a header whenever the date changes
fn push_listing_rows(parts: &mut Vec<String>, rows: &[&Exchange], basis: TimeBasis) {
    let mut current_date: Option<NaiveDate> = None;

    for ex in rows {
        let date = clock::date_of(&ex.timestamp, basis);
        if date != current_date {
            current_date = date;
            if let Some(d) = date {
                parts.push(format!("\n**{}:**", clock::format_day(d)));
            }
        }
        parts.push(format!(
            "**#{}** [{}] \"{}\"",
            ex.idx,
            clock::format_time(&ex.timestamp, basis),
            ex.preview
        ));
    }
}

/// Render one page of the index, page 1 holding the most recent exchanges
pub fn render_page(index: &ConversationIndex, page: usize, config: &RecallConfig) -> String {
    let exchanges = &index.exchanges;
    if exchanges.is_empty() {
        return NO_EXCHANGES.to_string();
    }

    let page_size = config.page_size.max(1);
    let total = exchanges.len();
    let pages = page_count(index, page_size);

    let start_from_end = page.saturating_sub(1) * page_size;
    let page_rows: Vec<&Exchange> = exchanges
        .iter()
        .rev()
        .skip(start_from_end)
        .take(page_size)
        .collect();

    if page == 0 || page_rows.is_empty() {
        return format!("*Page {} is empty. Total pages: {}*", page, pages);
    }

    let range = query::session_date_range(exchanges, config.time_basis);
    let date_info = if range.is_empty() {
        String::new()
    } else {
        format!(" ({})", range)
    };

    let mut parts = vec![
        format!(
            "**Session started:** {}{}",
            clock::format_date(&index.session_start, config.time_basis),
            date_info
        ),
        format!("**Total exchanges:** {}", total),
        String::new(),
        format!("**Showing page {} of {}** (most recent first):", page, pages),
        String::new(),
    ];

    push_listing_rows(&mut parts, &page_rows, config.time_basis);

    parts.push(String::new());
    parts.push("---".to_string());
    parts.push(String::new());
    parts.push("**Navigation:**".to_string());
    if page > 1 {
        parts.push(format!("- Show newer: page {}", page - 1));
    }
    if page < pages {
        parts.push(format!("- Show older: page {}", page + 1));
    }
    parts.push("- Jump to time: e.g., \"around 2pm\" or \"around jan 5 2pm\"".to_string());
    parts.push("- Search: e.g., \"search authentication\"".to_string());

    parts.join("\n")
}

/// Render the compact search listing used by the index browser
pub fn render_search_listing(index: &ConversationIndex, term: &str, config: &RecallConfig) -> String {
    let results = query::search_listing(&index.exchanges, term);
    if results.is_empty() {
        return format!("*No exchanges found matching \"{}\"*\n{}", term, SEARCH_HINT);
    }

    let mut parts = vec![
        format!(
            "**Search results for \"{}\":** ({} matches)",
            term,
            results.len()
        ),
        String::new(),
    ];

    let shown = results.len().min(config.listing_limit);
    push_listing_rows(&mut parts, &results[..shown], config.time_basis);

    if results.len() > shown {
        parts.push(format!("*... and {} more matches*", results.len() - shown));
    }

    parts.join("\n")
}
