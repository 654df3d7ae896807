//! Query strategies over a loaded conversation index
//!
//! Every strategy is stateless and returns exchange indices; callers resolve
//! them with [`ConversationIndex::select`](crate::types::ConversationIndex::select).

use std::collections::BTreeSet;

use chrono::NaiveDate;
use thiserror::Error;

use crate::clock::{self, TimeBasis};
use crate::config::RecallConfig;
use crate::time_query::{parse_time_query, TimeQuery};
use crate::types::Exchange;

/// Malformed recall queries, worded for the person who typed them
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid format: {0}. Try 'last5' or 'last10'.")]
    InvalidLastN(String),

    #[error("Please specify a time, e.g., 'around 2pm' or 'around \"jan 5 2pm\"'")]
    MissingTime,

    #[error("Could not parse time: '{0}'. Try formats like '2pm', '2:30pm', 'jan 5 2pm'")]
    UnparseableTime(String),

    #[error("Please specify a search term, e.g., 'search authentication'")]
    MissingSearchTerm,

    #[error("Unknown command: '{0}'")]
    UnknownVerb(String),
}

/// A parsed recall request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecallQuery {
    LastN(usize),
    Around { expression: String, time: TimeQuery },
    Search(String),
}

impl RecallQuery {
    /// Parse recall arguments, e.g. `["last5"]`, `["around", "2pm"]`,
    /// `["search", "auth", "flow"]`. No arguments means `last5`.
    pub fn parse(args: &[String], today: NaiveDate) -> Result<RecallQuery, QueryError> {
        let Some(first) = args.first() else {
            return Ok(RecallQuery::LastN(5));
        };
        let verb = first.to_lowercase();
        let rest = args[1..].join(" ");

        if verb.starts_with("last") {
            return parse_last_n(&verb).map(RecallQuery::LastN);
        }

        match verb.as_str() {
            "around" => {
                if rest.trim().is_empty() {
                    return Err(QueryError::MissingTime);
                }
                let time = parse_time_query(&rest, today)
                    .ok_or_else(|| QueryError::UnparseableTime(rest.clone()))?;
                Ok(RecallQuery::Around {
                    expression: rest,
                    time,
                })
            }
            "search" => {
                if rest.trim().is_empty() {
                    return Err(QueryError::MissingSearchTerm);
                }
                Ok(RecallQuery::Search(rest))
            }
            _ => Err(QueryError::UnknownVerb(verb)),
        }
    }

    /// Short description used in output headers
    pub fn label(&self) -> String {
        match self {
            RecallQuery::LastN(n) => format!("last{}", n),
            RecallQuery::Around { expression, .. } => format!("around {}", expression),
            RecallQuery::Search(term) => format!("search '{}'", term),
        }
    }
}

/// Parse a `lastN` token; N must be a positive integer
pub fn parse_last_n(token: &str) -> Result<usize, QueryError> {
    let lowered = token.to_lowercase();
    let digits = lowered
        .strip_prefix("last")
        .ok_or_else(|| QueryError::InvalidLastN(token.to_string()))?;
    match digits.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(QueryError::InvalidLastN(token.to_string())),
    }
}

/// Indices of the most recent `n` exchanges, clamped to `1..=total`
pub fn last_n(total: u32, n: usize) -> Vec<u32> {
    if total == 0 || n == 0 {
        return Vec::new();
    }
    let n = u32::try_from(n).unwrap_or(u32::MAX).min(total);
    (total - n + 1..=total).collect()
}

/// Position of the exchange whose time of day is closest to the target
///
/// Scans in order and keeps the first minimal difference. Exchanges without
/// a usable timestamp are skipped.
pub fn closest_by_time<'a, I>(exchanges: I, target_minutes: u32, basis: TimeBasis) -> Option<usize>
where
    I: IntoIterator<Item = &'a Exchange>,
{
    let mut best: Option<(usize, u32)> = None;

    for (pos, ex) in exchanges.into_iter().enumerate() {
        let Some(dt) = clock::wall_clock(&ex.timestamp, basis) else {
            continue;
        };
        let diff = clock::minutes_of_day(&dt).abs_diff(target_minutes);
        if best.map_or(true, |(_, best_diff)| diff < best_diff) {
            best = Some((pos, diff));
        }
    }

    best.map(|(pos, _)| pos)
}

/// Find the best time match, restricted to the query's date when any
/// exchange falls on it. Returns the candidate list and the match position.
fn best_match<'a>(
    exchanges: &'a [Exchange],
    time: &TimeQuery,
    basis: TimeBasis,
) -> Option<(Vec<&'a Exchange>, usize)> {
    if let Some(date) = time.date {
        let on_date: Vec<&Exchange> = exchanges
            .iter()
            .filter(|ex| clock::date_of(&ex.timestamp, basis) == Some(date))
            .collect();
        if !on_date.is_empty() {
            let pos = closest_by_time(on_date.iter().copied(), time.minutes(), basis)?;
            return Some((on_date, pos));
        }
    }

    let all: Vec<&Exchange> = exchanges.iter().collect();
    let pos = closest_by_time(all.iter().copied(), time.minutes(), basis)?;
    Some((all, pos))
}

/// Indices of a window of `window` exchanges centered on the best time match
pub fn around_time(
    exchanges: &[Exchange],
    time: &TimeQuery,
    window: usize,
    basis: TimeBasis,
) -> Vec<u32> {
    let Some((candidates, best)) = best_match(exchanges, time, basis) else {
        return Vec::new();
    };

    let start = best.saturating_sub(window / 2);
    let end = (best + window / 2 + 1).min(candidates.len());
    candidates[start..end].iter().map(|ex| ex.idx).collect()
}

/// 1-based page (counted from the most recent end) holding the best time match
pub fn page_for_time(
    exchanges: &[Exchange],
    time: &TimeQuery,
    page_size: usize,
    basis: TimeBasis,
) -> usize {
    let page_size = page_size.max(1);
    let Some((candidates, best)) = best_match(exchanges, time, basis) else {
        return 1;
    };
    let Some(pos) = exchanges.iter().position(|ex| ex.idx == candidates[best].idx) else {
        return 1;
    };
    let from_end = exchanges.len() - 1 - pos;
    from_end / page_size + 1
}

/// Outcome of a keyword search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Matching indices, ascending, capped at the search limit
    pub indices: Vec<u32>,
    /// Number of exchanges that matched before capping
    pub total_matches: usize,
    pub truncated: bool,
}

/// Case-insensitive substring test
pub fn contains_ignore_case(text: &str, term: &str) -> bool {
    text.to_lowercase().contains(&term.to_lowercase())
}

/// Search user text (or preview) and assistant text for `term`
///
/// When more than `limit` exchanges match, the most recent `limit` are kept.
pub fn search(exchanges: &[Exchange], term: &str, limit: usize) -> SearchResult {
    let needle = term.to_lowercase();
    let matches: BTreeSet<u32> = exchanges
        .iter()
        .filter(|ex| {
            ex.user_text_or_preview().to_lowercase().contains(&needle)
                || ex.assistant_text.to_lowercase().contains(&needle)
        })
        .map(|ex| ex.idx)
        .collect();

    let total_matches = matches.len();
    let truncated = total_matches > limit;
    let indices: Vec<u32> = matches
        .into_iter()
        .rev()
        .take(limit)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    SearchResult {
        indices,
        total_matches,
        truncated,
    }
}

/// Exchanges matching `term` in preview, user text or assistant text
pub fn search_listing<'a>(exchanges: &'a [Exchange], term: &str) -> Vec<&'a Exchange> {
    exchanges
        .iter()
        .filter(|ex| {
            contains_ignore_case(&ex.preview, term)
                || contains_ignore_case(&ex.user_text, term)
                || contains_ignore_case(&ex.assistant_text, term)
        })
        .collect()
}

/// Distinct calendar dates in the session, ascending
pub fn session_dates(exchanges: &[Exchange], basis: TimeBasis) -> Vec<NaiveDate> {
    exchanges
        .iter()
        .filter_map(|ex| clock::date_of(&ex.timestamp, basis))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Human date range, e.g. `Jan 5` or `Jan 5 - Jan 7`
pub fn session_date_range(exchanges: &[Exchange], basis: TimeBasis) -> String {
    let dates = session_dates(exchanges, basis);
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) if first == last => clock::format_day(*first),
        (Some(first), Some(last)) => {
            format!("{} - {}", clock::format_day(*first), clock::format_day(*last))
        }
        _ => String::new(),
    }
}

/// Run a parsed query against the exchange list
pub fn execute(query: &RecallQuery, exchanges: &[Exchange], config: &RecallConfig) -> QueryOutcome {
    match query {
        RecallQuery::LastN(n) => QueryOutcome {
            indices: last_n(exchanges.len() as u32, *n),
            search: None,
        },
        RecallQuery::Around { time, .. } => QueryOutcome {
            indices: around_time(exchanges, time, config.around_window, config.time_basis),
            search: None,
        },
        RecallQuery::Search(term) => {
            let result = search(exchanges, term, config.search_limit);
            QueryOutcome {
                indices: result.indices.clone(),
                search: Some(result),
            }
        }
    }
}

/// Indices selected by a query, plus search details when it was a search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutcome {
    pub indices: Vec<u32>,
    pub search: Option<SearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(idx: u32, user: &str, assistant: &str, timestamp: &str) -> Exchange {
        Exchange {
            idx,
            preview: user.chars().take(80).collect(),
            user_text: user.to_string(),
            assistant_text: assistant.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    fn hourly(count: u32, first_hour: u32) -> Vec<Exchange> {
        (0..count)
            .map(|i| {
                exchange(
                    i + 1,
                    &format!("Question {}", i + 1),
                    &format!("Answer {}", i + 1),
                    &format!("2025-01-05T{:02}:00:00Z", first_hour + i),
                )
            })
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_last_n() {
        assert_eq!(last_n(20, 5), vec![16, 17, 18, 19, 20]);
        assert_eq!(last_n(20, 10), (11..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_last_n_exceeds_total() {
        assert_eq!(last_n(5, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(last_n(5, 5), vec![1, 2, 3, 4, 5]);
        assert!(last_n(0, 5).is_empty());
    }

    #[test]
    fn test_parse_last_n() {
        assert_eq!(parse_last_n("last5"), Ok(5));
        assert_eq!(parse_last_n("LAST12"), Ok(12));
        assert!(matches!(parse_last_n("lastx"), Err(QueryError::InvalidLastN(_))));
        assert!(matches!(parse_last_n("last"), Err(QueryError::InvalidLastN(_))));
        assert!(matches!(parse_last_n("last0"), Err(QueryError::InvalidLastN(_))));
        assert!(matches!(parse_last_n("last-3"), Err(QueryError::InvalidLastN(_))));
    }

    #[test]
    fn test_parse_query_verbs() {
        assert_eq!(RecallQuery::parse(&[], today()), Ok(RecallQuery::LastN(5)));
        assert_eq!(
            RecallQuery::parse(&args(&["search", "PAI", "dim"]), today()),
            Ok(RecallQuery::Search("PAI dim".to_string()))
        );
        assert_eq!(
            RecallQuery::parse(&args(&["search"]), today()),
            Err(QueryError::MissingSearchTerm)
        );
        assert_eq!(
            RecallQuery::parse(&args(&["around"]), today()),
            Err(QueryError::MissingTime)
        );
        assert_eq!(
            RecallQuery::parse(&args(&["around", "teatime"]), today()),
            Err(QueryError::UnparseableTime("teatime".to_string()))
        );
        assert_eq!(
            RecallQuery::parse(&args(&["summon"]), today()),
            Err(QueryError::UnknownVerb("summon".to_string()))
        );
    }

    #[test]
    fn test_around_two_pm_window() {
        let exchanges = hourly(12, 9);
        let time = parse_time_query("2pm", today()).unwrap();
        let indices = around_time(&exchanges, &time, 5, TimeBasis::Recorded);
        // 14:00 is exchange #6
        assert_eq!(indices, vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_around_clips_at_bounds() {
        let exchanges = hourly(12, 9);
        let time = parse_time_query("9am", today()).unwrap();
        assert_eq!(around_time(&exchanges, &time, 5, TimeBasis::Recorded), vec![1, 2, 3]);

        let time = parse_time_query("23:00", today()).unwrap();
        assert_eq!(
            around_time(&exchanges, &time, 5, TimeBasis::Recorded),
            vec![10, 11, 12]
        );
    }

    #[test]
    fn test_around_tie_keeps_first() {
        let exchanges = vec![
            exchange(1, "a", "a", "2025-01-05T13:00:00Z"),
            exchange(2, "b", "b", "2025-01-05T15:00:00Z"),
        ];
        let time = parse_time_query("2pm", today()).unwrap();
        assert_eq!(
            closest_by_time(exchanges.iter(), time.minutes(), TimeBasis::Recorded),
            Some(0)
        );
    }

    #[test]
    fn test_around_with_date_restricts_candidates() {
        let exchanges = vec![
            exchange(1, "a", "a", "2025-01-04T14:00:00Z"),
            exchange(2, "b", "b", "2025-01-05T09:00:00Z"),
            exchange(3, "c", "c", "2025-01-05T10:00:00Z"),
            exchange(4, "d", "d", "2025-01-05T18:00:00Z"),
        ];
        let time = parse_time_query("jan 5 2pm", today()).unwrap();
        let indices = around_time(&exchanges, &time, 1, TimeBasis::Recorded);
        assert_eq!(indices, vec![3]);

        let indices = around_time(&exchanges, &time, 5, TimeBasis::Recorded);
        assert_eq!(indices, vec![2, 3, 4]);
    }

    #[test]
    fn test_around_unknown_date_falls_back() {
        let exchanges = vec![
            exchange(1, "a", "a", "2025-01-04T14:00:00Z"),
            exchange(2, "b", "b", "2025-01-05T09:00:00Z"),
        ];
        let time = parse_time_query("feb 1 2pm", today()).unwrap();
        assert_eq!(around_time(&exchanges, &time, 1, TimeBasis::Recorded), vec![1]);
    }

    #[test]
    fn test_around_without_timestamps() {
        let exchanges = vec![exchange(1, "a", "a", ""), exchange(2, "b", "b", "garbage")];
        let time = parse_time_query("2pm", today()).unwrap();
        assert!(around_time(&exchanges, &time, 5, TimeBasis::Recorded).is_empty());
        assert!(around_time(&[], &time, 5, TimeBasis::Recorded).is_empty());
    }

    #[test]
    fn test_search_in_assistant_text() {
        let exchanges = vec![
            exchange(1, "Hello", "Hi", ""),
            exchange(2, "Fix the build", "Done", ""),
            exchange(3, "What broke?", "Authentication issue in login", ""),
        ];
        let result = search(&exchanges, "authentication", 10);
        assert_eq!(result.indices, vec![3]);
        assert!(!result.truncated);
    }

    #[test]
    fn test_search_case_insensitive() {
        let exchanges = vec![exchange(1, "Deploy to PRODUCTION", "ok", "")];
        assert_eq!(search(&exchanges, "production", 10).indices, vec![1]);
        assert!(search(&exchanges, "staging", 10).indices.is_empty());
    }

    #[test]
    fn test_search_fallback_to_preview() {
        let mut ex = exchange(1, "", "nothing", "");
        ex.preview = "legacy preview about tokens".to_string();
        assert_eq!(search(&[ex], "tokens", 10).indices, vec![1]);
    }

    #[test]
    fn test_search_caps_to_most_recent() {
        let exchanges: Vec<Exchange> = (1..=15)
            .map(|i| exchange(i, &format!("topic {}", i), "reply", ""))
            .collect();
        let result = search(&exchanges, "topic", 10);
        assert_eq!(result.indices, (6..=15).collect::<Vec<_>>());
        assert_eq!(result.total_matches, 15);
        assert!(result.truncated);
    }

    #[test]
    fn test_search_listing_matches_any_field() {
        let exchanges = vec![
            exchange(1, "alpha", "beta", ""),
            exchange(2, "gamma", "delta", ""),
        ];
        let found: Vec<u32> = search_listing(&exchanges, "DELTA").iter().map(|ex| ex.idx).collect();
        assert_eq!(found, vec![2]);
    }

    #[test]
    fn test_page_for_time() {
        let exchanges: Vec<Exchange> = (0..45)
            .map(|i| {
                exchange(
                    i + 1,
                    "q",
                    "a",
                    &format!("2025-01-05T{:02}:{:02}:00Z", 8 + i / 6, (i % 6) * 10),
                )
            })
            .collect();
        // Latest exchange is on page 1
        let late = parse_time_query("15:20", today()).unwrap();
        assert_eq!(page_for_time(&exchanges, &late, 20, TimeBasis::Recorded), 1);
        // The first exchange sits 44 from the end
        let early = parse_time_query("8am", today()).unwrap();
        assert_eq!(page_for_time(&exchanges, &early, 20, TimeBasis::Recorded), 3);
        assert_eq!(page_for_time(&[], &early, 20, TimeBasis::Recorded), 1);
    }

    #[test]
    fn test_session_date_range() {
        let single = vec![exchange(1, "a", "a", "2026-01-05T10:00:00Z")];
        assert_eq!(session_date_range(&single, TimeBasis::Recorded), "Jan 5");

        let multi = vec![
            exchange(1, "a", "a", "2026-01-05T10:00:00Z"),
            exchange(2, "b", "b", "2026-01-07T10:00:00Z"),
        ];
        assert_eq!(session_date_range(&multi, TimeBasis::Recorded), "Jan 5 - Jan 7");
        assert_eq!(session_date_range(&[], TimeBasis::Recorded), "");
    }

    #[test]
    fn test_execute_search_reports_details() {
        let exchanges = hourly(3, 9);
        let outcome = execute(
            &RecallQuery::Search("answer 2".to_string()),
            &exchanges,
            &RecallConfig::default(),
        );
        assert_eq!(outcome.indices, vec![2]);
        assert_eq!(outcome.search.map(|s| s.total_matches), Some(1));
    }
}
