//! JSONL transcript parsing from a byte offset

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::types::{Message, Role, TranscriptRecord};

/// Messages read from a transcript and the position reading stopped at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub messages: Vec<Message>,
    /// End of the last line that was fully consumed
    pub offset: u64,
}

type RoleStrategy = fn(&TranscriptRecord) -> Option<Role>;

/// Tried in order; the first strategy yielding a role wins
const ROLE_STRATEGIES: &[RoleStrategy] = &[role_from_type_or_role, role_from_message];

/// Top-level `type`, or `role` when `type` is absent or empty
fn role_from_type_or_role(record: &TranscriptRecord) -> Option<Role> {
    record
        .record_type
        .as_deref()
        .filter(|label| !label.is_empty())
        .or(record.role.as_deref())
        .and_then(Role::from_label)
}

fn role_from_message(record: &TranscriptRecord) -> Option<Role> {
    record
        .message
        .as_ref()
        .and_then(|m| m.role.as_deref())
        .and_then(Role::from_label)
}

/// Resolve the speaker of a record
pub fn resolve_role(record: &TranscriptRecord) -> Option<Role> {
    ROLE_STRATEGIES.iter().find_map(|strategy| strategy(record))
}

/// Parse one raw JSONL line; `None` for malformed or non-conforming lines
pub fn parse_record(raw: &[u8]) -> Option<TranscriptRecord> {
    serde_json::from_slice(raw).ok()
}

/// Turn a record into a message, dropping non-conversational and empty ones
pub fn record_to_message(
    record: &TranscriptRecord,
    line_start: u64,
    line_end: u64,
) -> Option<Message> {
    let role = resolve_role(record)?;
    let text = record
        .message
        .as_ref()
        .map(|m| m.content.as_text())
        .unwrap_or_default();

    if text.is_empty() {
        return None;
    }

    Some(Message {
        role,
        text,
        timestamp: record.timestamp.clone().unwrap_or_default(),
        line_start,
        line_end,
    })
}

/// Current size of the transcript, 0 when it cannot be read
pub fn transcript_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Parse the transcript starting at `from_offset`
///
/// A missing or unreadable transcript yields no messages and leaves the
/// offset where it was.
pub fn parse_transcript_from(path: &Path, from_offset: u64) -> ParseOutcome {
    let unchanged = ParseOutcome {
        messages: Vec::new(),
        offset: from_offset,
    };

    if path.as_os_str().is_empty() {
        return unchanged;
    }

    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "transcript not readable");
            return unchanged;
        }
    };

    if from_offset > 0 {
        if let Err(e) = file.seek(SeekFrom::Start(from_offset)) {
            tracing::debug!(path = %path.display(), error = %e, "seek failed");
            return unchanged;
        }
    }

    read_messages(BufReader::new(file), from_offset)
}

/// Read messages line by line, tracking exact byte positions
///
/// Newline-terminated lines are always consumed, even when malformed. A
/// final unterminated line is consumed only if it parses as a record,
/// since it may still be in the middle of being written.
pub fn read_messages<R: BufRead>(mut reader: R, from_offset: u64) -> ParseOutcome {
    let mut messages = Vec::new();
    let mut offset = from_offset;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(n) => n as u64,
            Err(e) => {
                tracing::debug!(offset, error = %e, "transcript read stopped");
                break;
            }
        };

        let line_start = offset;
        let line_end = offset + read;
        let complete = buf.last() == Some(&b'\n');
        let trimmed = buf.trim_ascii();

        if trimmed.is_empty() {
            if complete {
                offset = line_end;
            }
            continue;
        }

        match parse_record(trimmed) {
            Some(record) => {
                if let Some(message) = record_to_message(&record, line_start, line_end) {
                    messages.push(message);
                }
                offset = line_end;
            }
            None if complete => {
                tracing::debug!(offset = line_start, "skipping malformed transcript line");
                offset = line_end;
            }
            None => break,
        }
    }

    ParseOutcome { messages, offset }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    const USER: &str = r#"{"type":"user","message":{"content":[{"type":"text","text":"Hello"}]},"timestamp":"2025-01-05T09:00:00Z"}"#;
    const ASSISTANT: &str = r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Hi there!"}]},"timestamp":"2025-01-05T09:00:05Z"}"#;

    #[test]
    fn test_parse_valid_transcript() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("transcript.jsonl");
        fs::write(&path, format!("{}\n{}\n", USER, ASSISTANT)).unwrap();

        let outcome = parse_transcript_from(&path, 0);
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(outcome.messages[0].role, Role::User);
        assert_eq!(outcome.messages[0].text, "Hello");
        assert_eq!(outcome.messages[0].timestamp, "2025-01-05T09:00:00Z");
        assert_eq!(outcome.messages[1].role, Role::Assistant);
        assert_eq!(outcome.offset, fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_missing_transcript_keeps_offset() {
        let outcome = parse_transcript_from(Path::new("/nonexistent/file.jsonl"), 17);
        assert!(outcome.messages.is_empty());
        assert_eq!(outcome.offset, 17);

        let outcome = parse_transcript_from(Path::new(""), 0);
        assert!(outcome.messages.is_empty());
        assert_eq!(outcome.offset, 0);
    }

    #[test]
    fn test_resume_from_offset() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("transcript.jsonl");
        fs::write(&path, format!("{}\n", USER)).unwrap();

        let first = parse_transcript_from(&path, 0);
        assert_eq!(first.messages.len(), 1);

        let mut f = fs::OpenOptions::new().append(true).open(&path).unwrap();
        std::io::Write::write_all(&mut f, format!("{}\n", ASSISTANT).as_bytes()).unwrap();

        let second = parse_transcript_from(&path, first.offset);
        assert_eq!(second.messages.len(), 1);
        assert_eq!(second.messages[0].role, Role::Assistant);
        assert_eq!(second.messages[0].line_start, first.offset);
    }

    #[test]
    fn test_malformed_lines_are_consumed() {
        let input = format!("{}\nnot valid json\n{}\n", USER, ASSISTANT);
        let outcome = read_messages(Cursor::new(input.as_bytes()), 0);
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(outcome.offset, input.len() as u64);
    }

    #[test]
    fn test_partial_trailing_line_is_not_consumed() {
        let partial = r#"{"type":"assistant","message":{"content":"Hi"#;
        let input = format!("{}\n{}", USER, partial);
        let outcome = read_messages(Cursor::new(input.as_bytes()), 0);
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.offset, USER.len() as u64 + 1);
    }

    #[test]
    fn test_complete_trailing_line_without_newline() {
        let input = format!("{}\n{}", USER, ASSISTANT);
        let outcome = read_messages(Cursor::new(input.as_bytes()), 0);
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(outcome.offset, input.len() as u64);
    }

    #[test]
    fn test_offsets_are_relative_to_start() {
        let input = format!("{}\n", ASSISTANT);
        let outcome = read_messages(Cursor::new(input.as_bytes()), 100);
        assert_eq!(outcome.messages[0].line_start, 100);
        assert_eq!(outcome.messages[0].line_end, 100 + input.len() as u64);
        assert_eq!(outcome.offset, 100 + input.len() as u64);
    }

    #[test]
    fn test_role_from_nested_message() {
        let raw = r#"{"type":"message","message":{"role":"assistant","content":"nested"}}"#;
        let record = parse_record(raw.as_bytes()).unwrap();
        assert_eq!(resolve_role(&record), Some(Role::Assistant));
    }

    #[test]
    fn test_role_from_top_level_role() {
        let raw = r#"{"role":"user","message":{"content":"hi"}}"#;
        let record = parse_record(raw.as_bytes()).unwrap();
        assert_eq!(resolve_role(&record), Some(Role::User));
    }

    #[test]
    fn test_non_empty_type_shadows_top_level_role() {
        let raw = r#"{"type":"message","role":"user","message":{"role":"assistant","content":"x"}}"#;
        let record = parse_record(raw.as_bytes()).unwrap();
        assert_eq!(resolve_role(&record), Some(Role::Assistant));

        let raw = r#"{"type":"","role":"user","message":{"content":"x"}}"#;
        let record = parse_record(raw.as_bytes()).unwrap();
        assert_eq!(resolve_role(&record), Some(Role::User));
    }

    #[test]
    fn test_non_conversational_records_dropped() {
        let input = concat!(
            r#"{"type":"system","message":{"role":"system","content":"init"}}"#,
            "\n",
            r#"{"type":"summary","summary":"A summary"}"#,
            "\n",
            r#"{"type":"user","message":{"content":[{"type":"tool_result","content":"output"}]}}"#,
            "\n",
        );
        let outcome = read_messages(Cursor::new(input.as_bytes()), 0);
        assert!(outcome.messages.is_empty());
        assert_eq!(outcome.offset, input.len() as u64);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let input = format!("\n\n{}\n\n", USER);
        let outcome = read_messages(Cursor::new(input.as_bytes()), 0);
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.offset, input.len() as u64);
    }
}
