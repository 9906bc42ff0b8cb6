//! Conversion between a task collection and the text stored in the task file.
//!
//! The file is a compact JSON array of objects keyed `id`, `description`,
//! `status`, `createdAt`, `updatedAt` (in that order), or the literal `[]`.
//! Decoding never fails as a whole: an entry that cannot be read is logged
//! and dropped, and the remaining entries are kept.
//!
//! Older files escape only `"` inside descriptions, so a backslash followed by
//! anything but `"` or `\\` is literal text there. Entries holding such a
//! sequence are read with the key scanner, which keeps those backslashes.

use crate::error::AppError;
use crate::model::{Task, TaskRecord, TaskStatus};
use serde_json::value::RawValue;
use std::collections::HashSet;
use tracing::{debug, warn};

pub const EMPTY_ARRAY: &str = "[]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedEntry {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub tasks: Vec<Task>,
    pub dropped: Vec<DroppedEntry>,
}

pub fn encode(tasks: &[Task]) -> Result<String, AppError> {
    if tasks.is_empty() {
        return Ok(EMPTY_ARRAY.to_string());
    }

    let records = tasks
        .iter()
        .map(Task::to_record)
        .collect::<Result<Vec<TaskRecord>, AppError>>()?;
    serde_json::to_string(&records).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn decode(text: &str) -> Decoded {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == EMPTY_ARRAY {
        return Decoded::default();
    }

    let entries: Vec<Result<Task, AppError>> = match serde_json::from_str::<Vec<&RawValue>>(trimmed) {
        Ok(values) => values.into_iter().map(|value| decode_entry(value.get())).collect(),
        Err(err) => {
            debug!(error = %err, "task file is not strict JSON, scanning entries one by one");
            split_entries(trimmed)
                .iter()
                .map(|entry| decode_entry(entry))
                .collect()
        }
    };

    let mut decoded = Decoded::default();
    let mut seen_ids = HashSet::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let entry = entry.and_then(|task| {
            if seen_ids.insert(task.id()) {
                Ok(task)
            } else {
                Err(AppError::invalid_data(format!("duplicate id {}", task.id())))
            }
        });

        match entry {
            Ok(task) => decoded.tasks.push(task),
            Err(err) => {
                warn!(index, reason = err.message(), "dropping unreadable task entry");
                decoded.dropped.push(DroppedEntry {
                    index,
                    reason: err.message().to_string(),
                });
            }
        }
    }

    if !decoded.dropped.is_empty() {
        warn!(
            dropped = decoded.dropped.len(),
            kept = decoded.tasks.len(),
            "task file contained unreadable entries"
        );
    }

    decoded
}

fn decode_entry(entry: &str) -> Result<Task, AppError> {
    if has_literal_backslash(entry) {
        return scan_record(entry).and_then(Task::from_record);
    }
    match serde_json::from_str::<TaskRecord>(entry) {
        Ok(record) => Task::from_record(record),
        Err(_) => scan_record(entry).and_then(Task::from_record),
    }
}

/// True when a backslash starts anything other than `\"` or `\\`.
fn has_literal_backslash(entry: &str) -> bool {
    let mut chars = entry.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' && !matches!(chars.next(), Some('"' | '\\')) {
            return true;
        }
    }
    false
}

/// Splits an array body on `}` , `{` boundaries (whitespace allowed around
/// the comma). A description holding a raw `},{` breaks this split.
fn split_entries(text: &str) -> Vec<String> {
    let body = text.strip_prefix('[').unwrap_or(text);
    let body = body.strip_suffix(']').unwrap_or(body).trim();
    let bytes = body.as_bytes();

    let mut entries = Vec::new();
    let mut start = 0;
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == b'}'
            && let Some(next) = boundary_end(bytes, index + 1)
        {
            entries.push(restore_braces(&body[start..index]));
            start = next;
            index = next;
            continue;
        }
        index += 1;
    }
    entries.push(restore_braces(&body[start..]));

    entries
}

fn boundary_end(bytes: &[u8], from: usize) -> Option<usize> {
    let index = skip_whitespace(bytes, from);
    if bytes.get(index) != Some(&b',') {
        return None;
    }
    let index = skip_whitespace(bytes, index + 1);
    if bytes.get(index) != Some(&b'{') {
        return None;
    }
    Some(index + 1)
}

fn skip_whitespace(bytes: &[u8], mut index: usize) -> usize {
    while bytes.get(index).is_some_and(u8::is_ascii_whitespace) {
        index += 1;
    }
    index
}

fn restore_braces(chunk: &str) -> String {
    let chunk = chunk.trim();
    let mut entry = String::with_capacity(chunk.len() + 2);
    if !chunk.starts_with('{') {
        entry.push('{');
    }
    entry.push_str(chunk);
    if !chunk.ends_with('}') {
        entry.push('}');
    }
    entry
}

fn scan_record(entry: &str) -> Result<TaskRecord, AppError> {
    let raw_id = scan_value(entry, "id")?;
    let id = raw_id
        .parse::<i64>()
        .map_err(|_| AppError::invalid_data(format!("invalid id '{raw_id}'")))?;

    let description = scan_value(entry, "description")?.replace("\\\"", "\"");

    let raw_status = scan_value(entry, "status")?;
    let status = TaskStatus::from_name(&raw_status)
        .ok_or_else(|| AppError::invalid_data(format!("unrecognized status '{raw_status}'")))?;

    Ok(TaskRecord {
        id,
        description,
        status,
        created_at: scan_value(entry, "createdAt")?,
        updated_at: scan_value(entry, "updatedAt")?,
    })
}

/// Finds `"key"` followed by `:` and returns the raw value: a quoted string up
/// to the next unescaped quote, or a literal up to the next `,` or `}`.
fn scan_value(entry: &str, key: &str) -> Result<String, AppError> {
    let needle = format!("\"{key}\"");
    let mut search_from = 0;

    while let Some(found) = entry[search_from..].find(&needle) {
        let key_start = search_from + found;
        let after_key = key_start + needle.len();
        search_from = after_key;

        if entry[..key_start].ends_with('\\') {
            continue;
        }
        let Some(rest) = entry[after_key..].trim_start().strip_prefix(':') else {
            continue;
        };
        let rest = rest.trim_start();

        if let Some(quoted) = rest.strip_prefix('"') {
            return Ok(read_quoted(quoted).to_string());
        }
        let end = rest.find([',', '}']).unwrap_or(rest.len());
        return Ok(rest[..end].trim().to_string());
    }

    Err(AppError::invalid_data(format!("missing field '{key}'")))
}

fn read_quoted(text: &str) -> &str {
    let mut previous = None;
    for (index, ch) in text.char_indices() {
        if ch == '"' && previous != Some('\\') {
            return &text[..index];
        }
        previous = Some(ch);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::{EMPTY_ARRAY, decode, encode, split_entries};
    use crate::model::{Task, TaskStatus};
    use time::macros::datetime;

    fn task(id: i64, description: &str, status: TaskStatus) -> Task {
        Task::reconstruct(
            id,
            description.to_string(),
            status,
            datetime!(2025-01-15 10:30:45.123),
            datetime!(2025-01-16 08:00),
        )
        .unwrap()
    }

    const VALID_ONE: &str = r#"{"id":1,"description":"Buy groceries","status":"TODO","createdAt":"2025-01-15T10:30:45.123","updatedAt":"2025-01-15T10:30:45.123"}"#;
    const VALID_THREE: &str = r#"{"id":3,"description":"Call mom","status":"DONE","createdAt":"2025-01-15T11:00","updatedAt":"2025-01-17T09:12:01"}"#;

    #[test]
    fn empty_collection_encodes_to_marker() {
        assert_eq!(encode(&[]).unwrap(), EMPTY_ARRAY);
    }

    #[test]
    fn encode_writes_fixed_key_order() {
        let encoded = encode(&[task(1, r#"Say "hi""#, TaskStatus::InProgress)]).unwrap();

        assert_eq!(
            encoded,
            r#"[{"id":1,"description":"Say \"hi\"","status":"IN_PROGRESS","createdAt":"2025-01-15T10:30:45.123","updatedAt":"2025-01-16T08:00"}]"#
        );
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let tasks = vec![
            task(1, "plain", TaskStatus::Todo),
            task(2, r#"quoted "word" and a \ backslash"#, TaskStatus::InProgress),
            task(9, "contains },{ in the middle", TaskStatus::Todo),
            task(10, "ünïcødé ✓", TaskStatus::Done),
        ];

        let decoded = decode(&encode(&tasks).unwrap());

        assert!(decoded.dropped.is_empty());
        assert_eq!(decoded.tasks, tasks);
    }

    #[test]
    fn quote_only_escaped_file_keeps_backslashes() {
        let text = r#"[{"id":1,"description":"C:\new\table","status":"TODO","createdAt":"2025-01-15T10:30","updatedAt":"2025-01-15T10:30"},{"id":2,"description":"say \"hi\" to C:\temp","status":"DONE","createdAt":"2025-01-15T10:30","updatedAt":"2025-01-15T10:31"}]"#;

        let decoded = decode(text);

        assert!(decoded.dropped.is_empty());
        assert_eq!(decoded.tasks[0].description(), r"C:\new\table");
        assert_eq!(decoded.tasks[1].description(), r#"say "hi" to C:\temp"#);
        assert_eq!(decoded.tasks[1].status(), TaskStatus::Done);
    }

    #[test]
    fn literal_backslash_entry_does_not_disturb_neighbours() {
        let tasks = vec![
            task(1, "multi\nline", TaskStatus::Todo),
            task(2, "contains },{ in the middle", TaskStatus::Done),
        ];

        let decoded = decode(&encode(&tasks).unwrap());

        assert!(decoded.dropped.is_empty());
        assert_eq!(decoded.tasks.len(), 2);
        assert_eq!(decoded.tasks[0].id(), 1);
        assert_eq!(decoded.tasks[1], tasks[1]);
    }

    #[test]
    fn decode_handles_empty_markers() {
        assert!(decode("[]").tasks.is_empty());
        assert!(decode("  [ ]\n").tasks.is_empty());
        assert!(decode("").tasks.is_empty());
    }

    #[test]
    fn decode_tolerates_whitespace() {
        let text = format!("[\n  {VALID_ONE} ,\n  {VALID_THREE}\n]\n");
        let decoded = decode(&text);

        assert_eq!(decoded.tasks.len(), 2);
        assert_eq!(decoded.tasks[0].id(), 1);
        assert_eq!(decoded.tasks[1].id(), 3);
        assert_eq!(decoded.tasks[1].status(), TaskStatus::Done);
    }

    #[test]
    fn entry_missing_field_is_dropped_and_rest_kept() {
        let broken = r#"{"id":2,"description":"No status","createdAt":"2025-01-15T10:30","updatedAt":"2025-01-15T10:30"}"#;
        let text = format!("[{VALID_ONE},{broken},{VALID_THREE}]");

        let decoded = decode(&text);

        assert_eq!(decoded.tasks.len(), 2);
        assert_eq!(decoded.tasks[0].id(), 1);
        assert_eq!(decoded.tasks[1].id(), 3);
        assert_eq!(decoded.dropped.len(), 1);
        assert_eq!(decoded.dropped[0].index, 1);
    }

    #[test]
    fn entries_with_bad_values_are_dropped() {
        let bad_status = r#"{"id":4,"description":"x","status":"WAITING","createdAt":"2025-01-15T10:30","updatedAt":"2025-01-15T10:30"}"#;
        let bad_id = r#"{"id":"four","description":"x","status":"TODO","createdAt":"2025-01-15T10:30","updatedAt":"2025-01-15T10:30"}"#;
        let bad_time = r#"{"id":5,"description":"x","status":"TODO","createdAt":"last week","updatedAt":"2025-01-15T10:30"}"#;
        let negative = r#"{"id":-6,"description":"x","status":"TODO","createdAt":"2025-01-15T10:30","updatedAt":"2025-01-15T10:30"}"#;
        let text = format!("[{bad_status},{bad_id},{VALID_ONE},{bad_time},{negative}]");

        let decoded = decode(&text);

        assert_eq!(decoded.tasks.len(), 1);
        assert_eq!(decoded.tasks[0].id(), 1);
        let indexes: Vec<usize> = decoded.dropped.iter().map(|entry| entry.index).collect();
        assert_eq!(indexes, vec![0, 1, 3, 4]);
    }

    #[test]
    fn duplicate_ids_keep_first_entry() {
        let duplicate = VALID_ONE.replace("Buy groceries", "Imposter");
        let text = format!("[{VALID_ONE},{duplicate}]");

        let decoded = decode(&text);

        assert_eq!(decoded.tasks.len(), 1);
        assert_eq!(decoded.tasks[0].description(), "Buy groceries");
        assert_eq!(decoded.dropped.len(), 1);
    }

    #[test]
    fn truncated_file_keeps_complete_entries() {
        let text = format!(r#"[{VALID_ONE},{VALID_THREE},{{"id":4,"descr"#);

        let decoded = decode(&text);

        assert_eq!(decoded.tasks.len(), 2);
        assert_eq!(decoded.dropped.len(), 1);
        assert_eq!(decoded.dropped[0].index, 2);
    }

    #[test]
    fn hand_written_entries_fall_back_to_scanning() {
        // Raw newline and an unescaped backslash make this invalid JSON.
        let text = "[{\"id\" : 7, \"description\" : \"path C:\\data\nsay \\\"hi\\\"\", \"status\":\"DONE\", \"createdAt\":\"2025-01-15T10:30\", \"updatedAt\":\"2025-01-15T10:31\"}]";

        let decoded = decode(text);

        assert!(decoded.dropped.is_empty());
        assert_eq!(decoded.tasks.len(), 1);
        assert_eq!(decoded.tasks[0].id(), 7);
        assert_eq!(decoded.tasks[0].description(), "path C:\\data\nsay \"hi\"");
        assert_eq!(decoded.tasks[0].status(), TaskStatus::Done);
    }

    #[test]
    fn split_entries_restores_braces() {
        let entries = split_entries(r#"[{"id":1} , {"id":2},{"id":3}]"#);

        assert_eq!(entries, vec![r#"{"id":1}"#, r#"{"id":2}"#, r#"{"id":3}"#]);
    }
}
