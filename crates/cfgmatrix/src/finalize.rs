//! directory synthesis and ordering
use crate::matrix::MatrixEntry;
use crate::value::Value;
use std::cmp::Ordering;

pub const DIRECTORY_FIELD: &str = "directory";

/// Set `directory` on every entry that has a value for `key`
pub fn assign_directories(entries: &mut [MatrixEntry], key: &str, base_dir: &str) {
    for entry in entries.iter_mut() {
        let Some(value) = entry.get(key) else {
            continue;
        };

        let directory = if base_dir.is_empty() {
            value.to_string()
        } else {
            format!("{base_dir}/{value}")
        };
        entry.insert(DIRECTORY_FIELD.to_string(), Value::String(directory));
    }
}

/// Stable sort by the canonical value of each key in turn
///
/// A missing field compares as the empty string.
pub fn sort(entries: &mut [MatrixEntry], keys: &[String]) {
    if keys.is_empty() {
        return;
    }

    entries.sort_by(|a, b| {
        keys.iter().fold(Ordering::Equal, |ordering, key| {
            ordering.then_with(|| sort_value(a, key).cmp(&sort_value(b, key)))
        })
    });
}

fn sort_value<'a>(entry: &'a MatrixEntry, key: &str) -> std::borrow::Cow<'a, str> {
    entry
        .get(key)
        .map(Value::canonical)
        .unwrap_or(std::borrow::Cow::Borrowed(""))
}
