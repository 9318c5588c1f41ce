//! exclude, include and allow-list filters
//!
//! A pattern matches an entry when every key of the pattern is present in the entry with
//! the same canonical value. The empty pattern matches everything.
use crate::matrix::MatrixEntry;

pub fn matches(entry: &MatrixEntry, pattern: &MatrixEntry) -> bool {
    pattern.iter().all(|(key, expected)| {
        entry
            .get(key)
            .is_some_and(|actual| actual.canonical() == expected.canonical())
    })
}

/// Drop every entry matched by any pattern
pub fn exclude(entries: Vec<MatrixEntry>, patterns: &[MatrixEntry]) -> Vec<MatrixEntry> {
    if patterns.is_empty() {
        return entries;
    }

    let before = entries.len();
    let entries: Vec<MatrixEntry> = entries
        .into_iter()
        .filter(|entry| !patterns.iter().any(|pattern| matches(entry, pattern)))
        .collect();
    tracing::debug!(removed = before - entries.len(), "applied exclude patterns");

    entries
}

/// Append entries verbatim
pub fn include(mut entries: Vec<MatrixEntry>, includes: &[MatrixEntry]) -> Vec<MatrixEntry> {
    entries.extend_from_slice(includes);
    entries
}

/// Keep entries whose `key` is one of `allowed`
///
/// An empty allow-list keeps everything. Entries without `key` are dropped.
pub fn filter(entries: Vec<MatrixEntry>, key: &str, allowed: &[String]) -> Vec<MatrixEntry> {
    if allowed.is_empty() {
        return entries;
    }

    let before = entries.len();
    let entries: Vec<MatrixEntry> = entries
        .into_iter()
        .filter(|entry| {
            entry.get(key).is_some_and(|value| {
                let value = value.canonical();
                allowed.iter().any(|allowed| *allowed == value)
            })
        })
        .collect();
    tracing::debug!(key, ?allowed, removed = before - entries.len(), "applied filter");

    entries
}

/// Parse caller supplied exclude/include entries from a JSON array of objects
///
/// Unlike rules inside a configuration file, every item must be an object.
pub fn parse_entries(json: &str) -> Result<Vec<MatrixEntry>, PatternError> {
    let items: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(json)?;

    Ok(items
        .into_iter()
        .map(|item| item.into_iter().map(|(k, v)| (k, v.into())).collect())
        .collect())
}

#[derive(thiserror::Error, Debug)]
#[error("expected a JSON array of objects")]
pub struct PatternError(#[from] serde_json::Error);

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn entry(pairs: &[(&str, Value)]) -> MatrixEntry {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn entries() -> Vec<MatrixEntry> {
        vec![
            entry(&[("service", "a".into()), ("environment", "dev".into())]),
            entry(&[("service", "b".into()), ("environment", "dev".into())]),
            entry(&[("service", "b".into()), ("environment", "prod".into())]),
        ]
    }

    #[test]
    fn exclude_single_pattern() {
        let result = exclude(entries(), &[entry(&[("service", "b".into())])]);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].get("service"), Some(&Value::from("a")));
    }

    #[test]
    fn exclude_requires_all_pattern_keys() {
        let pattern = entry(&[("service", "b".into()), ("environment", "dev".into())]);
        assert_eq!(exclude(entries(), &[pattern]).len(), 2);

        let missing_key = entry(&[("service", "b".into()), ("region", "eu".into())]);
        assert_eq!(exclude(entries(), &[missing_key]).len(), 3);
    }

    #[test]
    fn exclude_any_pattern() {
        let patterns = [
            entry(&[("service", "a".into())]),
            entry(&[("environment", "prod".into())]),
        ];
        assert_eq!(exclude(entries(), &patterns).len(), 1);
    }

    #[test]
    fn empty_pattern_excludes_everything() {
        assert!(exclude(entries(), &[MatrixEntry::new()]).is_empty());
    }

    #[test]
    fn matching_compares_canonical_strings() {
        let numeric = entry(&[("port", Value::Integer(8080))]);
        assert!(matches(&numeric, &entry(&[("port", "8080".into())])));
    }

    #[test]
    fn include_appends_verbatim() {
        let extra = entry(&[("service", "shared".into())]);
        let result = include(entries(), &[extra.clone()]);

        assert_eq!(result.len(), 4);
        assert_eq!(result[3], extra);
    }

    #[test]
    fn filter_keeps_allowed_values() {
        let result = filter(entries(), "service", &["b".to_string()]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn empty_filter_is_a_noop() {
        assert_eq!(filter(entries(), "service", &[]), entries());
    }

    #[test]
    fn filter_drops_entries_without_key() {
        let mut input = entries();
        input.push(entry(&[("service", "b".into())]));

        let result = filter(input, "environment", &["dev".to_string(), "prod".to_string()]);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn parse_caller_entries() {
        let parsed = parse_entries(r#"[{"service": "api", "replicas": 2}]"#).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].get("replicas"), Some(&Value::Integer(2)));
    }

    #[test]
    fn parse_caller_entries_is_strict() {
        assert!(parse_entries(r#"[{"service": "api"}, "oops"]"#).is_err());
        assert!(parse_entries(r#"{"service": "api"}"#).is_err());
        assert!(parse_entries("not json").is_err());
    }
}
