//! change-aware narrowing of the primary dimension
//!
//! A value of the primary dimension counts as changed when any changed path starts with
//! `{base_dir}/{value}/` (or `{value}/` without a base directory).

/// Changed paths as reported for the current trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangedFiles {
    /// The trigger has no meaningful diff (e.g. a manual run), everything passes
    NotApplicable,
    /// Changed paths, possibly none
    Paths(Vec<String>),
}

impl From<Option<Vec<String>>> for ChangedFiles {
    fn from(value: Option<Vec<String>>) -> Self {
        value.map_or(ChangedFiles::NotApplicable, ChangedFiles::Paths)
    }
}

/// The subset of `known` values with at least one changed path, in the order of `known`
pub fn changed_values(paths: &[String], base_dir: &str, known: &[String]) -> Vec<String> {
    let mut changed: Vec<String> = vec![];

    for value in known {
        let prefix = if base_dir.is_empty() {
            format!("{value}/")
        } else {
            format!("{base_dir}/{value}/")
        };

        let has_changes = paths.iter().any(|path| path.trim().starts_with(&prefix));
        if has_changes && !changed.contains(value) {
            changed.push(value.clone());
        }
    }

    changed
}

/// What change detection does to the primary filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Detection does not apply, the filter stays as it is
    Skipped,
    /// The new primary filter
    Narrowed(Vec<String>),
    /// Nothing changed (or nothing allowed changed), the matrix is empty
    Unchanged,
}

/// What change detection found, before intersecting with a filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Number of changed paths
    pub files: usize,
    /// Number of values of the primary dimension
    pub known: usize,
    /// Values with changes, in the order of the primary dimension
    pub changed: Vec<String>,
}

/// Combine changed values with an existing primary filter
///
/// `known` is `None` when the primary dimension does not exist. The summary is only present
/// when changed paths were actually compared.
pub fn evaluate(
    changed_files: &ChangedFiles,
    base_dir: &str,
    known: Option<&[String]>,
    filter: &[String],
) -> (Outcome, Option<Summary>) {
    let Some(known) = known else {
        return (Outcome::Skipped, None);
    };

    let ChangedFiles::Paths(paths) = changed_files else {
        return (Outcome::Skipped, None);
    };

    let changed = changed_values(paths, base_dir, known);
    tracing::info!(
        files = paths.len(),
        changed = changed.len(),
        known = known.len(),
        values = ?changed,
        "detected changes"
    );
    let summary = Summary {
        files: paths.len(),
        known: known.len(),
        changed: changed.clone(),
    };

    let narrowed: Vec<String> = if filter.is_empty() {
        changed
    } else {
        changed
            .into_iter()
            .filter(|value| filter.contains(value))
            .collect()
    };

    let outcome = if narrowed.is_empty() {
        Outcome::Unchanged
    } else {
        Outcome::Narrowed(narrowed)
    };

    (outcome, Some(summary))
}
