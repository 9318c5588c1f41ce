//! cartesian product and configuration merge
//!
//! Each entry is assembled from four layers, later layers win on key collision:
//!
//! 1. scalar settings
//! 2. shared values from `global`
//! 3. the dimension values of the combination
//! 4. per-value configuration of every dimension, in lexicographic dimension key order
use crate::dimension::{Classified, Dimension};
use crate::matrix::MatrixEntry;
use crate::value::Object;

/// All combinations of dimension values
///
/// A dimension without values yields no combinations at all.
pub fn cartesian_product(dimensions: &[Dimension]) -> Vec<Object> {
    let mut combinations = vec![Object::new()];

    for dimension in dimensions {
        let mut next = Vec::with_capacity(combinations.len() * dimension.values.len());
        for partial in &combinations {
            for value in &dimension.values {
                let mut combination = partial.clone();
                combination.insert(dimension.key.clone(), value.clone());
                next.push(combination);
            }
        }
        combinations = next;
    }

    combinations
}

/// Layer configuration onto a single combination
pub fn merge(combination: Object, classified: &Classified, shared: &Object) -> MatrixEntry {
    let mut entry = classified.scalars.clone();
    entry.extend(shared.iter().map(|(k, v)| (k.clone(), v.clone())));

    // dimensions are sorted by key, so later keys override earlier ones
    let per_value: Vec<&Object> = classified
        .dimensions
        .iter()
        .filter_map(|dimension| {
            combination
                .get(&dimension.key)
                .and_then(|value| dimension.config_for(value))
        })
        .collect();

    entry.extend(combination);
    for config in per_value {
        entry.extend(config.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    entry
}

/// Expand classified dimensions into fully merged entries
#[tracing::instrument(level = "trace", skip_all)]
pub fn expand(classified: &Classified, shared: &Object) -> Vec<MatrixEntry> {
    if classified.dimensions.is_empty() {
        tracing::debug!("no dimensions, passing settings through as a single entry");
        let mut entry = classified.scalars.clone();
        entry.extend(shared.iter().map(|(k, v)| (k.clone(), v.clone())));
        return vec![entry];
    }

    let entries: Vec<MatrixEntry> = cartesian_product(&classified.dimensions)
        .into_iter()
        .map(|combination| merge(combination, classified, shared))
        .collect();

    tracing::debug!(count = entries.len(), "expanded cartesian product");
    entries
}
