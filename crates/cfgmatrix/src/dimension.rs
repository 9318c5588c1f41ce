//! dimension classification
//!
//! | top-level value | becomes                                                            |
//! |-----------------|--------------------------------------------------------------------|
//! | list            | array dimension, values in list order (duplicates kept)            |
//! | mapping         | map dimension, values are the sorted keys, nested mappings are per-value configuration |
//! | anything else   | scalar setting copied into every entry                             |
use crate::config_source::RawConfig;
use crate::value::{Object, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Array,
    Map,
}

/// A named axis of the matrix
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Dimension {
    pub key: String,
    pub kind: Kind,
    pub values: Vec<Value>,
    /// Extra fields for a single value, keyed by the value's canonical form
    #[new(default)]
    pub per_value: indexmap::IndexMap<String, Object>,
}

impl Dimension {
    /// Values in their canonical string form
    pub fn value_names(&self) -> Vec<String> {
        self.values.iter().map(ToString::to_string).collect()
    }

    pub fn has_value(&self, name: &str) -> bool {
        self.values.iter().any(|value| value.canonical() == name)
    }

    pub fn config_for(&self, value: &Value) -> Option<&Object> {
        self.per_value.get(&*value.canonical())
    }

    fn from_map(key: String, map: Object) -> Self {
        let mut entries: Vec<(String, Value)> = map.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut dimension = Dimension::new(key, Kind::Map, Vec::with_capacity(entries.len()));
        for (name, config) in entries {
            if let Value::Object(config) = config {
                dimension.per_value.insert(name.clone(), config);
            }
            dimension.values.push(Value::String(name));
        }

        dimension
    }
}

/// Outcome of classifying the non-reserved keys of a configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    /// Sorted by key
    pub dimensions: Vec<Dimension>,
    pub scalars: Object,
}

impl Classified {
    pub fn get(&self, key: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|dimension| dimension.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(|dimension| dimension.key.as_str())
    }

    /// Copy of this classification with one dimension removed
    pub fn without(&self, key: &str) -> Self {
        Self {
            dimensions: self
                .dimensions
                .iter()
                .filter(|dimension| dimension.key != key)
                .cloned()
                .collect(),
            scalars: self.scalars.clone(),
        }
    }
}

/// Classify dimension candidates, in lexicographic key order
#[tracing::instrument(level = "trace", skip_all)]
pub fn classify(candidates: RawConfig) -> Classified {
    let mut candidates: Vec<(String, Value)> = candidates.into_iter().collect();
    candidates.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut classified = Classified::default();
    for (key, value) in candidates {
        match value {
            Value::Array(values) => {
                tracing::trace!(key = %key, count = values.len(), "array dimension");
                classified
                    .dimensions
                    .push(Dimension::new(key, Kind::Array, values));
            }
            Value::Object(map) => {
                tracing::trace!(key = %key, count = map.len(), "map dimension");
                classified.dimensions.push(Dimension::from_map(key, map));
            }
            scalar => {
                classified.scalars.insert(key, scalar);
            }
        }
    }

    tracing::debug!(
        dimensions = ?classified.keys().collect::<Vec<_>>(),
        scalars = classified.scalars.len(),
        "classified configuration"
    );
    classified
}
