//! reserved settings
//!
//! Three top-level keys are never dimensions:
//! - `global`: control fields plus values shared by every entry
//! - `exclude`: patterns removing entries from the product
//! - `include`: standalone entries appended after the product
//!
//! Everything else is handed on to [crate::dimension::classify].
use crate::config_source::RawConfig;
use crate::matrix::MatrixEntry;
use crate::value::{Object, Value};

pub const GLOBAL_KEY: &str = "global";
pub const EXCLUDE_KEY: &str = "exclude";
pub const INCLUDE_KEY: &str = "include";
pub const RESERVED_KEYS: [&str; 3] = [GLOBAL_KEY, EXCLUDE_KEY, INCLUDE_KEY];

pub const DIMENSION_KEY_FIELD: &str = "dimension_key";
pub const BASE_DIR_FIELD: &str = "base_dir";
pub const SORT_BY_FIELD: &str = "sort_by";

pub const DEFAULT_DIMENSION_KEY: &str = "service";
pub const DEFAULT_SORT_KEY: &str = "environment";

/// Contents of the `global` block
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSettings {
    /// Name of the primary dimension
    pub dimension_key: String,
    /// Prefix for the synthesized `directory` field, may be empty
    pub base_dir: String,
    /// Sort keys, compared in order
    pub sort_by: Vec<String>,
    /// Every other field of the `global` block, merged into each entry
    pub shared: Object,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            dimension_key: DEFAULT_DIMENSION_KEY.to_string(),
            base_dir: String::new(),
            sort_by: vec![DEFAULT_SORT_KEY.to_string()],
            shared: Object::new(),
        }
    }
}

impl GlobalSettings {
    fn from_object(object: Object) -> Self {
        let mut settings = Self::default();

        for (key, value) in object {
            match key.as_str() {
                DIMENSION_KEY_FIELD => match value {
                    Value::String(name) if !name.is_empty() => settings.dimension_key = name,
                    other => tracing::warn!(value=%other, "ignoring invalid global.dimension_key"),
                },
                BASE_DIR_FIELD => match value {
                    Value::Null => settings.base_dir.clear(),
                    value if value.is_scalar() => settings.base_dir = value.to_string(),
                    other => tracing::warn!(value=%other, "ignoring invalid global.base_dir"),
                },
                SORT_BY_FIELD => match value {
                    Value::Array(keys) => {
                        settings.sort_by = keys.iter().map(ToString::to_string).collect()
                    }
                    Value::String(key) => settings.sort_by = vec![key],
                    other => tracing::warn!(value=%other, "ignoring invalid global.sort_by"),
                },
                _ => {
                    settings.shared.insert(key, value);
                }
            }
        }

        settings
    }
}

/// Everything the reserved keys contribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub global: GlobalSettings,
    pub exclude: Vec<MatrixEntry>,
    pub include: Vec<MatrixEntry>,
}

/// Split reserved settings from dimension candidates
///
/// The returned mapping contains every non-reserved top-level key, untouched.
#[tracing::instrument(level = "trace", skip_all)]
pub fn extract(mut raw: RawConfig) -> (Settings, RawConfig) {
    let global = match raw.shift_remove(GLOBAL_KEY) {
        None => GlobalSettings::default(),
        Some(Value::Object(object)) => GlobalSettings::from_object(object),
        Some(other) => {
            tracing::warn!(value=%other, "`global` is not a mapping, ignoring it");
            GlobalSettings::default()
        }
    };

    let settings = Settings {
        global,
        exclude: entry_list(EXCLUDE_KEY, raw.shift_remove(EXCLUDE_KEY)),
        include: entry_list(INCLUDE_KEY, raw.shift_remove(INCLUDE_KEY)),
    };
    tracing::debug!(?settings, "settings extracted");

    (settings, raw)
}

/// Keep the mapping items of a list, drop everything else
fn entry_list(key: &str, value: Option<Value>) -> Vec<MatrixEntry> {
    let Some(value) = value else {
        return vec![];
    };

    let Value::Array(items) = value else {
        tracing::warn!(key, value=%value, "expected a list of mappings, ignoring it");
        return vec![];
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(entry) => Some(entry),
            other => {
                tracing::warn!(key, item=%other, "dropping item that is not a mapping");
                None
            }
        })
        .collect()
}
