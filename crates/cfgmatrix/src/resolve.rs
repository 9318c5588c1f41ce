//! primary dimension ("target") resolution
//!
//! The primary dimension is the one callers filter by, detect changes for and derive the
//! `directory` field from. It defaults to `global.dimension_key` and can be switched in two
//! ways, checked in order:
//!
//! 1. an explicitly requested key that names a dimension
//! 2. a single filter value that names a dimension (instead of a value)
//!
//! Switching *replaces* the configured primary dimension: it is dropped from the dimension
//! set and no longer contributes to the product.
//!
//! A single filter value that is both a value of the primary dimension and the key of
//! another dimension is read as a switch.
use crate::dimension::Classified;

/// Result of resolving the primary dimension
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Dimensions that take part in the product
    pub dimensions: Classified,
    /// Resolved primary dimension key
    pub key: String,
    /// Allowed values for the primary dimension, empty means all
    pub filter: Vec<String>,
}

#[tracing::instrument(level = "trace", skip(classified))]
pub fn resolve(
    classified: &Classified,
    configured_key: &str,
    requested_key: Option<&str>,
    filter: &[String],
) -> Target {
    if let Some(requested) = requested_key.filter(|key| !key.is_empty()) {
        if requested != configured_key && classified.contains(requested) {
            tracing::debug!(from = configured_key, to = requested, "switching primary dimension");
            return Target {
                dimensions: classified.without(configured_key),
                key: requested.to_string(),
                filter: filter.to_vec(),
            };
        }

        if !classified.contains(requested) {
            tracing::warn!(key = requested, "requested dimension key does not exist, ignoring it");
        }
    }

    if let [single] = filter {
        if single == configured_key && classified.contains(single) {
            // selecting the primary dimension by name selects all of its values
            return Target {
                dimensions: classified.clone(),
                key: configured_key.to_string(),
                filter: vec![],
            };
        }

        if classified.contains(single) {
            tracing::debug!(from = configured_key, to = %single, "target names a dimension, switching");
            return Target {
                dimensions: classified.without(configured_key),
                key: single.clone(),
                filter: vec![],
            };
        }
    }

    Target {
        dimensions: classified.clone(),
        key: configured_key.to_string(),
        filter: filter.to_vec(),
    }
}
