//! # cfgmatrix - dimensional configuration to build matrix
//!
//! ## Introduction for developers
//!
//! Read this to understand how `cfgmatrix` works internally.
//!
//! ### Terms
//!
//! ```yaml
//! global:               # reserved: control fields and shared values
//!   base_dir: deploy
//!   terraform: "1.7"
//!
//! environment:          # map dimension: keys are values, nested mappings are per-value configuration
//!   dev:  { account: "111111111111" }
//!   prod: { account: "222222222222" }
//!
//! service: [api, web]   # array dimension
//!
//! owner: platform       # scalar setting, copied into every entry
//!
//! exclude:              # reserved: patterns
//!   - { service: web, environment: dev }
//!
//! include:              # reserved: standalone entries
//!   - { service: monitoring }
//! ```
//!
//! - a `dimension` is a named axis, every entry carries exactly one of its values
//! - the `primary dimension` (`global.dimension_key`, default `service`) is used for
//!   filtering, change detection and the synthesized `directory` field
//! - a `pattern` is a partial entry, it matches when all of its fields are equal
//!
//! ### Loading
//!
//! see [config_source::load_file]
//!
//! JSON and YAML are normalized into [value::Value]. All comparisons use the canonical
//! string form of a value, never native equality.
//!
//! ### Pipeline
//!
//! see [matrix::expand]
//!
//! 1. [settings::extract] removes `global`, `exclude` and `include`
//! 2. [dimension::classify] sorts every other key into array dimensions, map dimensions or scalars
//! 3. [resolve::resolve] picks the primary dimension, possibly swapping it for another
//! 4. [changes::evaluate] narrows the primary dimension to values with changed files
//! 5. [expand::expand] builds the cartesian product and merges configuration layers
//! 6. [rules] applies configuration exclude/include, the filters, then caller exclude/include
//! 7. [finalize] adds `directory` and sorts
//!
//! Each stage is a plain function over owned or borrowed data. Nothing is shared between
//! runs.
//!
//! ### Output
//!
//! [matrix::Matrix] holds the entries plus the conveniences callers want: a tree of entries
//! keyed by dimension values ([matrix::Matrix::config_tree]) and the fields of a lone entry
//! ([matrix::Matrix::single_entry_outputs]).
//!
pub mod changes;
pub mod config_source;
pub mod dimension;
pub mod expand;
pub mod finalize;
pub mod matrix;
pub mod resolve;
pub mod rules;
pub mod settings;
pub mod value;
