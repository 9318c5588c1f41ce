//! the expansion pipeline and its output
use crate::changes::{self, ChangedFiles, Outcome, Summary};
use crate::config_source::RawConfig;
use crate::value::{Object, Value};
use crate::{dimension, expand, finalize, resolve, rules, settings};

/// A single fully resolved matrix entry
pub type MatrixEntry = Object;

/// Name of the fixed environment filter field
pub const ENVIRONMENT_KEY: &str = "environment";

/// Output names that are never surfaced as individual fields of a single entry
pub const RESERVED_OUTPUTS: [&str; 4] = ["matrix", "config", "length", "changes_detected"];

/// Caller options, applied after configuration level rules
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Requested primary dimension key
    pub dimension_key: Option<String>,
    /// Allowed primary dimension values, or a single dimension name
    pub target: Vec<String>,
    /// Allowed environments
    pub environment: Vec<String>,
    pub exclude: Vec<MatrixEntry>,
    pub include: Vec<MatrixEntry>,
    /// Changed files, `None` disables change detection
    pub change_detection: Option<ChangedFiles>,
}

/// The expanded matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub entries: Vec<MatrixEntry>,
    /// Resolved primary dimension key
    pub primary_key: String,
    /// Effective primary filter after resolution and change detection
    pub filter: Vec<String>,
    /// Keys of the dimensions that took part in the product, sorted
    pub dimension_keys: Vec<String>,
    /// Only set when change detection was enabled
    pub changes_detected: Option<bool>,
    /// Changed values found by change detection, if it ran
    pub changes: Option<Summary>,
}

/// The resolved primary dimension of a configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Primary {
    pub key: String,
    /// Canonical values, `None` when the configuration has no such dimension
    pub values: Option<Vec<String>>,
}

impl Matrix {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries nested by the values of every dimension, in sorted key order
    ///
    /// `{environment: dev, service: api, ..}` ends up at `tree["dev"]["api"]`. Entries that lack
    /// any dimension key (e.g. includes) are left out.
    pub fn config_tree(&self) -> Object {
        let mut root = Object::new();

        'entries: for entry in &self.entries {
            let mut path = Vec::with_capacity(self.dimension_keys.len());
            for key in &self.dimension_keys {
                let Some(value) = entry.get(key) else {
                    continue 'entries;
                };
                path.push(value.to_string());
            }

            let Some((leaf, parents)) = path.split_last() else {
                continue;
            };

            let mut node = &mut root;
            for segment in parents {
                let Some(child) = child_object(node, segment) else {
                    continue 'entries;
                };
                node = child;
            }
            node.insert(leaf.clone(), Value::Object(entry.clone()));
        }

        sort_tree(&mut root, self.dimension_keys.len());
        root
    }

    /// Fields of the only entry, stringified, without reserved output names
    ///
    /// Empty unless the matrix has exactly one entry.
    pub fn single_entry_outputs(&self) -> Vec<(&str, String)> {
        let [entry] = self.entries.as_slice() else {
            return vec![];
        };

        entry
            .iter()
            .filter(|(key, _)| !RESERVED_OUTPUTS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.to_string()))
            .collect()
    }
}

/// The nested object under `key`, created when missing
///
/// `None` when `key` already holds an entry, which cannot happen for complete entries since
/// every entry ends at the same depth.
fn child_object<'a>(node: &'a mut Object, key: &str) -> Option<&'a mut Object> {
    match node
        .entry(key.to_owned())
        .or_insert_with(|| Value::Object(Object::new()))
    {
        Value::Object(object) => Some(object),
        _ => None,
    }
}

fn sort_tree(node: &mut Object, depth: usize) {
    node.sort_keys();
    if depth <= 1 {
        return;
    }

    for child in node.values_mut() {
        if let Value::Object(child) = child {
            sort_tree(child, depth - 1);
        }
    }
}

fn resolve_target(settings: &settings::Settings, candidates: RawConfig, options: &Options) -> resolve::Target {
    let classified = dimension::classify(candidates);
    resolve::resolve(
        &classified,
        &settings.global.dimension_key,
        options.dimension_key.as_deref(),
        &options.target,
    )
}

/// Resolve the primary dimension without expanding anything
///
/// Tells a caller whether collecting changed files is worth it before calling [`expand`].
pub fn primary_dimension(raw: &RawConfig, options: &Options) -> Primary {
    let (settings, candidates) = settings::extract(raw.clone());
    let target = resolve_target(&settings, candidates, options);

    Primary {
        values: target.dimensions.get(&target.key).map(|d| d.value_names()),
        key: target.key,
    }
}

/// Run the full pipeline
///
/// extract settings → classify → resolve target → change detection → product and merge →
/// config exclude → config include → filters → caller exclude → caller include →
/// directories → sort
#[tracing::instrument(level = "trace", skip_all)]
pub fn expand(raw: RawConfig, options: &Options) -> Matrix {
    let (settings, candidates) = settings::extract(raw);
    let global = &settings.global;
    let target = resolve_target(&settings, candidates, options);

    let dimension_keys: Vec<String> = target.dimensions.keys().map(String::from).collect();
    let mut matrix = Matrix {
        entries: vec![],
        primary_key: target.key.clone(),
        filter: target.filter.clone(),
        dimension_keys,
        changes_detected: None,
        changes: None,
    };

    if let Some(changed_files) = &options.change_detection {
        let known = target.dimensions.get(&target.key).map(|d| d.value_names());
        if known.is_none() {
            tracing::info!(key = %target.key, "no such dimension, skipping change detection");
        }

        let (outcome, summary) =
            changes::evaluate(changed_files, &global.base_dir, known.as_deref(), &target.filter);
        matrix.changes = summary;

        match outcome {
            Outcome::Skipped => {}
            Outcome::Narrowed(filter) => matrix.filter = filter,
            Outcome::Unchanged => {
                tracing::info!("no entries with changes, matrix is empty");
                matrix.changes_detected = Some(false);
                return matrix;
            }
        }
    }

    let entries = expand::expand(&target.dimensions, &global.shared);
    let entries = rules::exclude(entries, &settings.exclude);
    let entries = rules::include(entries, &settings.include);
    let entries = rules::filter(entries, &matrix.primary_key, &matrix.filter);
    let entries = rules::filter(entries, ENVIRONMENT_KEY, &options.environment);
    let entries = rules::exclude(entries, &options.exclude);
    let mut entries = rules::include(entries, &options.include);

    finalize::assign_directories(&mut entries, &matrix.primary_key, &global.base_dir);
    finalize::sort(&mut entries, &global.sort_by);
    for entry in entries.iter_mut() {
        entry.sort_keys();
    }

    tracing::debug!(count = entries.len(), primary = %matrix.primary_key, "matrix expanded");
    matrix.changes_detected = options.change_detection.as_ref().map(|_| !entries.is_empty());
    matrix.entries = entries;
    matrix
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::raw_config;
    use pretty_assertions::assert_eq;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn column(matrix: &Matrix, key: &str) -> Vec<String> {
        matrix
            .entries
            .iter()
            .map(|entry| entry.get(key).map(ToString::to_string).unwrap_or_default())
            .collect()
    }

    fn scenario() -> RawConfig {
        raw_config! {r#"
        global:
          base_dir: deploy
        environment:
          dev: {acct: "1"}
          prod: {acct: "2"}
        service:
          api: ~
          web: ~
        "#}
    }

    #[test]
    fn environment_by_service() {
        let matrix = expand(scenario(), &Options::default());

        assert_eq!(matrix.len(), 4);
        assert_eq!(column(&matrix, "environment"), vec!["dev", "dev", "prod", "prod"]);
        assert_eq!(column(&matrix, "service"), vec!["api", "web", "api", "web"]);
        assert_eq!(column(&matrix, "acct"), vec!["1", "1", "2", "2"]);
        assert_eq!(
            column(&matrix, "directory"),
            vec!["deploy/api", "deploy/web", "deploy/api", "deploy/web"]
        );
        assert_eq!(matrix.changes_detected, None);
    }

    #[test]
    fn no_directory_without_base_dir_or_primary() {
        let matrix = expand(
            raw_config!("environment: {dev: {acct: '1'}}"),
            &Options::default(),
        );
        assert!(matrix.entries[0].get("directory").is_none());
    }

    #[test]
    fn config_exclude() {
        let matrix = expand(
            raw_config!("service: [a, b]\nexclude: [{service: b}]"),
            &Options::default(),
        );
        assert_eq!(column(&matrix, "service"), vec!["a"]);
    }

    #[test]
    fn config_include() {
        let matrix = expand(
            raw_config!("service: [a]\nenvironment: [dev]\ninclude: [{service: shared}]"),
            &Options::default(),
        );

        assert_eq!(matrix.len(), 2);
        let shared = matrix
            .entries
            .iter()
            .find(|entry| entry.get("service") == Some(&Value::from("shared")))
            .unwrap();
        assert!(shared.get("environment").is_none());
    }

    #[test]
    fn include_is_not_filtered_by_config_exclude() {
        let matrix = expand(
            raw_config!("service: [a]\nexclude: [{service: shared}]\ninclude: [{service: shared}]"),
            &Options::default(),
        );
        assert_eq!(matrix.len(), 2);
    }

    #[test]
    fn empty_dimension_yields_nothing() {
        let matrix = expand(
            raw_config!("values: []\nservice: [a, b, c]"),
            &Options::default(),
        );
        assert!(matrix.is_empty());
    }

    #[test]
    fn empty_map_dimension_yields_nothing() {
        let matrix = expand(
            raw_config!("service: {}\nenvironment: [dev, prod]"),
            &Options::default(),
        );
        assert!(matrix.is_empty());
    }

    #[test]
    fn duplicate_array_values_repeat_entries() {
        let matrix = expand(raw_config!("service: [api, api]"), &Options::default());

        assert_eq!(matrix.len(), 2);
        assert_eq!(column(&matrix, "service"), vec!["api", "api"]);
    }

    #[test]
    fn filters() {
        let options = Options {
            target: strings(&["web"]),
            environment: strings(&["prod"]),
            ..Default::default()
        };
        let matrix = expand(scenario(), &options);

        assert_eq!(matrix.len(), 1);
        assert_eq!(column(&matrix, "directory"), vec!["deploy/web"]);
    }

    #[test]
    fn caller_rules_apply_after_filters() {
        let options = Options {
            environment: strings(&["dev"]),
            exclude: vec![raw_config!("service: web")],
            include: vec![raw_config!("service: extra\nenvironment: qa")],
            ..Default::default()
        };
        let matrix = expand(scenario(), &options);

        assert_eq!(column(&matrix, "service"), vec!["api", "extra"]);
        // caller includes still get a directory
        assert_eq!(column(&matrix, "directory"), vec!["deploy/api", "deploy/extra"]);
    }

    #[test]
    fn target_switches_primary_dimension() {
        let raw = raw_config! {r#"
        service: [api, web]
        stack: [network, database]
        environment: [dev]
        "#};
        let options = Options {
            target: strings(&["stack"]),
            ..Default::default()
        };
        let matrix = expand(raw, &options);

        assert_eq!(matrix.primary_key, "stack");
        assert_eq!(matrix.dimension_keys, vec!["environment", "stack"]);
        assert_eq!(column(&matrix, "directory"), vec!["network", "database"]);
        assert!(matrix.entries.iter().all(|entry| !entry.contains_key("service")));
    }

    #[test]
    fn custom_sort_keys() {
        let raw = raw_config! {r#"
        global:
          sort_by: [service, environment]
        environment: [prod, dev]
        service: [web, api]
        "#};
        let matrix = expand(raw, &Options::default());

        assert_eq!(column(&matrix, "service"), vec!["api", "api", "web", "web"]);
        assert_eq!(column(&matrix, "environment"), vec!["dev", "prod", "dev", "prod"]);
    }

    #[test]
    fn entry_keys_are_sorted() {
        let matrix = expand(raw_config!("zeta: 1\nservice: [api]\nalpha: 2"), &Options::default());
        assert_eq!(
            matrix.entries[0].keys().collect::<Vec<_>>(),
            vec!["alpha", "directory", "service", "zeta"]
        );
    }

    #[test]
    fn change_detection_narrows() {
        let options = Options {
            change_detection: Some(ChangedFiles::Paths(strings(&["deploy/api/x.tf"]))),
            ..Default::default()
        };
        let matrix = expand(scenario(), &options);

        assert_eq!(column(&matrix, "service"), vec!["api", "api"]);
        assert_eq!(matrix.filter, vec!["api"]);
        assert_eq!(matrix.changes_detected, Some(true));
    }

    #[test]
    fn change_detection_reports_changed_values() {
        let options = Options {
            target: strings(&["web"]),
            change_detection: Some(ChangedFiles::Paths(strings(&[
                "deploy/api/x.tf",
                "docs/readme.md",
            ]))),
            ..Default::default()
        };
        let matrix = expand(scenario(), &options);

        assert!(matrix.is_empty());
        assert_eq!(
            matrix.changes,
            Some(Summary {
                files: 2,
                known: 2,
                changed: strings(&["api"]),
            })
        );
    }

    #[test]
    fn change_detection_without_primary_dimension_keeps_everything() {
        let options = Options {
            change_detection: Some(ChangedFiles::Paths(vec![])),
            ..Default::default()
        };
        let matrix = expand(raw_config!("environment: [dev, prod]"), &options);

        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.changes, None);
        assert_eq!(matrix.changes_detected, Some(true));
    }

    #[test]
    fn primary_dimension_values() {
        let primary = primary_dimension(&scenario(), &Options::default());
        assert_eq!(
            primary,
            Primary {
                key: "service".to_string(),
                values: Some(strings(&["api", "web"])),
            }
        );

        let options = Options {
            target: strings(&["environment"]),
            ..Default::default()
        };
        let primary = primary_dimension(&scenario(), &options);
        assert_eq!(primary.key, "environment");
        assert_eq!(primary.values, Some(strings(&["dev", "prod"])));
    }

    #[test]
    fn primary_dimension_missing() {
        let primary = primary_dimension(&raw_config!("environment: [dev]"), &Options::default());

        assert_eq!(primary.key, "service");
        assert_eq!(primary.values, None);
    }

    #[test]
    fn change_detection_without_changes_is_empty() {
        let options = Options {
            change_detection: Some(ChangedFiles::Paths(strings(&["docs/readme.md"]))),
            include: vec![raw_config!("service: extra")],
            ..Default::default()
        };
        let matrix = expand(scenario(), &options);

        assert!(matrix.is_empty());
        assert_eq!(matrix.changes_detected, Some(false));
    }

    #[test]
    fn change_detection_not_applicable_keeps_everything() {
        let options = Options {
            change_detection: Some(ChangedFiles::NotApplicable),
            ..Default::default()
        };
        let matrix = expand(scenario(), &options);

        assert_eq!(matrix.len(), 4);
        assert_eq!(matrix.changes_detected, Some(true));
    }

    #[test]
    fn change_detection_intersects_target() {
        let options = Options {
            target: strings(&["web"]),
            change_detection: Some(ChangedFiles::Paths(strings(&[
                "deploy/api/x.tf",
                "deploy/web/y.tf",
            ]))),
            ..Default::default()
        };
        let matrix = expand(scenario(), &options);

        assert_eq!(column(&matrix, "service"), vec!["web", "web"]);
    }

    #[test]
    fn config_tree() {
        let matrix = expand(scenario(), &Options::default());
        let tree = Value::Object(matrix.config_tree());

        let Value::Object(prod) = &tree.as_object().unwrap()["prod"] else {
            panic!("prod must be an object");
        };
        let Value::Object(web) = &prod["web"] else {
            panic!("web must be an object");
        };
        assert_eq!(web.get("acct"), Some(&Value::from("2")));
        assert_eq!(web.get("directory"), Some(&Value::from("deploy/web")));
    }

    #[test]
    fn config_tree_skips_incomplete_entries() {
        let matrix = expand(
            raw_config!("service: [a]\nenvironment: [dev]\ninclude: [{service: shared}]"),
            &Options::default(),
        );
        let tree = matrix.config_tree();

        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["dev"]);
    }

    #[test]
    fn tree_nodes_never_replace_entries() {
        let mut root = Object::new();
        root.insert("dev".to_string(), Value::from("leaf"));

        assert!(child_object(&mut root, "dev").is_none());
        assert!(child_object(&mut root, "prod").is_some());
        assert_eq!(root.get("dev"), Some(&Value::from("leaf")));
    }

    #[test]
    fn single_entry_outputs() {
        let matrix = expand(
            raw_config!("service: [api]\nlength: 3\nreplicas: 2"),
            &Options::default(),
        );

        assert_eq!(
            matrix.single_entry_outputs(),
            vec![
                ("directory", "api".to_string()),
                ("replicas", "2".to_string()),
                ("service", "api".to_string()),
            ]
        );
    }

    #[test]
    fn no_single_entry_outputs_for_many_entries() {
        let matrix = expand(scenario(), &Options::default());
        assert!(matrix.single_entry_outputs().is_empty());
    }
}
