//! loading a [RawConfig] from a JSON or YAML file
//!
//! The source format is picked by file extension (`.json`, `.yaml`, `.yml`). Whatever the
//! syntax, the root must be a mapping; its values are normalized into [Value].
use crate::value::{Object, Value};
use std::path::{Path, PathBuf};

/// Root mapping of a configuration file
pub type RawConfig = Object;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

/// Parse configuration text
pub fn parse_str(text: &str, format: Format) -> Result<RawConfig, ParseError> {
    let value: Value = match format {
        Format::Json => serde_json::from_str::<serde_json::Value>(text)?.into(),
        Format::Yaml => serde_yaml::from_str::<serde_yaml::Value>(text)?.into(),
    };

    match value {
        Value::Object(object) => Ok(object),
        _ => Err(ParseError::NotAnObject),
    }
}

/// Read and parse a configuration file
pub fn load_file(path: &Path) -> Result<RawConfig, LoadError> {
    let format =
        Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat(path.to_owned()))?;

    let contents = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path.to_owned())
        } else {
            LoadError::Io {
                path: path.to_owned(),
                source,
            }
        }
    })?;
    tracing::info!(path=%path.display(), ?format, "loading configuration");

    parse_str(&contents, format).map_err(|source| LoadError::Parse {
        path: path.to_owned(),
        source,
    })
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML")]
    Yaml(#[from] serde_yaml::Error),
    #[error("configuration must be an object")]
    NotAnObject,
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read configuration file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file type {}. Use .json, .yaml, or .yml", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("unable to parse configuration file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Utility macro to create a [RawConfig] from YAML text
///
/// ```
/// # use cfgmatrix::raw_config;
/// let raw = raw_config!("service: [api, web]");
/// assert_eq!(raw.len(), 1);
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use cfgmatrix::raw_config;
/// raw_config!("- not\n- a mapping");
/// ```
#[macro_export]
macro_rules! raw_config {
    { $yaml:expr } => {
        $crate::config_source::parse_str($yaml, $crate::config_source::Format::Yaml)
            .expect("config must parse")
    };
}
