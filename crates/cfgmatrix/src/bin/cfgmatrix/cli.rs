//! cfgmatrix cli interface
//!
//! Every input of `expand` can also be set through the environment variables a GitHub
//! Action receives (`INPUT_*`).

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = ".github/matrix-config.json";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; cfgmatrix ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Expand a matrix configuration
    #[command(alias = "x")]
    Expand(ExpandCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct ExpandCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Configuration file (.json, .yaml or .yml)
    #[clap(
        short = 'f',
        long = "config",
        env = "INPUT_CONFIG_PATH",
        default_value = DEFAULT_CONFIG_PATH
    )]
    pub config_path: PathBuf,

    /// Primary dimension key, overrides `global.dimension_key`
    #[clap(short = 'k', long = "dimension-key", env = "INPUT_DIMENSION_KEY")]
    pub dimension_key: Option<String>,

    /// Comma separated primary dimension values, or a single dimension name
    #[clap(short = 't', long, env = "INPUT_TARGET", default_value = "")]
    pub target: String,

    /// Comma separated environments
    #[clap(short = 'e', long, env = "INPUT_ENVIRONMENT", default_value = "")]
    pub environment: String,

    /// JSON array of patterns to exclude
    #[clap(long, env = "INPUT_EXCLUDE")]
    pub exclude: Option<String>,

    /// JSON array of entries to include
    #[clap(long, env = "INPUT_INCLUDE")]
    pub include: Option<String>,

    /// Only keep primary dimension values with changed files (`true` to enable)
    #[clap(
        long = "change-detection",
        env = "INPUT_CHANGE_DETECTION",
        default_value = "false",
        action = clap::ArgAction::Set,
        value_parser = parse_switch
    )]
    pub change_detection: bool,
}

impl InputArgs {
    /// Configuration path, falling back to the default for a blank input
    pub fn config_path(&self) -> PathBuf {
        if self.config_path.as_os_str().is_empty() {
            PathBuf::from(DEFAULT_CONFIG_PATH)
        } else {
            self.config_path.clone()
        }
    }
}

fn parse_switch(value: &str) -> Result<bool, std::convert::Infallible> {
    Ok(value.trim() == "true")
}

/// Split a comma separated list, dropping blank items
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,

    /// Write outputs for GitHub Actions instead of printing the matrix
    #[arg(long = "github-output")]
    pub github: bool,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    /// Configuration file (.json, .yaml or .yml)
    #[clap(
        short = 'f',
        long = "config",
        env = "INPUT_CONFIG_PATH",
        default_value = DEFAULT_CONFIG_PATH
    )]
    pub config_path: PathBuf,

    #[command(subcommand)]
    pub command: DevSubCommand,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    Settings,
    Dimensions,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lists_are_trimmed() {
        assert_eq!(parse_list(" api, web ,,"), vec!["api", "web"]);
        assert!(parse_list("  ").is_empty());
    }

    #[test]
    fn switch_only_accepts_true() {
        assert_eq!(parse_switch("true"), Ok(true));
        assert_eq!(parse_switch("false"), Ok(false));
        assert_eq!(parse_switch(""), Ok(false));
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
