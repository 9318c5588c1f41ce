mod cli;
mod git;
mod github;

use anyhow::Context;
use cfgmatrix::changes::ChangedFiles;
use cfgmatrix::config_source::RawConfig;
use cfgmatrix::matrix::{Matrix, Options};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("CFGMATRIX_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Expand(expand_cli) => expand(expand_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        github::error(&format!("{e:#}"));
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn expand(cli: cli::ExpandCommand) -> anyhow::Result<()> {
    let mut options = options(&cli.input).context("invalid inputs")?;
    let raw = cfgmatrix::config_source::load_file(&cli.input.config_path())?;

    if cli.input.change_detection {
        options.change_detection = Some(detect_changes(&raw, &options, git::changed_files)?);
    }

    let matrix = cfgmatrix::matrix::expand(raw, &options);

    if cli.output.github {
        github::publish(&github::Outputs::from_env(), &matrix)?;
        log_summary(&options, &matrix)?;
    } else {
        output(&cli.output, &matrix)?;
    }

    Ok(())
}

/// Changed files for the resolved primary dimension
///
/// `changed_files` is only called when the configuration has that dimension.
fn detect_changes(
    raw: &RawConfig,
    options: &Options,
    changed_files: impl FnOnce() -> anyhow::Result<ChangedFiles>,
) -> anyhow::Result<ChangedFiles> {
    let primary = cfgmatrix::matrix::primary_dimension(raw, options);
    if primary.values.is_none() {
        github::notice(&format!(
            "No {} dimension in config, skipping change detection",
            primary.key
        ));
        return Ok(ChangedFiles::NotApplicable);
    }

    let changed_files = changed_files().context("failed to detect changed files")?;
    if changed_files == ChangedFiles::NotApplicable {
        github::notice("Change detection not applicable for this event type, including all entries");
    }

    Ok(changed_files)
}

fn options(input: &cli::InputArgs) -> anyhow::Result<Options> {
    let mut options = Options {
        dimension_key: input.dimension_key.clone().filter(|key| !key.is_empty()),
        target: cli::parse_list(&input.target),
        environment: cli::parse_list(&input.environment),
        ..Default::default()
    };

    if let Some(exclude) = input.exclude.as_deref().filter(|json| !json.trim().is_empty()) {
        options.exclude = cfgmatrix::rules::parse_entries(exclude).context("invalid exclude JSON")?;
    }

    if let Some(include) = input.include.as_deref().filter(|json| !json.trim().is_empty()) {
        options.include = cfgmatrix::rules::parse_entries(include).context("invalid include JSON")?;
    }

    Ok(options)
}

fn log_summary(options: &Options, matrix: &Matrix) -> anyhow::Result<()> {
    if let Some(changes) = &matrix.changes {
        github::notice(&format!(
            "Detected {} changed files, {}/{} {}(s) with changes: {:?}",
            changes.files,
            changes.changed.len(),
            changes.known,
            matrix.primary_key,
            changes.changed
        ));
    }
    if matrix.changes_detected == Some(false) {
        github::notice("No entries with changes, matrix is empty");
    }
    if !matrix.filter.is_empty() {
        github::notice(&format!("Filtered by {}: {:?}", matrix.primary_key, matrix.filter));
    }
    if !options.environment.is_empty() {
        github::notice(&format!("Filtered by environment: {:?}", options.environment));
    }
    if !options.exclude.is_empty() {
        github::notice("Applied input exclude filter");
    }
    if !options.include.is_empty() {
        github::notice("Applied input include filter");
    }

    github::notice("Matrix configuration loaded successfully:");
    println!("{}", serde_json::to_string_pretty(&matrix.entries)?);
    Ok(())
}

fn output(output: &cli::OutputArgs, matrix: &Matrix) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), &matrix.entries)?,
        cli::OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), &matrix.entries)?;
            println!();
        }
    };

    Ok(())
}

/// (cfgmatrix-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    let raw = cfgmatrix::config_source::load_file(&cli.config_path)?;
    let (settings, candidates) = cfgmatrix::settings::extract(raw);

    match cli.command {
        Settings => println!("{settings:#?}"),
        Dimensions => println!("{:#?}", cfgmatrix::dimension::classify(candidates)),
    }

    Ok(())
}
