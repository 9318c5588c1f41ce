//! changed files via `git diff`
//!
//! The diff base depends on the GitHub event that triggered the run:
//! - `pull_request`, `pull_request_target`: `origin/$GITHUB_BASE_REF...HEAD`
//! - `push`: `HEAD~1`
//! - anything else: not applicable, nothing is filtered
use anyhow::Context;
use cfgmatrix::changes::ChangedFiles;
use std::process::Command;

pub fn changed_files() -> anyhow::Result<ChangedFiles> {
    let event = std::env::var("GITHUB_EVENT_NAME").unwrap_or_default();
    let workspace = std::env::var("GITHUB_WORKSPACE")
        .ok()
        .filter(|workspace| !workspace.is_empty())
        .unwrap_or_else(|| ".".to_string());

    let Some(args) = diff_args(&event, std::env::var("GITHUB_BASE_REF").ok())? else {
        tracing::debug!(event = %event, "no diff base for event");
        return Ok(ChangedFiles::NotApplicable);
    };

    // containers often check out the workspace as another user
    let safe_directory = Command::new("git")
        .args(["config", "--global", "--add", "safe.directory", workspace.as_str()])
        .status();
    if let Err(error) = safe_directory {
        tracing::debug!(%error, "unable to mark workspace as safe directory");
    }

    tracing::info!(?args, workspace = %workspace, "running git");
    let output = Command::new("git")
        .args(&args)
        .current_dir(&workspace)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    anyhow::ensure!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr).trim()
    );

    Ok(ChangedFiles::Paths(parse_paths(&String::from_utf8_lossy(
        &output.stdout,
    ))))
}

fn diff_args(event: &str, base_ref: Option<String>) -> anyhow::Result<Option<Vec<String>>> {
    let args = match event {
        "pull_request" | "pull_request_target" => {
            let base_ref = base_ref
                .filter(|base_ref| !base_ref.is_empty())
                .with_context(|| format!("GITHUB_BASE_REF not set for {event} event"))?;
            vec![
                "diff".to_string(),
                "--name-only".to_string(),
                format!("origin/{base_ref}...HEAD"),
            ]
        }
        "push" => vec![
            "diff".to_string(),
            "--name-only".to_string(),
            "HEAD~1".to_string(),
        ],
        _ => return Ok(None),
    };

    Ok(Some(args))
}

fn parse_paths(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
