//! GitHub Actions outputs and workflow commands
use cfgmatrix::matrix::Matrix;
use std::io::Write;
use std::path::PathBuf;

/// Destination of `name=value` outputs
#[derive(Debug)]
pub enum Outputs {
    /// `$GITHUB_OUTPUT`
    File(PathBuf),
    Stdout,
    Stderr,
    /// `::set-output` workflow command, used when `$GITHUB_OUTPUT` is unset
    Legacy,
}

impl Outputs {
    pub fn from_env() -> Self {
        match std::env::var_os("GITHUB_OUTPUT") {
            None => Outputs::Legacy,
            Some(path) if path.is_empty() => Outputs::Legacy,
            Some(path) if path == "/dev/stdout" => Outputs::Stdout,
            Some(path) if path == "/dev/stderr" => Outputs::Stderr,
            Some(path) => Outputs::File(path.into()),
        }
    }

    pub fn set(&self, name: &str, value: &str) {
        let result = match self {
            Outputs::Legacy => {
                println!("::set-output name={name}::{value}");
                return;
            }
            Outputs::Stdout => write_output(&mut std::io::stdout().lock(), name, value),
            Outputs::Stderr => write_output(&mut std::io::stderr().lock(), name, value),
            Outputs::File(path) => std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .and_then(|mut file| write_output(&mut file, name, value)),
        };

        if let Err(error) = result {
            tracing::warn!(%error, name, "failed to write output, falling back to ::set-output");
            println!("::set-output name={name}::{value}");
        }
    }
}

fn write_output(writer: &mut impl Write, name: &str, value: &str) -> std::io::Result<()> {
    if value.contains('\n') {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or_default();
        let delimiter = format!("ghadelimiter_{nanos}");
        writeln!(writer, "{name}<<{delimiter}\n{value}\n{delimiter}")
    } else {
        writeln!(writer, "{name}={value}")
    }
}

pub fn notice(message: &str) {
    println!("::notice::{message}");
}

pub fn error(message: &str) {
    println!("::error::{message}");
}

/// Write every output derived from the matrix
pub fn publish(outputs: &Outputs, matrix: &Matrix) -> anyhow::Result<()> {
    outputs.set("matrix", &serde_json::to_string(&matrix.entries)?);
    outputs.set("length", &matrix.len().to_string());
    outputs.set("config", &serde_json::to_string(&matrix.config_tree())?);

    for (name, value) in matrix.single_entry_outputs() {
        outputs.set(name, &value);
    }

    if let Some(changes_detected) = matrix.changes_detected {
        outputs.set("changes_detected", &changes_detected.to_string());
    }

    Ok(())
}
