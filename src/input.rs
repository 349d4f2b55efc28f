//! Read the command list and derive names from it

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use log::info;

use crate::error::InputError;

/// Read commands from a file, or from stdin when `source` is `-`
///
/// Surrounding whitespace is trimmed, then each line is one command. Blank
/// lines in the middle are kept so that line numbers still line up with
/// array task indices.
pub fn read_commands(source: &str) -> Result<Vec<String>> {
    let text = match source {
        "-" => {
            info!("Reading commands from standard input");
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("Can't read commands from stdin")?;
            text
        }
        path => {
            info!("Reading commands from {path}");
            fs::read_to_string(path).with_context(|| format!("Can't read commands file {path}"))?
        }
    };
    Ok(split_commands(&text)?)
}

pub fn split_commands(text: &str) -> Result<Vec<String>, InputError> {
    let text = text.trim();
    match text.is_empty() {
        true => Err(InputError::NoCommands),
        false => Ok(text.lines().map(str::to_string).collect()),
    }
}

/// Executable of the first command, reduced to letters and digits (`/usr/bin/blastn -q x` -> `blastn`)
pub fn command_stem(first_command: &str) -> String {
    let executable = first_command.split_whitespace().next().unwrap_or_default();
    let base = executable.rsplit('/').next().unwrap_or_default();
    base.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Default run directory name, e.g. `j2024-03-01_09-15-00_blastn_etal`
pub fn timestamp_name<Tz: TimeZone>(now: &DateTime<Tz>, stem: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}_etal", now.format("j%Y-%m-%d_%H-%M-%S"), stem)
}

/// `-r logs/run/` and `-r logs/run` are the same run directory
///
/// The run directory ends up unquoted in `#SBATCH --output` and in the task
/// body, so anything the shell or sbatch would interpret is rejected.
pub fn normalize_run_dir(run_dir: &str) -> Result<String, InputError> {
    let trimmed = run_dir.trim_end_matches('/');
    let normalized = match trimmed.is_empty() {
        true => run_dir,
        false => trimmed,
    };
    match is_script_safe(normalized) {
        true => Ok(normalized.to_string()),
        false => Err(InputError::UnsafeRunDir(normalized.to_string())),
    }
}

/// True if `path` can be pasted into a job script without quoting
pub fn is_script_safe(path: &str) -> bool {
    !path.is_empty()
        && !path.chars().any(|c| c.is_whitespace() || "\"'$`\\;&|<>()*?%!#".contains(c))
}

/// SLURM job name, the last component of the run directory
pub fn job_name(run_dir: &str) -> String {
    Path::new(run_dir)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| run_dir.to_string())
}
