//! Every submitted array job is logged to a plain text history file
//!
//! The file is tab separated with one job per line: `job id`, `timestamp name`, `run directory`.
//! It's only ever appended to, and only after sbatch accepts a job.

use std::env;
use std::path::PathBuf;

/// Parse and render history lines
pub mod record;
/// Load and append job records
pub mod store;

/// Name of the hidden history file
pub static HISTORY_FILE: &str = ".slurm_array_jobnums";

/// `$WORK/.slurm_array_jobnums`, or `./.slurm_array_jobnums` when `$WORK` isn't set
pub fn default_path() -> PathBuf {
    match env::var_os("WORK") {
        Some(work) if !work.is_empty() => PathBuf::from(work).join(HISTORY_FILE),
        _ => PathBuf::from(HISTORY_FILE),
    }
}
