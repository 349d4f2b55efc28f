use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

use crate::error::SubmitError;

/// The sbatch executable used to submit job scripts
pub struct Sbatch {
    pub program: PathBuf,
}

impl Sbatch {
    /// Submit a job script, returning the SLURM job id
    pub fn submit(&self, job_script: &Path) -> Result<String, SubmitError> {
        let mut sbatch = Command::new(&self.program);
        let cmd = sbatch.arg("--parsable").arg(job_script);
        info!("Running sbatch process");
        info!("{:?}", &cmd);

        let output = cmd.output().map_err(|source| SubmitError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SubmitError::Rejected(output.status, stderr));
        }

        parse_job_id(&String::from_utf8_lossy(&output.stdout)).ok_or(SubmitError::MissingJobId)
    }
}

/// Pull the job id out of sbatch output
///
/// `--parsable` prints `jobid` or `jobid;cluster`. Letters and whitespace are
/// dropped so plain `Submitted batch job 42` works too.
pub fn parse_job_id(stdout: &str) -> Option<String> {
    let first = stdout.trim().split(';').next()?;
    let job_id: String = first
        .chars()
        .filter(|c| !c.is_alphabetic() && !c.is_whitespace())
        .collect();

    match job_id.is_empty() {
        true => None,
        false => Some(job_id),
    }
}
