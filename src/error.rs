use std::process::ExitStatus;

use thiserror::Error;

/// Problems with user input, raised before anything touches the filesystem or the scheduler
#[derive(Error, Debug)]
pub enum InputError {
    #[error("malformed duration '{0}': {1}")]
    MalformedDuration(String, String),
    #[error("no commands to run")]
    NoCommands,
    #[error("maximum array size must be at least 1")]
    InvalidBatchSize,
    #[error("run directory '{0}' can't be written into a job script, avoid spaces, quotes and shell characters")]
    UnsafeRunDir(String),
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("can't execute {program}: {source}. Are you on a machine that can submit SLURM jobs?")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("sbatch rejected the job ({0}): {1}")]
    Rejected(ExitStatus, String),
    #[error("sbatch didn't report a job id")]
    MissingJobId,
}
