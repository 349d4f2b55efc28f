//! Decide how a command list is packed into a SLURM array job

/// Scheduler-style wall clock times (`D-HH:MM:SS` and friends)
pub mod walltime;

/// Split a command list into batches and size the time limit to match
pub mod batch;
