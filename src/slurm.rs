//! Write array job scripts and submit them to SLURM

/// Everything needed to render one array job script
pub mod array_job;

/// Render the job script templates and write them to disk
pub mod script;

/// Create, fill and roll back run directories
pub mod rundir;

/// Hand job scripts to sbatch
pub mod submit;
