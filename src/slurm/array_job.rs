use std::path::PathBuf;

use crate::plan::batch::BatchPlan;

/// A fully resolved array job, ready to be rendered into an sbatch script
///
/// Built once per invocation from the command line options, the batch plan and
/// the resolved holds. Optional directives are left out of the script when None.
#[derive(Debug, Clone)]
pub struct ArrayJob {
    /// SLURM job name (last component of the run directory)
    pub name: String,
    pub run_dir: PathBuf,
    /// `commands.txt` inside the run directory, one command per line
    pub commands_file: PathBuf,
    pub plan: BatchPlan,
    /// `--time` value, see [`BatchPlan::time_limit`]
    pub time: String,
    /// `--array` value, see [`BatchPlan::array_range`]
    pub array: String,
    pub partition: Option<String>,
    pub memory: String,
    pub processors: u32,
    pub work_dir: Option<String>,
    pub mail_user: Option<String>,
    pub mail_type: String,
    pub modules: Vec<String>,
    /// `--dependency` value, None when there's nothing to hold for
    pub dependency: Option<String>,
}

impl ArrayJob {
    /// Path of the job script inside the run directory: `<run_dir>/<name>.sh`
    pub fn script_path(&self) -> PathBuf {
        self.run_dir.join(format!("{}.sh", self.name))
    }
}
