use log::info;

use crate::error::InputError;
use crate::plan::walltime::WallTime;

/// How a command list maps onto one SLURM array job
///
/// When the list fits into a single array (`batch_count == 1`) every task runs
/// exactly one command. Otherwise the array is capped at `max_per_batch` tasks
/// and each task runs `batch_count` commands one after another, so the time
/// limit of a task has to cover all of them (`aggregate`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchPlan {
    pub total_commands: usize,
    pub max_per_batch: usize,
    pub batch_count: usize,
    pub per_batch: WallTime,
    pub aggregate: Option<WallTime>,
}

pub fn plan(total_commands: usize, max_per_batch: usize, per_batch_spec: &str) -> Result<BatchPlan, InputError> {
    if total_commands == 0 {
        return Err(InputError::NoCommands);
    }
    if max_per_batch == 0 {
        return Err(InputError::InvalidBatchSize);
    }

    let per_batch: WallTime = per_batch_spec.parse()?;
    let batch_count = total_commands.div_ceil(max_per_batch);
    let aggregate = match batch_count > 1 {
        true => Some(per_batch * batch_count as u64),
        false => None,
    };

    if let Some(time) = &aggregate {
        info!("{total_commands} commands exceed the array limit of {max_per_batch}, each task runs {batch_count} commands in sequence (time limit {time})");
    }

    Ok(BatchPlan { total_commands, max_per_batch, batch_count, per_batch, aggregate })
}

impl BatchPlan {
    pub fn is_single(&self) -> bool {
        self.batch_count <= 1
    }

    /// Number of array tasks to request
    pub fn array_size(&self) -> usize {
        match self.is_single() {
            true => self.total_commands,
            false => self.max_per_batch,
        }
    }

    /// Value for `#SBATCH --array`, zero based, throttled to `concurrency` running tasks
    pub fn array_range(&self, concurrency: u32) -> String {
        format!("0-{}%{}", self.array_size() - 1, concurrency)
    }

    /// Value for `#SBATCH --time`
    ///
    /// A single batch keeps the user's own `--time` text untouched.
    pub fn time_limit(&self, job_time: &str) -> String {
        match &self.aggregate {
            Some(time) => time.to_string(),
            None => job_time.to_string(),
        }
    }

    /// Zero based command indices run by one array task, in execution order
    ///
    /// Indices past the end of the command list are left out. The job script
    /// loop uses the same formula.
    pub fn task_commands(&self, task_index: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.batch_count)
            .map(move |step| task_index * self.batch_count + step)
            .filter(move |index| *index < self.total_commands)
    }
}
