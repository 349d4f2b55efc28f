use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{CommandFactory, Parser};
use log::{info, warn};

use crate::error::InputError;
use crate::history::record::JobRecord;
use crate::history::store::{FileHistory, HistoryStore};
use crate::hold::pattern::NamePattern;
use crate::hold::resolve::{resolve_from, HoldSpec};
use crate::plan::walltime::WallTime;
use crate::slurm::array_job::ArrayJob;
use crate::slurm::rundir::RunDirectory;
use crate::slurm::submit::Sbatch;

mod error;
mod history;
mod hold;
mod input;
mod plan;
mod slurm;

/// Runs a list of commands specified on stdin as a SLURM array job.
///
/// Example usage: `cat commands.txt | slurm-array` or `slurm-array -c commands.txt`
#[derive(Parser, Debug)]
#[command(name = "slurm-array", version)]
struct Args {
    /// The file to read commands from, - means standard input
    #[arg(short = 'c', long = "commandsfile", default_value = "-")]
    commands_file: String,

    /// The partition(s) to send the commands to. Default: all partitions you have access to
    #[arg(short, long)]
    queue: Option<String>,

    /// Amount of RAM to request for each command, and the maximum each can use without being killed
    #[arg(short, long, default_value = "4gb")]
    memory: String,

    /// Maximum time for the job to run, e.g. 04:00:00 or 2-12:00:00
    #[arg(short, long, default_value = "04:00:00")]
    time: String,

    /// Time allowed for each command when the list is split into sequential batches
    #[arg(long, default_value = "24:00:00")]
    batch_time: String,

    /// Largest array the scheduler accepts, longer command lists are run in sequential batches
    #[arg(long, default_value_t = 900)]
    max_array_size: usize,

    /// Maximum number of commands that can be run simultaneously across any number of machines
    #[arg(short = 'b', long, default_value_t = 2000, value_parser = clap::value_parser!(u32).range(1..))]
    concurrency: u32,

    /// Number of processors to reserve for each command
    #[arg(short = 'P', long, default_value_t = 1)]
    processors: u32,

    /// Modules to load before running commands, e.g. R/3.3 python/3.6
    #[arg(short = 'l', long = "module", num_args = 1..)]
    modules: Vec<String>,

    /// Email address to send notifications to
    #[arg(short = 'M', long)]
    mail: Option<String>,

    /// Type of email notification to send if --mail is set
    #[arg(long, default_value = "ALL", value_parser = ["BEGIN", "END", "FAIL", "ALL"])]
    mailtype: String,

    /// Job name and directory to create or OVERWRITE with logs and output of the commands.
    /// Default: jYEAR-MON-DAY_HOUR-MIN-SEC_<cmd>_etal where <cmd> is the first word of the first command
    #[arg(short, long)]
    rundir: Option<String>,

    /// Working directory for the job
    #[arg(short, long = "working-directory")]
    working_directory: Option<String>,

    /// Hold until all array jobs in the job history have finished
    #[arg(long)]
    hold: bool,

    /// Hold until these job ids have finished, e.g. 151235,151239
    #[arg(long = "hold_jids", value_delimiter = ',')]
    hold_jids: Vec<String>,

    /// Hold until jobs with these run directories have finished (comma separated, regular expressions allowed)
    #[arg(long = "hold_names", value_delimiter = ',')]
    hold_names: Vec<NamePattern>,

    /// Job history file. Default: $WORK/.slurm_array_jobnums
    #[arg(long, env = "SLURM_ARRAY_HISTORY")]
    history: Option<PathBuf>,

    /// sbatch executable
    #[arg(long, env = "SLURM_ARRAY_SBATCH", default_value = "sbatch")]
    sbatch: PathBuf,

    /// Create the directory and script, but do not submit
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<()> {
    if args.commands_file == "-" && std::io::stdin().is_terminal() {
        Args::command().print_help()?;
        return Err(InputError::NoCommands.into());
    }
    let commands = input::read_commands(&args.commands_file)?;

    // all input checks happen before anything is written
    args.time.parse::<WallTime>()?;
    let plan = plan::batch::plan(commands.len(), args.max_array_size, &args.batch_time)?;

    let hold = HoldSpec {
        hold_all: args.hold,
        job_ids: args.hold_jids,
        name_patterns: args.hold_names,
    };
    let mut job_history = FileHistory::new(&args.history.unwrap_or_else(history::default_path));
    let resolution = resolve_from(&hold, &job_history)
        .with_context(|| format!("Can't read job history {}", job_history.path.display()))?;
    if !resolution.unmatched.is_empty() {
        warn!("Not holding for {}: no matching jobs in {}", resolution.unmatched.join(", "), job_history.path.display());
    }

    let first = commands.first().map(String::as_str).unwrap_or_default();
    let timestamp = input::timestamp_name(&Local::now(), &input::command_stem(first));
    let run_dir = input::normalize_run_dir(args.rundir.as_deref().unwrap_or(&timestamp))?;
    let name = input::job_name(&run_dir);

    let run_directory = RunDirectory::prepare(Path::new(&run_dir), Duration::from_secs(2))
        .with_context(|| format!("Can't create run directory {run_dir}"))?;
    let commands_file = run_directory.write_commands(&commands)
        .with_context(|| format!("Can't write commands to {run_dir}"))?;

    let job = ArrayJob {
        name,
        commands_file: script_path(&commands_file),
        run_dir: script_path(&run_directory.path),
        time: plan.time_limit(&args.time),
        array: plan.array_range(args.concurrency),
        plan,
        partition: args.queue,
        memory: args.memory,
        processors: args.processors,
        work_dir: args.working_directory,
        mail_user: args.mail,
        mail_type: args.mailtype,
        modules: args.modules,
        dependency: resolution.dependency(),
    };
    let script = job.write()?;

    if args.debug {
        let first_task: Vec<String> = job.plan.task_commands(0).map(|index| index.to_string()).collect();
        info!("Array task 0 runs command indices {}", first_task.join(", "));
        info!("--debug set, not submitting {}", script.display());
        return Ok(());
    }

    let sbatch = Sbatch { program: args.sbatch };
    let job_id = match sbatch.submit(&script) {
        Ok(job_id) => job_id,
        Err(err) => {
            if let Err(cleanup) = run_directory.remove() {
                warn!("Can't remove run directory {run_dir}: {cleanup}");
            }
            return Err(err.into());
        }
    };

    println!("Successfully submitted job {job_id}, logging job number, timestamp, and rundir to {}", job_history.path.display());
    let record = JobRecord { job_id, timestamp, run_dir };
    job_history.append(&record)
        .with_context(|| format!("Can't log job {} to {}", record.job_id, job_history.path.display()))?;

    Ok(())
}

/// Absolute form of `path` for the job script, which may run from another directory
///
/// Falls back to `path` as given if it can't be resolved, or if the resolved
/// path has characters the script can't hold unquoted.
fn script_path(path: &Path) -> PathBuf {
    match path.canonicalize() {
        Ok(absolute) if input::is_script_safe(&absolute.to_string_lossy()) => absolute,
        Ok(absolute) => {
            warn!("Using {} as given, its absolute path {} isn't safe in a job script", path.display(), absolute.display());
            path.to_path_buf()
        }
        Err(err) => {
            warn!("Can't resolve {}, using it as given: {err}", path.display());
            path.to_path_buf()
        }
    }
}
