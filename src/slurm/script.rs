use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use serde::Serialize;
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::slurm::array_job::ArrayJob;

/// GNU time report printed after every command
///
/// The doubled backslashes survive bash double quotes as `\t` and `\n` for time to expand.
static TIME_FORMAT: &str = r" \\tFull Command:                      %C \\n\\tMemory (kb):                       %M \\n\\t# SWAP  (freq):                    %W \\n\\t# Waits (freq):                    %w \\n\\tCPU (percent):                     %P \\n\\tTime (seconds):                    %e \\n\\tTime (hh:mm:ss.ms):                %E \\n\\tSystem CPU Time (seconds):         %S \\n\\tUser   CPU Time (seconds):         %U ";

/// All rendered sections of an array job script, in file order
struct JobTemplate {
    header: Header,
    task: Task,
}

impl JobTemplate {
    fn content(self) -> String {
        [self.header.content, self.task.content].concat()
    }
}

/// Rendered SBATCH header
///
/// Always sets job name, time, array range, output paths, memory and cpus.
/// Partition, dependency, working directory and mail are only set if requested.
struct Header {
    content: String,
}

/// Rendered task body
///
/// A single batch runs the command on line `SLURM_ARRAY_TASK_ID + 1` of
/// `commands.txt`. Multiple batches loop over `batch_count` steps and skip
/// indices past the end of the command list.
struct Task {
    content: String,
}

/// Rendering context for header
#[derive(Serialize)]
struct HeaderContext<'a> {
    name: &'a str,
    time_now: String,
    time: &'a str,
    array: &'a str,
    run_dir: String,
    partition: Option<&'a str>,
    dependency: Option<&'a str>,
    memory: &'a str,
    processors: u32,
    work_dir: Option<&'a str>,
    mail_user: Option<&'a str>,
    mail_type: &'a str,
}

/// Rendering context for task body
#[derive(Serialize)]
struct TaskContext<'a> {
    name: &'a str,
    run_dir: String,
    commands_file: String,
    modules: &'a [String],
    multi_batch: bool,
    batch_count: usize,
    last_step: usize,
    total_commands: usize,
    time_format: &'static str,
}

impl ArrayJob {
    /// Render the job script and write it to [`ArrayJob::script_path`]
    pub fn write(&self) -> Result<PathBuf> {
        let path = self.script_path();
        let content = self.render()?;
        info!("Writing job script to {}", path.display());
        fs::write(&path, content).with_context(|| format!("Can't write job script {}", path.display()))?;
        Ok(path)
    }

    /// Render the complete script without touching the filesystem
    pub fn render(&self) -> Result<String> {
        let job = JobTemplate { header: self.render_header()?, task: self.render_task()? };
        Ok(job.content())
    }

    fn render_header(&self) -> Result<Header> {
        /// included header template
        static HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/header.txt"));
        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&format_unescaped);
        tt.add_template("header", HEADER)?;

        let context = HeaderContext {
            name: &self.name,
            time_now: Local::now().to_rfc2822(),
            time: &self.time,
            array: &self.array,
            run_dir: self.run_dir.to_string_lossy().into_owned(),
            partition: self.partition.as_deref(),
            dependency: self.dependency.as_deref(),
            memory: &self.memory,
            processors: self.processors,
            work_dir: self.work_dir.as_deref(),
            mail_user: self.mail_user.as_deref(),
            mail_type: &self.mail_type,
        };

        Ok(Header { content: tt.render("header", &context)? })
    }

    fn render_task(&self) -> Result<Task> {
        /// included task template
        static TASK: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/task.txt"));
        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&format_unescaped);
        tt.add_template("task", TASK)?;

        let context = TaskContext {
            name: &self.name,
            run_dir: self.run_dir.to_string_lossy().into_owned(),
            commands_file: self.commands_file.to_string_lossy().into_owned(),
            modules: &self.modules,
            multi_batch: !self.plan.is_single(),
            batch_count: self.plan.batch_count,
            last_step: self.plan.batch_count.saturating_sub(1),
            total_commands: self.plan.total_commands,
            time_format: TIME_FORMAT,
        };

        Ok(Task { content: tt.render("task", &context)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::batch::{plan, BatchPlan};
    use std::os::unix::fs::PermissionsExt;
    use std::process::Command;
    use tempfile::TempDir;

    fn job(total: usize, dependency: Option<&str>) -> ArrayJob {
        let mut job = job_for(plan(total, 900, "24:00:00").unwrap());
        job.dependency = dependency.map(str::to_string);
        job
    }

    fn job_for(plan: BatchPlan) -> ArrayJob {
        ArrayJob {
            name: "run".to_string(),
            run_dir: PathBuf::from("logs/run"),
            commands_file: PathBuf::from("logs/run/commands.txt"),
            time: plan.time_limit("04:00:00"),
            array: plan.array_range(2000),
            plan,
            partition: None,
            memory: "4gb".to_string(),
            processors: 1,
            work_dir: None,
            mail_user: None,
            mail_type: "ALL".to_string(),
            modules: vec![],
            dependency: None,
        }
    }

    #[test]
    fn single_batch_script() {
        let script = job(500, None).render().unwrap();
        assert!(script.starts_with("#!/usr/bin/env bash\n"));
        assert!(script.contains("#SBATCH --job-name=run\n"));
        assert!(script.contains("#SBATCH --time=04:00:00\n"));
        assert!(script.contains("#SBATCH --array=0-499%2000\n"));
        assert!(script.contains("#SBATCH --output=logs/run/run.%A_%a.out\n"));
        assert!(script.contains("index=$SLURM_ARRAY_TASK_ID\n"));
        assert!(script.contains("sed \"$line q;d\" \"logs/run/commands.txt\""));
        assert!(!script.contains("for step in"));
        assert!(!script.contains("--dependency"));
        assert!(!script.contains("--partition"));
        assert!(!script.contains("--mail-user"));
    }

    #[test]
    fn multi_batch_script_loops_over_steps() {
        let script = job(2500, None).render().unwrap();
        assert!(script.contains("#SBATCH --time=3-00:00:00\n"));
        assert!(script.contains("#SBATCH --array=0-899%2000\n"));
        assert!(script.contains("for step in $(seq 0 2); do\n"));
        assert!(script.contains("index=$((SLURM_ARRAY_TASK_ID * 3 + step))\n"));
        assert!(script.contains("if [ \"$index\" -ge 2500 ]; then\n"));
        assert!(script.contains("\ndone\n"));
    }

    #[test]
    fn optional_directives_when_set() {
        let mut job = job(10, Some("afterany:100:101"));
        job.partition = Some("long".to_string());
        job.work_dir = Some("/scratch/me".to_string());
        job.mail_user = Some("me@example.org".to_string());
        job.modules = vec!["R/3.3".to_string(), "python/3.6".to_string()];

        let script = job.render().unwrap();
        assert!(script.contains("#SBATCH --dependency=afterany:100:101\n"));
        assert!(script.contains("#SBATCH --partition=long\n"));
        assert!(script.contains("#SBATCH --chdir=/scratch/me\n"));
        assert!(script.contains("#SBATCH --mail-user=me@example.org\n#SBATCH --mail-type=ALL\n"));
        assert!(script.contains("module load R/3.3\nmodule load python/3.6\n"));
    }

    #[test]
    fn time_report_keeps_escapes() {
        let script = job(1, None).render().unwrap();
        assert!(script.contains(r#"/usr/bin/env time -f " \\tFull Command:"#));
    }

    #[test]
    fn writes_script_into_run_dir() {
        let dir = TempDir::new().unwrap();
        let mut job = job(3, None);
        job.run_dir = dir.path().join("run");
        std::fs::create_dir(&job.run_dir).unwrap();

        let path = job.write().unwrap();
        assert_eq!(path, dir.path().join("run").join("run.sh"));
        assert!(std::fs::read_to_string(path).unwrap().contains("#SBATCH --array=0-2%2000"));
    }

    #[test]
    fn sections_follow_each_other_without_blank_lines() {
        let script = job(5, None).render().unwrap();
        assert!(script.contains("#SBATCH --cpus-per-task=1\n#\n# Loading specified modules\n"));

        let mut job = job(5, None);
        job.mail_user = Some("me@example.org".to_string());
        let script = job.render().unwrap();
        assert!(script.contains("#SBATCH --mail-type=ALL\n#\n# Loading specified modules\n"));
    }

    #[test]
    fn rendered_loop_runs_the_planned_commands() {
        let dir = TempDir::new().unwrap();
        let run_dir = dir.path().join("run");
        fs::create_dir(&run_dir).unwrap();
        let commands_file = run_dir.join("commands.txt");
        let commands: Vec<String> = (0..5).map(|i| format!("echo CMD{i}")).collect();
        fs::write(&commands_file, commands.join("\n") + "\n").unwrap();

        // stands in for GNU time: drop `-f <format>` and run the command
        let bin = dir.path().join("bin");
        fs::create_dir(&bin).unwrap();
        let time = bin.join("time");
        fs::write(&time, "#!/bin/sh\nshift 2\nexec \"$@\"\n").unwrap();
        fs::set_permissions(&time, fs::Permissions::from_mode(0o755)).unwrap();

        let plan = plan(5, 2, "10").unwrap();
        assert_eq!(plan.batch_count, 3);
        let mut job = job_for(plan);
        job.run_dir = run_dir;
        job.commands_file = commands_file;
        let script = job.write().unwrap();
        let path = format!("{}:{}", bin.display(), std::env::var("PATH").unwrap_or_default());

        for task in 0..job.plan.array_size() {
            let output = Command::new("bash")
                .arg(&script)
                .env("SLURM_ARRAY_TASK_ID", task.to_string())
                .env("SLURM_ARRAY_JOB_ID", "1")
                .env("PATH", &path)
                .output()
                .unwrap();
            let stdout = String::from_utf8_lossy(&output.stdout);
            let ran: Vec<&str> = stdout.lines().filter(|line| line.starts_with("CMD")).collect();
            let planned: Vec<String> = job.plan.task_commands(task).map(|i| format!("CMD{i}")).collect();
            assert_eq!(ran, planned, "task {task}");
            if task == 1 {
                assert!(stdout.contains("Skipping command index 5"));
            }
        }
    }
}
