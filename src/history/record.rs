/// One submitted array job
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobRecord {
    /// SLURM job id, without any `.suffix`
    pub job_id: String,
    /// Timestamp derived name, e.g. `j2024-01-01_12-00-00_blastn_etal`
    pub timestamp: String,
    /// Run directory given with `-r`, this is the name `--hold_names` matches against
    pub run_dir: String,
}

impl JobRecord {
    /// Parse a tab separated history line
    ///
    /// Returns None for lines that don't have all three fields. sbatch may log
    /// sub ids like `12345.batch`, only the part before the first dot is kept.
    pub fn parse_line(line: &str) -> Option<JobRecord> {
        let mut fields = line.trim_end_matches(['\r', '\n']).split('\t');
        let job_id = fields.next()?.trim().split('.').next()?.to_string();
        let timestamp = fields.next()?.to_string();
        let run_dir = fields.next()?.to_string();

        match job_id.is_empty() {
            true => None,
            false => Some(JobRecord { job_id, timestamp, run_dir }),
        }
    }

    /// Render as a history line, including the trailing newline
    pub fn to_line(&self) -> String {
        format!("{}\t{}\t{}\n", self.job_id, self.timestamp, self.run_dir)
    }
}
