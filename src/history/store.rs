use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::history::record::JobRecord;

/// Somewhere to keep previously submitted jobs
///
/// Records come back in the order they were appended. There's no locking,
/// concurrent appends from separate sessions may interleave.
pub trait HistoryStore {
    /// All known jobs, oldest first. Missing history is an empty history.
    fn load(&self) -> io::Result<Vec<JobRecord>>;

    /// Add one job to the end of the history
    fn append(&mut self, record: &JobRecord) -> io::Result<()>;
}

/// History kept in a tab separated text file
pub struct FileHistory {
    pub path: PathBuf,
}

impl FileHistory {
    pub fn new(path: &Path) -> FileHistory {
        FileHistory { path: path.to_path_buf() }
    }
}

impl HistoryStore for FileHistory {
    fn load(&self) -> io::Result<Vec<JobRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No job history at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let mut records: Vec<JobRecord> = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match JobRecord::parse_line(line) {
                Some(record) => records.push(record),
                None => warn!("Skipping malformed line {} in {}: {line:?}", number + 1, self.path.display()),
            }
        }

        info!("Loaded {} previous jobs from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn append(&mut self, record: &JobRecord) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(record.to_line().as_bytes())
    }
}

/// History that only lives as long as the process
#[cfg(test)]
#[derive(Default)]
pub struct MemoryHistory {
    pub records: Vec<JobRecord>,
}

#[cfg(test)]
impl HistoryStore for MemoryHistory {
    fn load(&self) -> io::Result<Vec<JobRecord>> {
        Ok(self.records.clone())
    }

    fn append(&mut self, record: &JobRecord) -> io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
