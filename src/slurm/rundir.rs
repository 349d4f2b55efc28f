use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{info, warn};

/// Directory holding `commands.txt`, the job script and all task output
pub struct RunDirectory {
    pub path: PathBuf,
}

impl RunDirectory {
    /// Create the run directory, replacing an existing one
    ///
    /// An existing directory gets a countdown of three `grace` periods before it's
    /// deleted, giving the user a chance to hit Ctrl-C.
    pub fn prepare(path: &Path, grace: Duration) -> io::Result<RunDirectory> {
        if path.exists() {
            warn!("Deleting run directory '{}' and recreating it in:", path.display());
            for tick in [3, 2, 1] {
                warn!(" {tick}..");
                thread::sleep(grace);
            }
            fs::remove_dir_all(path)?;
        }
        info!("Creating run directory {}", path.display());
        fs::create_dir_all(path)?;
        Ok(RunDirectory { path: path.to_path_buf() })
    }

    /// Write one command per line to `commands.txt`, line N is array index N - 1
    pub fn write_commands(&self, commands: &[String]) -> io::Result<PathBuf> {
        let out_path = self.path.join("commands.txt");
        info!("Writing {} commands to {}", commands.len(), out_path.display());

        let mut file = File::create(&out_path)?;
        for command in commands {
            file.write_all(command.as_bytes())?;
            file.write_all(b"\n")?;
        }
        Ok(out_path)
    }

    /// Roll back after a failed submission
    pub fn remove(self) -> io::Result<()> {
        warn!("Removing run directory {}", self.path.display());
        fs::remove_dir_all(&self.path)
    }
}
