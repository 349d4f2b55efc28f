use std::io;

use log::{info, warn};

use crate::history::record::JobRecord;
use crate::history::store::HistoryStore;
use crate::hold::pattern::NamePattern;

/// Hold strategies requested on the command line
#[derive(Clone, Debug, Default)]
pub struct HoldSpec {
    /// `--hold`: wait for every job in the history
    pub hold_all: bool,
    /// `--hold_jids`: used verbatim, not checked against the history
    pub job_ids: Vec<String>,
    /// `--hold_names`: wait for jobs whose run directory matches
    pub name_patterns: Vec<NamePattern>,
}

impl HoldSpec {
    /// True if no hold was requested, the history doesn't need to be read
    pub fn is_empty(&self) -> bool {
        !self.hold_all && self.job_ids.is_empty() && self.name_patterns.is_empty()
    }
}

/// Resolved job ids to wait for
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Name matches first, then explicit ids, then the full history. May contain duplicates.
    pub job_ids: Vec<String>,
    /// Patterns that didn't match any job in the history
    pub unmatched: Vec<String>,
}

impl Resolution {
    /// Value for `#SBATCH --dependency`, None if there's nothing to wait for
    ///
    /// `afterany` starts the job once the listed jobs end, whatever their exit status.
    pub fn dependency(&self) -> Option<String> {
        match self.job_ids.is_empty() {
            true => None,
            false => Some(format!("afterany:{}", self.job_ids.join(":"))),
        }
    }
}

/// Resolve holds against a history store, only reading it if a hold was requested
pub fn resolve_from(spec: &HoldSpec, store: &dyn HistoryStore) -> io::Result<Resolution> {
    match spec.is_empty() {
        true => Ok(Resolution::default()),
        false => Ok(resolve(spec, &store.load()?)),
    }
}

pub fn resolve(spec: &HoldSpec, history: &[JobRecord]) -> Resolution {
    let mut resolution = Resolution::default();

    for pattern in &spec.name_patterns {
        let before = resolution.job_ids.len();
        resolution.job_ids.extend(
            history.iter()
                .filter(|record| pattern.is_match(&record.run_dir))
                .map(|record| record.job_id.clone()),
        );

        match resolution.job_ids.len() - before {
            0 => {
                warn!("Job {pattern} does not match any job name in the job history; cannot hold for this job");
                resolution.unmatched.push(pattern.to_string());
            }
            n => info!("Pattern {pattern} matched {n} previous jobs"),
        }
    }

    resolution.job_ids.extend(spec.job_ids.iter().cloned());

    if spec.hold_all {
        info!("Holding for all {} jobs in the job history", history.len());
        resolution.job_ids.extend(history.iter().map(|record| record.job_id.clone()));
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::store::MemoryHistory;

    fn history() -> Vec<JobRecord> {
        let record = |id: &str, run_dir: &str| JobRecord {
            job_id: id.to_string(),
            timestamp: format!("j2024-01-01_00-00-0{id}_cmd_etal"),
            run_dir: run_dir.to_string(),
        };
        vec![record("100", "alpha_run"), record("101", "beta_run")]
    }

    fn patterns(patterns: &[&str]) -> Vec<NamePattern> {
        patterns.iter().map(|p| p.parse().unwrap()).collect()
    }

    #[test]
    fn name_pattern_selects_matching_jobs() {
        let spec = HoldSpec { name_patterns: patterns(&["alpha_.+"]), ..Default::default() };
        let resolution = resolve(&spec, &history());
        assert_eq!(resolution.job_ids, vec!["100"]);
        assert!(resolution.unmatched.is_empty());
    }

    #[test]
    fn unmatched_pattern_is_reported_not_fatal() {
        let spec = HoldSpec { name_patterns: patterns(&["nomatch_.+"]), ..Default::default() };
        let resolution = resolve(&spec, &history());
        assert!(resolution.job_ids.is_empty());
        assert_eq!(resolution.unmatched, vec!["nomatch_.+"]);
        assert_eq!(resolution.dependency(), None);
    }

    #[test]
    fn empty_history_reports_every_pattern_once() {
        let spec = HoldSpec { name_patterns: patterns(&["a", "b", "c"]), hold_all: true, ..Default::default() };
        let resolution = resolve(&spec, &[]);
        assert!(resolution.job_ids.is_empty());
        assert_eq!(resolution.unmatched, vec!["a", "b", "c"]);
    }

    #[test]
    fn strategies_are_concatenated_in_fixed_order() {
        let spec = HoldSpec {
            hold_all: true,
            job_ids: vec!["555".to_string(), "556".to_string()],
            name_patterns: patterns(&["beta", "_run$"]),
        };
        let resolution = resolve(&spec, &history());
        assert_eq!(resolution.job_ids, vec!["101", "100", "101", "555", "556", "100", "101"]);
        assert_eq!(resolution.dependency().unwrap(), "afterany:101:100:101:555:556:100:101");
    }

    #[test]
    fn repeated_names_all_match() {
        let mut history = history();
        history.push(JobRecord { job_id: "102".into(), timestamp: "j".into(), run_dir: "alpha_run".into() });
        let spec = HoldSpec { name_patterns: patterns(&["^alpha_run$"]), ..Default::default() };
        assert_eq!(resolve(&spec, &history).job_ids, vec!["100", "102"]);
    }

    #[test]
    fn explicit_ids_need_no_history() {
        let spec = HoldSpec { job_ids: vec!["42".to_string()], ..Default::default() };
        assert_eq!(resolve(&spec, &[]).dependency().unwrap(), "afterany:42");
    }

    #[test]
    fn resolves_from_injected_store() {
        let mut store = MemoryHistory::default();
        for record in history() {
            store.append(&record).unwrap();
        }
        let spec = HoldSpec { hold_all: true, ..Default::default() };
        assert_eq!(resolve_from(&spec, &store).unwrap().dependency().unwrap(), "afterany:100:101");
        assert_eq!(resolve_from(&HoldSpec::default(), &store).unwrap(), Resolution::default());
    }

    #[test]
    fn no_hold_requested() {
        let spec = HoldSpec::default();
        assert!(spec.is_empty());
        assert_eq!(resolve(&spec, &history()), Resolution::default());
    }
}
