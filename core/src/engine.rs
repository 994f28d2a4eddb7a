//! The execution-engine capability the driver submits jobs to.
//!
//! An engine owns input splitting, the shuffle, task scheduling and output
//! storage. The extractor and aggregator stay pure functions it calls into.

use parking_lot::RwLock;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{IndexError, Result};
use crate::persist::JobSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    pub fn transition(self, to: JobStatus) -> Result<JobStatus> {
        use JobStatus::*;
        match (self, to) {
            (Submitted, Running) | (Submitted, Failed) | (Running, Succeeded) | (Running, Failed) => Ok(to),
            (from, to) => Err(IndexError::InvalidTransition { from, to }),
        }
    }
}

/// A fully resolved job, ready to hand to an engine.
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub reduce_tasks: usize,
}

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub status: JobStatus,
    pub summary: Option<JobSummary>,
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn succeeded(summary: JobSummary) -> Self {
        Self { status: JobStatus::Succeeded, summary: Some(summary), error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { status: JobStatus::Failed, summary: None, error: Some(error.into()) }
    }

    pub fn is_success(&self) -> bool { self.status == JobStatus::Succeeded }

    /// Process exit code for this outcome: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

pub trait ExecutionEngine {
    /// Claim the engine for `job`, leaving it `Submitted`. Fails with
    /// `EngineBusy` while another job is in flight.
    fn accept(&self, job: &Job) -> Result<()>;

    /// Fail a job that was accepted but will never be submitted.
    fn abandon(&self, job: &Job) -> Result<()>;

    /// Destructively remove anything stored at `output`. Returns whether something existed.
    fn remove_output(&self, output: &Path) -> Result<bool>;

    /// Run `job` to completion, accepting it first if needed. Task failures
    /// are reported through the outcome; `Err` means the engine itself could
    /// not take or track the job.
    fn submit(&self, job: &Job) -> Result<JobOutcome>;
}

type Claim = Option<(String, JobStatus)>;

/// The job an engine has claimed, is running, or ran last.
#[derive(Default)]
pub(crate) struct JobTracker {
    state: RwLock<Claim>,
}

impl JobTracker {
    pub(crate) fn current(&self) -> Option<JobStatus> {
        self.state.read().as_ref().map(|(_, s)| *s)
    }

    pub(crate) fn claim(&self, job: &Job) -> Result<()> {
        Self::claim_locked(&mut self.state.write(), job)
    }

    /// Move `job` to `Running`, claiming the engine if `job` has not been accepted.
    pub(crate) fn start(&self, job: &Job) -> Result<()> {
        let mut state = self.state.write();
        let accepted = matches!(&*state, Some((name, JobStatus::Submitted)) if *name == job.name);
        if !accepted {
            Self::claim_locked(&mut state, job)?;
        }
        Self::advance_locked(&mut state, JobStatus::Running)
    }

    pub(crate) fn advance(&self, to: JobStatus) -> Result<()> {
        Self::advance_locked(&mut self.state.write(), to)
    }

    fn claim_locked(state: &mut Claim, job: &Job) -> Result<()> {
        if let Some((running, s)) = state.as_ref() {
            if !s.is_terminal() {
                tracing::warn!(job = %job.name, busy_with = %running, status = ?s, "rejecting job while another is in flight");
                return Err(IndexError::EngineBusy(job.name.clone()));
            }
        }
        *state = Some((job.name.clone(), JobStatus::Submitted));
        tracing::info!(job = %job.name, inputs = job.inputs.len(), output = %job.output.display(), "job submitted");
        Ok(())
    }

    fn advance_locked(state: &mut Claim, to: JobStatus) -> Result<()> {
        let (name, from) = state.take().unwrap_or_else(|| (String::new(), JobStatus::Submitted));
        let next = match from.transition(to) {
            Ok(next) => next,
            Err(e) => {
                *state = Some((name, from));
                return Err(e);
            }
        };
        tracing::debug!(job = %name, ?from, ?to, "job state changed");
        *state = Some((name, next));
        Ok(())
    }
}

/// Names starting with `_` or `.` are markers or hidden files, never input.
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_str().map_or(false, |n| n.starts_with('_') || n.starts_with('.'))
}

/// Expand job inputs into partitions: a file is one partition, a directory
/// contributes its immediate, non-hidden files.
pub fn list_partitions(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            return Err(IndexError::MissingInput(input.clone()));
        }
        for entry in WalkDir::new(input).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if is_hidden(entry.file_name()) || !entry.path().is_file() {
                continue;
            }
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub(crate) fn completed_at() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn only_legal_transitions_are_accepted() {
        use JobStatus::*;
        assert_eq!(Submitted.transition(Running).unwrap(), Running);
        assert_eq!(Running.transition(Succeeded).unwrap(), Succeeded);
        assert_eq!(Running.transition(Failed).unwrap(), Failed);
        assert_eq!(Submitted.transition(Failed).unwrap(), Failed);
        assert!(Submitted.transition(Succeeded).is_err());
        assert!(Succeeded.transition(Running).is_err());
        assert!(Failed.transition(Succeeded).is_err());
    }

    fn job(name: &str) -> Job {
        Job { name: name.into(), inputs: vec!["in".into()], output: "out".into(), reduce_tasks: 1 }
    }

    #[test]
    fn a_running_job_blocks_new_claims() {
        let tracker = JobTracker::default();
        tracker.start(&job("first")).unwrap();
        assert_eq!(tracker.current(), Some(JobStatus::Running));

        assert!(matches!(tracker.claim(&job("second")), Err(IndexError::EngineBusy(_))));
        assert!(matches!(tracker.start(&job("second")), Err(IndexError::EngineBusy(_))));
        assert_eq!(tracker.current(), Some(JobStatus::Running));

        tracker.advance(JobStatus::Succeeded).unwrap();
        tracker.claim(&job("second")).unwrap();
        assert_eq!(tracker.current(), Some(JobStatus::Submitted));
    }

    #[test]
    fn an_accepted_job_starts_without_a_second_claim() {
        let tracker = JobTracker::default();
        tracker.claim(&job("first")).unwrap();
        assert!(tracker.start(&job("other")).is_err());
        tracker.start(&job("first")).unwrap();
        assert_eq!(tracker.current(), Some(JobStatus::Running));
    }

    #[test]
    fn illegal_transition_keeps_the_current_state() {
        let tracker = JobTracker::default();
        tracker.claim(&job("first")).unwrap();
        assert!(tracker.advance(JobStatus::Succeeded).is_err());
        assert_eq!(tracker.current(), Some(JobStatus::Submitted));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(JobOutcome::failed("boom").exit_code(), 1);
    }

    #[test]
    fn directories_expand_to_visible_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("_SUCCESS"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.txt"), "c").unwrap();

        let parts = list_partitions(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = parts.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        let err = list_partitions(&[dir.path().join("nope")]).unwrap_err();
        assert!(matches!(err, IndexError::MissingInput(_)));
    }
}
