//! Multi-threaded engine that runs a job on the local file system.

use rayon::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::engine::{completed_at, list_partitions, ExecutionEngine, Job, JobOutcome, JobStatus, JobTracker};
use crate::error::{IndexError, Result};
use crate::extractor::{extract_partition, PartitionContext};
use crate::index::Posting;
use crate::persist::{self, write_partition, JobSummary, OutputPaths, FORMAT_VERSION};
use crate::shuffle::{reduce_group, Group, Shuffle};

pub struct LocalEngine {
    pool: rayon::ThreadPool,
    tracker: JobTracker,
}

impl LocalEngine {
    /// `threads = None` sizes the worker pool to the machine.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|i| format!("invindex-worker-{i}"))
            .build()
            .map_err(|e| IndexError::Config(format!("cannot start worker pool: {e}")))?;
        Ok(Self { pool, tracker: JobTracker::default() })
    }

    pub fn status(&self) -> Option<JobStatus> { self.tracker.current() }

    fn execute(&self, job: &Job) -> Result<JobSummary> {
        if job.output.exists() {
            return Err(IndexError::OutputExists(job.output.clone()));
        }
        let partitions = list_partitions(&job.inputs)?;
        tracing::info!(job = %job.name, partitions = partitions.len(), "running map tasks");

        let mapped: Vec<Vec<Posting>> = self
            .pool
            .install(|| partitions.par_iter().map(|p| map_task(p)).collect::<Result<Vec<_>>>())?;

        let mut shuffle = Shuffle::new(job.reduce_tasks);
        for postings in mapped {
            shuffle.extend(postings);
        }
        let (postings, terms) = (shuffle.postings(), shuffle.terms());
        tracing::info!(postings, terms, reduce_tasks = job.reduce_tasks, "shuffle complete");

        let paths = OutputPaths::new(&job.output);
        std::fs::create_dir_all(&paths.root)?;
        self.pool.install(|| {
            shuffle
                .into_groups()
                .into_par_iter()
                .enumerate()
                .try_for_each(|(n, group)| reduce_task(&paths, n, group))
        })?;

        let summary = JobSummary {
            job_name: job.name.clone(),
            inputs: job.inputs.iter().map(|p| p.display().to_string()).collect(),
            documents: partitions.len(),
            postings,
            terms,
            reduce_tasks: job.reduce_tasks,
            completed_at: completed_at(),
            version: FORMAT_VERSION,
        };
        persist::save_summary(&paths, &summary)?;
        Ok(summary)
    }
}

fn map_task(source: &Path) -> Result<Vec<Posting>> {
    let run = || -> Result<Vec<Posting>> {
        let ctx = PartitionContext::from_source(source)?;
        let reader = BufReader::new(File::open(source)?);
        extract_partition(&ctx, reader)
    };
    let postings = run().map_err(|e| IndexError::TaskFailed {
        task: format!("map {}", source.display()),
        reason: e.to_string(),
    })?;
    tracing::debug!(source = %source.display(), postings = postings.len(), "map task done");
    Ok(postings)
}

fn reduce_task(paths: &OutputPaths, n: usize, group: Group) -> Result<()> {
    let entries = reduce_group(group);
    write_partition(paths, n, &entries).map_err(|e| IndexError::TaskFailed {
        task: format!("reduce {n}"),
        reason: e.to_string(),
    })?;
    tracing::debug!(partition = n, entries = entries.len(), "reduce task done");
    Ok(())
}

impl ExecutionEngine for LocalEngine {
    fn accept(&self, job: &Job) -> Result<()> {
        self.tracker.claim(job)
    }

    fn abandon(&self, job: &Job) -> Result<()> {
        tracing::warn!(job = %job.name, "job abandoned before submission");
        self.tracker.advance(JobStatus::Failed)
    }

    fn remove_output(&self, output: &Path) -> Result<bool> {
        persist::remove_output(output)
    }

    fn submit(&self, job: &Job) -> Result<JobOutcome> {
        self.tracker.start(job)?;
        match self.execute(job) {
            Ok(summary) => {
                self.tracker.advance(JobStatus::Succeeded)?;
                Ok(JobOutcome::succeeded(summary))
            }
            Err(e) => {
                tracing::error!(job = %job.name, error = %e, "job failed");
                self.tracker.advance(JobStatus::Failed)?;
                Ok(JobOutcome::failed(e.to_string()))
            }
        }
    }
}
