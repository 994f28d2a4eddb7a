//! Configures a job, clears its output location and hands it to an engine.

use crate::config::JobConfig;
use crate::engine::{ExecutionEngine, JobOutcome};
use crate::error::Result;

pub struct Driver<E> {
    engine: E,
}

impl<E: ExecutionEngine> Driver<E> {
    pub fn new(engine: E) -> Self { Self { engine } }

    pub fn engine(&self) -> &E { &self.engine }

    /// Run the job described by `config` and block until it finishes.
    ///
    /// The engine claims the job before anything already stored at the output
    /// location is removed, so a rejected job leaves the output untouched.
    /// The driver does not retry: a failed job comes back as a failed outcome.
    pub fn run(&self, config: &JobConfig) -> Result<JobOutcome> {
        let job = config.to_job()?;
        self.engine.accept(&job)?;
        match self.engine.remove_output(&job.output) {
            Ok(true) => tracing::warn!(output = %job.output.display(), "removed existing output"),
            Ok(false) => {}
            Err(e) => {
                self.engine.abandon(&job)?;
                return Err(e);
            }
        }
        let outcome = self.engine.submit(&job)?;
        if let Some(summary) = &outcome.summary {
            tracing::info!(
                job = %job.name,
                documents = summary.documents,
                terms = summary.terms,
                "index build complete"
            );
        }
        Ok(outcome)
    }
}
