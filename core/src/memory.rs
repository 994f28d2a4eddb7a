//! In-process engine that keeps documents and outputs in memory.
//!
//! Grouping is a plain map from term to the ids collected for it, which makes
//! it a convenient stand-in for a real engine in tests.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::aggregator::aggregate;
use crate::engine::{completed_at, is_hidden, ExecutionEngine, Job, JobOutcome, JobStatus, JobTracker};
use crate::error::{IndexError, Result};
use crate::extractor::{extract_partition, PartitionContext};
use crate::index::{DocumentId, IndexEntry};
use crate::persist::{JobSummary, FORMAT_VERSION};

#[derive(Default)]
pub struct MemoryEngine {
    documents: RwLock<BTreeMap<PathBuf, String>>,
    outputs: RwLock<HashMap<PathBuf, Vec<IndexEntry>>>,
    tracker: JobTracker,
}

impl MemoryEngine {
    pub fn new() -> Self { Self::default() }

    pub fn add_document<P: Into<PathBuf>>(&self, location: P, text: impl Into<String>) {
        self.documents.write().insert(location.into(), text.into());
    }

    /// Store entries at `output` as if a previous job had written them.
    pub fn put_output<P: Into<PathBuf>>(&self, output: P, entries: Vec<IndexEntry>) {
        self.outputs.write().insert(output.into(), entries);
    }

    /// Entries written to `output`, sorted by term.
    pub fn output(&self, output: &Path) -> Option<Vec<IndexEntry>> {
        self.outputs.read().get(output).cloned()
    }

    pub fn status(&self) -> Option<JobStatus> { self.tracker.current() }

    /// A location names either one document or a "directory" of documents.
    fn partitions(&self, inputs: &[PathBuf]) -> Result<Vec<(PathBuf, String)>> {
        let docs = self.documents.read();
        let mut parts = Vec::new();
        for input in inputs {
            if let Some(text) = docs.get(input) {
                parts.push((input.clone(), text.clone()));
                continue;
            }
            let children: Vec<_> = docs
                .iter()
                .filter(|(p, _)| p.parent() == Some(input.as_path()))
                .filter(|(p, _)| !p.file_name().map_or(false, is_hidden))
                .map(|(p, t)| (p.clone(), t.clone()))
                .collect();
            if children.is_empty() {
                return Err(IndexError::MissingInput(input.clone()));
            }
            parts.extend(children);
        }
        Ok(parts)
    }

    fn execute(&self, job: &Job) -> Result<(Vec<IndexEntry>, JobSummary)> {
        if self.outputs.read().contains_key(&job.output) {
            return Err(IndexError::OutputExists(job.output.clone()));
        }
        let partitions = self.partitions(&job.inputs)?;

        let mut grouped: HashMap<String, Vec<DocumentId>> = HashMap::new();
        let mut postings = 0;
        for (source, text) in &partitions {
            let ctx = PartitionContext::from_source(source)?;
            for posting in extract_partition(&ctx, Cursor::new(text.as_bytes()))? {
                grouped.entry(posting.token).or_default().push(posting.doc_id);
                postings += 1;
            }
        }

        let mut entries: Vec<IndexEntry> =
            grouped.into_iter().map(|(token, ids)| aggregate(&token, ids)).collect();
        entries.sort_by(|a, b| a.token.cmp(&b.token));

        let summary = JobSummary {
            job_name: job.name.clone(),
            inputs: job.inputs.iter().map(|p| p.display().to_string()).collect(),
            documents: partitions.len(),
            postings,
            terms: entries.len(),
            reduce_tasks: job.reduce_tasks,
            completed_at: completed_at(),
            version: FORMAT_VERSION,
        };
        Ok((entries, summary))
    }
}

impl ExecutionEngine for MemoryEngine {
    fn accept(&self, job: &Job) -> Result<()> {
        self.tracker.claim(job)
    }

    fn abandon(&self, job: &Job) -> Result<()> {
        tracing::warn!(job = %job.name, "job abandoned before submission");
        self.tracker.advance(JobStatus::Failed)
    }

    fn remove_output(&self, output: &Path) -> Result<bool> {
        Ok(self.outputs.write().remove(output).is_some())
    }

    fn submit(&self, job: &Job) -> Result<JobOutcome> {
        self.tracker.start(job)?;
        match self.execute(job) {
            Ok((entries, summary)) => {
                self.outputs.write().insert(job.output.clone(), entries);
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

#[cfg(test)]
mod tests {
    use super::*;

    fn job(inputs: &[&str], output: &str) -> Job {
        Job {
            name: "invertedindex".into(),
            inputs: inputs.iter().map(PathBuf::from).collect(),
            output: PathBuf::from(output),
            reduce_tasks: 1,
        }
    }

    #[test]
    fn directory_inputs_pick_up_children() {
        let engine = MemoryEngine::new();
        engine.add_document("/corpus/a.txt", "dog");
        engine.add_document("/corpus/b.txt", "dog cat");
        engine.add_document("/corpus/_SUCCESS", "junk");
        engine.add_document("/other/c.txt", "emu");

        let outcome = engine.submit(&job(&["/corpus"], "/out")).unwrap();
        assert!(outcome.is_success());
        let out = engine.output(Path::new("/out")).unwrap();
        let records: Vec<String> = out.iter().map(IndexEntry::to_record).collect();
        assert_eq!(records, vec!["cat\tb.txt", "dog\ta.txt,b.txt"]);
    }

    #[test]
    fn unknown_input_fails() {
        let engine = MemoryEngine::new();
        let outcome = engine.submit(&job(&["/nowhere"], "/out")).unwrap();
        assert_eq!(outcome.status, JobStatus::Failed);
        assert!(engine.output(Path::new("/out")).is_none());
    }

    #[test]
    fn existing_output_must_be_removed_first() {
        let engine = MemoryEngine::new();
        engine.add_document("/a.txt", "dog");
        engine.put_output("/out", Vec::new());
        assert!(!engine.submit(&job(&["/a.txt"], "/out")).unwrap().is_success());
        assert!(engine.remove_output(Path::new("/out")).unwrap());
        assert!(!engine.remove_output(Path::new("/out")).unwrap());
        assert!(engine.submit(&job(&["/a.txt"], "/out")).unwrap().is_success());
    }
}
