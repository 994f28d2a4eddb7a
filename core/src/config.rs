use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use crate::engine::Job;
use crate::error::{IndexError, Result};

fn default_job_name() -> String { "invertedindex".into() }
fn default_reduce_tasks() -> usize { 1 }

/// Job settings, loadable from a JSON file and overridable from the command line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_job_name")]
    pub job_name: String,
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub output: PathBuf,
    #[serde(default = "default_reduce_tasks")]
    pub reduce_tasks: usize,
    /// Worker threads for the local engine; machine-sized when unset.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            job_name: default_job_name(),
            inputs: Vec::new(),
            output: PathBuf::new(),
            reduce_tasks: default_reduce_tasks(),
            threads: None,
        }
    }
}

impl JobConfig {
    pub fn new<I, P>(inputs: I, output: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self { inputs: inputs.into_iter().map(Into::into).collect(), output: output.into(), ..Self::default() }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.job_name.trim().is_empty() {
            return Err(IndexError::Config("job name must not be empty".into()));
        }
        if self.inputs.is_empty() {
            return Err(IndexError::Config("at least one input path is required".into()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(IndexError::Config("an output path is required".into()));
        }
        if self.reduce_tasks == 0 {
            return Err(IndexError::Config("reduce_tasks must be at least 1".into()));
        }
        if self.threads == Some(0) {
            return Err(IndexError::Config("threads must be at least 1".into()));
        }
        // The output is removed recursively before the job runs, so it must
        // not be, or contain, any input.
        let output = resolve(&self.output)?;
        for input in &self.inputs {
            if resolve(input)?.starts_with(&output) {
                return Err(IndexError::Config(format!(
                    "output {} would overwrite input {}",
                    self.output.display(),
                    input.display()
                )));
            }
        }
        Ok(())
    }

    pub fn to_job(&self) -> Result<Job> {
        self.validate()?;
        Ok(Job {
            name: self.job_name.clone(),
            inputs: self.inputs.clone(),
            output: self.output.clone(),
            reduce_tasks: self.reduce_tasks,
        })
    }
}

/// Absolute, `.`/`..`-free form of `path`, with symlinks resolved through
/// its deepest existing ancestor. The path itself need not exist.
fn resolve(path: &Path) -> Result<PathBuf> {
    let mut lexical = PathBuf::new();
    for c in std::path::absolute(path)?.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            c => lexical.push(c),
        }
    }

    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(real) = existing.canonicalize() {
            return Ok(missing.iter().rev().fold(real, |acc, name| acc.join(name)));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(lexical),
        }
    }
}
