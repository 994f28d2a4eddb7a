use crate::error::{IndexError, Result};
use crate::index::IndexEntry;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SUCCESS_MARKER: &str = "_SUCCESS";
pub const FORMAT_VERSION: u32 = 1;

/// Written into the `_SUCCESS` marker once every reduce partition is on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_name: String,
    pub inputs: Vec<String>,
    pub documents: usize,
    pub postings: usize,
    pub terms: usize,
    pub reduce_tasks: usize,
    pub completed_at: String,
    pub version: u32,
}

pub struct OutputPaths {
    pub root: PathBuf,
}

impl OutputPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn partition(&self, n: usize) -> PathBuf { self.root.join(format!("part-r-{n:05}")) }
    pub fn success(&self) -> PathBuf { self.root.join(SUCCESS_MARKER) }
}

/// Recursively delete whatever is at `root`. Returns whether anything was there.
pub fn remove_output<P: AsRef<Path>>(root: P) -> Result<bool> {
    let root = root.as_ref();
    match fs::symlink_metadata(root) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(root)?,
        Ok(_) => fs::remove_file(root)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    }
    Ok(true)
}

pub fn write_partition(paths: &OutputPaths, n: usize, entries: &[IndexEntry]) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    let mut w = BufWriter::new(File::create(paths.partition(n))?);
    for entry in entries {
        writeln!(w, "{}", entry.to_record())?;
    }
    w.flush()?;
    Ok(())
}

pub fn save_summary(paths: &OutputPaths, summary: &JobSummary) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(paths.success(), json)?;
    Ok(())
}

pub fn load_summary(paths: &OutputPaths) -> Result<JobSummary> {
    let file = paths.success();
    if !file.is_file() {
        return Err(IndexError::IncompleteOutput(paths.root.clone()));
    }
    let reader = BufReader::new(File::open(file)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Read every partition of a completed output, sorted by term.
pub fn read_index<P: AsRef<Path>>(root: P) -> Result<Vec<IndexEntry>> {
    let paths = OutputPaths::new(root);
    load_summary(&paths)?;
    let mut files: Vec<PathBuf> = fs::read_dir(&paths.root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with("part-"))
        })
        .collect();
    files.sort();

    let mut entries = Vec::new();
    for file in files {
        for line in BufReader::new(File::open(file)?).lines() {
            let line = line?;
            if line.is_empty() { continue; }
            entries.push(IndexEntry::parse_record(&line)?);
        }
    }
    entries.sort_by(|a, b| a.token.cmp(&b.token));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn summary() -> JobSummary {
        JobSummary {
            job_name: "invertedindex".into(),
            inputs: vec!["in".into()],
            documents: 1,
            postings: 2,
            terms: 2,
            reduce_tasks: 1,
            completed_at: "2024-01-01T00:00:00Z".into(),
            version: FORMAT_VERSION,
        }
    }

    #[test]
    fn remove_output_reports_what_it_did() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        assert!(!remove_output(&out).unwrap());
        fs::create_dir_all(out.join("nested")).unwrap();
        fs::write(out.join("nested/stale"), "x").unwrap();
        assert!(remove_output(&out).unwrap());
        assert!(!out.exists());
    }

    #[test]
    fn read_index_requires_success_marker() {
        let dir = tempdir().unwrap();
        let paths = OutputPaths::new(dir.path());
        write_partition(&paths, 0, &[]).unwrap();
        assert!(matches!(read_index(dir.path()), Err(IndexError::IncompleteOutput(_))));
    }

    #[test]
    fn read_index_merges_partitions() {
        let dir = tempdir().unwrap();
        let paths = OutputPaths::new(dir.path());
        let b = IndexEntry { token: "b".into(), doc_ids: vec!["x.txt".into()] };
        let a = IndexEntry { token: "a".into(), doc_ids: vec!["x.txt".into(), "y.txt".into()] };
        write_partition(&paths, 0, &[b.clone()]).unwrap();
        write_partition(&paths, 1, &[a.clone()]).unwrap();
        save_summary(&paths, &summary()).unwrap();

        assert_eq!(read_index(dir.path()).unwrap(), vec![a, b]);
        assert_eq!(load_summary(&paths).unwrap(), summary());
    }

    #[test]
    fn line_ending_characters_in_ids_are_kept() {
        let dir = tempdir().unwrap();
        let paths = OutputPaths::new(dir.path());
        let entry = IndexEntry { token: "t".into(), doc_ids: vec!["a\r".into(), "b\r\n".into()] };
        write_partition(&paths, 0, &[entry.clone()]).unwrap();
        save_summary(&paths, &summary()).unwrap();
        assert_eq!(read_index(dir.path()).unwrap(), vec![entry]);
    }
}
