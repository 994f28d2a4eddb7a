use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use invindex_core::persist::read_index;
use invindex_core::{Driver, JobConfig, LocalEngine};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build an inverted index of terms to the documents containing them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input files or directories
    Build {
        /// Input files or directories (each file is one document)
        inputs: Vec<PathBuf>,
        /// Output directory; replaced if it already exists
        #[arg(long)]
        output: Option<PathBuf>,
        /// JSON job configuration; command-line flags take precedence
        #[arg(long)]
        config: Option<PathBuf>,
        /// Number of reduce partitions (part-r-NNNNN files)
        #[arg(long)]
        reduce_tasks: Option<usize>,
        /// Worker threads (defaults to the number of CPUs)
        #[arg(long)]
        threads: Option<usize>,
        #[arg(long)]
        job_name: Option<String>,
    },
    /// Print the records of a completed index, sorted by term
    Dump {
        /// Index output directory
        index: PathBuf,
    },
}

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { inputs, output, config, reduce_tasks, threads, job_name } => {
            load_config(config, inputs, output, reduce_tasks, threads, job_name).and_then(build_index)
        }
        Commands::Dump { index } => dump_index(index).map(|()| true),
    };
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(
    file: Option<PathBuf>,
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    reduce_tasks: Option<usize>,
    threads: Option<usize>,
    job_name: Option<String>,
) -> Result<JobConfig> {
    let mut cfg = match file {
        Some(path) => JobConfig::from_file(&path).with_context(|| format!("reading config {}", path.display()))?,
        None => JobConfig::default(),
    };
    if !inputs.is_empty() {
        cfg.inputs = inputs;
    }
    if let Some(output) = output {
        cfg.output = output;
    }
    if let Some(n) = reduce_tasks {
        cfg.reduce_tasks = n;
    }
    if threads.is_some() {
        cfg.threads = threads;
    }
    if let Some(name) = job_name {
        cfg.job_name = name;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn build_index(cfg: JobConfig) -> Result<bool> {
    let driver = Driver::new(LocalEngine::new(cfg.threads)?);
    let outcome = driver.run(&cfg)?;
    if let Some(summary) = &outcome.summary {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }
    Ok(outcome.is_success())
}

fn dump_index(index: PathBuf) -> Result<()> {
    let entries = read_index(&index).with_context(|| format!("reading index {}", index.display()))?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for entry in entries {
        writeln!(out, "{}", entry.to_record())?;
    }
    out.flush()?;
    Ok(())
}
