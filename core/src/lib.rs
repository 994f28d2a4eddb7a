pub mod aggregator;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod index;
pub mod local;
pub mod memory;
pub mod persist;
pub mod record;
pub mod shuffle;
pub mod tokenizer;

pub use config::JobConfig;
pub use driver::Driver;
pub use engine::{ExecutionEngine, Job, JobOutcome, JobStatus};
pub use error::{IndexError, Result};
pub use index::*;
pub use local::LocalEngine;
pub use memory::MemoryEngine;
