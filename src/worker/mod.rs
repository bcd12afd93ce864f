//! Worker pool and CPU worker for multi-threaded salt search.

mod cpu;
mod pool;

pub use cpu::{CpuWorker, WorkerStats};
pub use pool::{PoolMatch, WorkerPool};
