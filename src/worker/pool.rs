//! Worker pool for parallel salt search.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver};
use tracing::{debug, warn};

use crate::search::{CancelToken, SaltSearch, SearchMatch};

use super::cpu::{CpuWorker, WorkerStats};

/// A match delivered by one of the pool's workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolMatch {
    pub found: SearchMatch,
    pub worker_id: usize,
}

/// Runs the same probe as [`SaltSearch::find_address`] on several OS threads.
pub struct WorkerPool {
    num_workers: usize,
    handles: Option<Vec<JoinHandle<()>>>,
    result_rx: Receiver<PoolMatch>,
    cancel: CancelToken,
    stats: Arc<WorkerStats>,
    start_time: Instant,
}

impl WorkerPool {
    pub fn new(num_workers: usize, search: SaltSearch, initializer: &[u8]) -> std::io::Result<Self> {
        let (result_tx, result_rx) = bounded(100);
        let cancel = CancelToken::new();
        let stats = Arc::new(WorkerStats::new());

        let mut handles = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let worker = CpuWorker::new(
                id,
                search.clone(),
                initializer,
                result_tx.clone(),
                cancel.clone(),
                stats.clone(),
            );
            let handle = thread::Builder::new()
                .name(format!("multisafe-worker-{id}"))
                .spawn(move || worker.run());
            match handle {
                Ok(h) => handles.push(h),
                Err(err) => {
                    cancel.cancel();
                    for h in handles {
                        let _ = h.join();
                    }
                    return Err(err);
                }
            }
        }
        debug!(num_workers, pattern = %search.pattern(), "worker pool started");

        Ok(Self {
            num_workers,
            handles: Some(handles),
            result_rx,
            cancel,
            stats,
            start_time: Instant::now(),
        })
    }

    pub fn wait_for_result(&self, timeout: Duration) -> Option<PoolMatch> {
        self.result_rx.recv_timeout(timeout).ok()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn join(mut self) {
        self.stop();
        self.join_workers();
    }

    fn join_workers(&mut self) {
        if let Some(h) = self.handles.take() {
            for handle in h {
                // Drain results so a worker parked on a full channel can exit.
                while !handle.is_finished() {
                    let _ = self.result_rx.recv_timeout(Duration::from_millis(10));
                }
                if handle.join().is_err() {
                    warn!("search worker panicked");
                }
            }
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }
    pub fn total_salts(&self) -> u64 {
        self.stats.total_salts()
    }
    pub fn total_matches(&self) -> u64 {
        self.stats.total_matches()
    }
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
    pub fn salts_per_second(&self) -> f64 {
        let t = self.elapsed().as_secs_f64();
        if t > 0.0 {
            self.total_salts() as f64 / t
        } else {
            0.0
        }
    }
    /// Token that stops every worker, e.g. from a Ctrl-C handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
        self.join_workers();
    }
}
