//! CPU worker for parallel salt search.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::crypto::{keccak256, SaltNonce};
use crate::search::{CancelToken, SaltSearch, SearchMatch};

use super::PoolMatch;

#[derive(Debug, Default)]
pub struct WorkerStats {
    pub salts_tried: AtomicU64,
    pub matches_found: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn total_salts(&self) -> u64 {
        self.salts_tried.load(Ordering::Relaxed)
    }
    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

pub struct CpuWorker {
    id: usize,
    search: SaltSearch,
    initializer_hash: [u8; 32],
    result_tx: Sender<PoolMatch>,
    cancel: CancelToken,
    stats: Arc<WorkerStats>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        search: SaltSearch,
        initializer: &[u8],
        result_tx: Sender<PoolMatch>,
        cancel: CancelToken,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            search,
            initializer_hash: keccak256(initializer),
            result_tx,
            cancel,
            stats,
        }
    }

    pub fn run(&self) {
        const BATCH_SIZE: u64 = 1000;

        // Random start, then sequential nonces from there.
        let mut salt = SaltNonce::random();
        let mut attempts = 0u64;

        while !self.cancel.is_cancelled() {
            for _ in 0..BATCH_SIZE {
                attempts += 1;
                let address = self.search.probe(&self.initializer_hash, &salt);

                if self.search.pattern().matches(&address).is_match() {
                    self.stats.matches_found.fetch_add(1, Ordering::Relaxed);
                    let found = SearchMatch {
                        address,
                        salt,
                        attempts,
                    };
                    if self
                        .result_tx
                        .send(PoolMatch {
                            found,
                            worker_id: self.id,
                        })
                        .is_err()
                    {
                        // Receiver gone: nobody wants more results.
                        return;
                    }
                }

                salt.increment();
            }

            self.stats.salts_tried.fetch_add(BATCH_SIZE, Ordering::Relaxed);
        }
    }
}
