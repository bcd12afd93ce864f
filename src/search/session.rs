//! The single output slot a UI observes while salts are searched.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::crypto::{Address, SaltNonce};

use super::{CancelToken, SaltSearch, SearchOutcome};

/// Observable search output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchState {
    pub address: Option<Address>,
    /// The seed being tried while searching; the accepted salt once found.
    /// A cancelled search leaves the last seed it tried.
    pub salt: SaltNonce,
    pub is_searching: bool,
}

struct Running {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

/// Runs at most one search at a time against one [`SearchState`] slot.
///
/// Starting a search cancels and awaits the previous one first, so an older
/// search can never overwrite the result of a newer one.
pub struct SearchSession {
    state: Arc<watch::Sender<SearchState>>,
    running: Option<Running>,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SearchState::default());
        Self {
            state: Arc::new(tx),
            running: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        *self.state.borrow()
    }

    /// Replaces any in-flight search with a new one seeded by `seed`.
    pub async fn start(&mut self, search: SaltSearch, initializer: Vec<u8>, seed: SaltNonce) {
        self.cancel().await;

        self.state.send_replace(SearchState {
            address: None,
            salt: seed,
            is_searching: true,
        });

        let cancel = CancelToken::new();
        let token = cancel.clone();
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            let outcome = search
                .find_address_with(&initializer, seed, &token, |tried| {
                    state.send_modify(|s| s.salt = *tried)
                })
                .await;
            match outcome {
                SearchOutcome::Found(m) => {
                    state.send_replace(SearchState {
                        address: Some(m.address),
                        salt: m.salt,
                        is_searching: false,
                    });
                }
                SearchOutcome::Cancelled { .. } => {
                    state.send_modify(|s| s.is_searching = false);
                }
            }
        });

        self.running = Some(Running { cancel, handle });
    }

    /// Expert mode: publish the address for an exact salt, no search.
    pub async fn pin(&mut self, search: &SaltSearch, initializer: &[u8], salt: SaltNonce) {
        self.cancel().await;
        let m = search.pinned(initializer, salt);
        self.state.send_replace(SearchState {
            address: Some(m.address),
            salt: m.salt,
            is_searching: false,
        });
    }

    /// Stops the in-flight search, if any, and waits for it to finish.
    pub async fn cancel(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
            if let Err(err) = running.handle.await {
                warn!(%err, "salt search task ended abnormally");
            }
        }
        self.state.send_modify(|s| s.is_searching = false);
    }

    /// Waits for the in-flight search to finish on its own.
    pub async fn wait(&mut self) -> SearchState {
        if let Some(running) = self.running.take() {
            if let Err(err) = running.handle.await {
                warn!(%err, "salt search task ended abnormally");
                self.state.send_modify(|s| s.is_searching = false);
            }
        }
        self.state()
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployments::{FACTORY_V130, INIT_CODE_HASH_V130_L1};
    use crate::matcher::Pattern;

    fn search(prefix: &str) -> SaltSearch {
        SaltSearch::new(
            FACTORY_V130,
            INIT_CODE_HASH_V130_L1,
            Pattern::new(Some(prefix), None).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_search_publishes_result() {
        let mut session = SearchSession::new();
        let s = search("0");
        session.start(s.clone(), vec![1], SaltNonce::random()).await;
        let state = session.wait().await;
        assert!(!state.is_searching);
        let address = state.address.unwrap();
        assert!(address.to_hex().starts_with('0'));
        assert_eq!(s.predict(&[1], &state.salt), address);
    }

    #[tokio::test]
    async fn test_restart_cancels_stale_search() {
        let mut session = SearchSession::new();
        let rx = session.subscribe();

        // Unreachable pattern keeps the first search running.
        session
            .start(search(&"f".repeat(40)), vec![1], SaltNonce::ZERO)
            .await;
        assert!(rx.borrow().is_searching);

        let s = search("");
        let seed = SaltNonce::from_u64(5);
        session.start(s.clone(), vec![2], seed).await;
        let state = session.wait().await;
        assert_eq!(state.salt, seed);
        assert_eq!(state.address, Some(s.predict(&[2], &seed)));
        assert_eq!(*rx.borrow(), state);
    }

    #[tokio::test]
    async fn test_salt_follows_search_until_cancelled() {
        let mut session = SearchSession::new();
        let mut rx = session.subscribe();
        let seed = SaltNonce::from_u64(11);
        session.start(search(&"f".repeat(40)), vec![1], seed).await;
        assert_eq!(rx.borrow_and_update().salt, seed);

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while rx.borrow_and_update().salt == seed {
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        session.cancel().await;
        let frozen = session.state();
        assert!(!frozen.is_searching);
        assert_eq!(frozen.address, None);
        assert_ne!(frozen.salt, seed);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(session.state(), frozen);
    }

    #[tokio::test]
    async fn test_pin_sets_exact_salt() {
        let mut session = SearchSession::new();
        let s = search("ffff");
        let salt = SaltNonce::from_u64(99);
        session.pin(&s, &[3], salt).await;
        assert_eq!(session.state().address, Some(s.predict(&[3], &salt)));
    }
}
