//! Probe-and-reject salt search.

use tracing::debug;

use crate::crypto::{
    create2_address, keccak256, proxy_init_code_hash, safe_salt, Address, SaltNonce,
};
use crate::matcher::Pattern;

use super::CancelToken;

/// An accepted salt and the address it derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub address: Address,
    pub salt: SaltNonce,
    /// Probes spent to find it, including the accepted one.
    pub attempts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(SearchMatch),
    /// Stopped by the cancel token before a match; carries the probes made.
    Cancelled { attempts: u64 },
}

impl SearchOutcome {
    pub fn found(&self) -> Option<&SearchMatch> {
        match self {
            SearchOutcome::Found(m) => Some(m),
            SearchOutcome::Cancelled { .. } => None,
        }
    }
}

/// Derives Safe proxy addresses through one factory and looks for a salt
/// whose address satisfies a [`Pattern`].
#[derive(Debug, Clone)]
pub struct SaltSearch {
    factory: Address,
    init_code_hash: [u8; 32],
    pattern: Pattern,
}

impl SaltSearch {
    pub fn new(factory: Address, init_code_hash: [u8; 32], pattern: Pattern) -> Self {
        Self {
            factory,
            init_code_hash,
            pattern,
        }
    }

    /// Builds the init code hash from the factory's proxy creation code.
    pub fn from_creation_code(
        factory: Address,
        creation_code: &[u8],
        singleton: &Address,
        pattern: Pattern,
    ) -> Self {
        Self::new(factory, proxy_init_code_hash(creation_code, singleton), pattern)
    }

    pub fn factory(&self) -> Address {
        self.factory
    }
    pub fn init_code_hash(&self) -> &[u8; 32] {
        &self.init_code_hash
    }
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// One derivation: the address for `seed` given keccak256(initializer).
    #[inline]
    pub fn probe(&self, initializer_hash: &[u8; 32], seed: &SaltNonce) -> Address {
        let salt = safe_salt(initializer_hash, seed);
        create2_address(&self.factory, &self.init_code_hash, &salt)
    }

    pub fn predict(&self, initializer: &[u8], salt: &SaltNonce) -> Address {
        self.probe(&keccak256(initializer), salt)
    }

    /// Expert mode: take `salt` as given, no constraint check.
    pub fn pinned(&self, initializer: &[u8], salt: SaltNonce) -> SearchMatch {
        SearchMatch {
            address: self.predict(initializer, &salt),
            salt,
            attempts: 1,
        }
    }

    /// Probes `seed`, then fresh random seeds, until an address matches the
    /// pattern or `cancel` is set. Yields to the runtime after every
    /// rejected probe so cancellation and other tasks are serviced.
    pub async fn find_address(
        &self,
        initializer: &[u8],
        seed: SaltNonce,
        cancel: &CancelToken,
    ) -> SearchOutcome {
        self.find_address_with(initializer, seed, cancel, |_| {}).await
    }

    /// [`find_address`](Self::find_address), calling `on_seed` with each
    /// seed right before it is tried.
    pub async fn find_address_with(
        &self,
        initializer: &[u8],
        seed: SaltNonce,
        cancel: &CancelToken,
        mut on_seed: impl FnMut(&SaltNonce),
    ) -> SearchOutcome {
        let initializer_hash = keccak256(initializer);
        let mut seed = seed;
        let mut attempts = 0u64;

        debug!(
            factory = %self.factory,
            pattern = %self.pattern,
            difficulty = self.pattern.estimated_difficulty(),
            "starting salt search"
        );

        loop {
            if cancel.is_cancelled() {
                debug!(attempts, "salt search cancelled");
                return SearchOutcome::Cancelled { attempts };
            }

            attempts += 1;
            on_seed(&seed);
            let address = self.probe(&initializer_hash, &seed);
            if self.pattern.matches(&address).is_match() {
                debug!(%address, salt = %seed, attempts, "salt search matched");
                return SearchOutcome::Found(SearchMatch {
                    address,
                    salt: seed,
                    attempts,
                });
            }

            seed = SaltNonce::random_seed();
            tokio::task::yield_now().await;
        }
    }
}
