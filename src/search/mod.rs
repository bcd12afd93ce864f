//! Vanity salt search: a cooperative async engine and the session that owns
//! its output slot.

mod cancel;
mod engine;
mod session;

pub use cancel::CancelToken;
pub use engine::{SaltSearch, SearchMatch, SearchOutcome};
pub use session::{SearchSession, SearchState};
