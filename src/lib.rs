//! # multisafe
//!
//! Counterfactual multi-chain Safe addresses. Encodes the Safe `setup`
//! initializer, searches salt nonces until the CREATE2-derived proxy address
//! matches a desired prefix/suffix, and checks whether a Safe can be
//! reproduced at the same address on other chains.
//!
//! Uses the same formula as SafeProxyFactory: salt = keccak256(initializerHash || saltNonce),
//! then address = keccak256(0xff || factory || salt || initCodeHash)[12..32].
//!
//! ## Architecture
//!
//! - `initializer`: Safe `setup` call data and owner/threshold validation
//! - `search`: cooperative salt search and its single output slot
//! - `worker`: multi-threaded search pool for the CLI
//! - `verifier`: cross-chain deployability and atomic deployment
//! - `link`: deep-link query serialization of a found address
//! - `contracts`: Solidity interfaces of the Safe, factory, Disperse and Multicall3
//! - `rpc`: JSON-RPC chain access over an alloy provider

pub mod config;
pub mod contracts;
pub mod crypto;
pub mod deployments;
pub mod initializer;
pub mod link;
pub mod matcher;
pub mod rpc;
pub mod search;
pub mod verifier;
pub mod worker;

pub use config::Config;
pub use crypto::{predict_safe_address, Address, SaltNonce};
pub use deployments::{FallbackHandler, SafeDeployments};
pub use initializer::{encode_initializer, InitParams, InitializerError};
pub use link::DeploymentLink;
pub use matcher::Pattern;
pub use search::{CancelToken, SaltSearch, SearchOutcome, SearchSession, SearchState};
pub use verifier::{DeployMethod, Deployability, DeploymentStatus, DeploymentTarget, Verifier};
pub use worker::{PoolMatch, WorkerPool};
