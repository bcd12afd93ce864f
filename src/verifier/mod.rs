//! Cross-chain verification: can a Safe that exists (or was predicted) on
//! one chain be deployed at the same address on another, and how.

pub mod calls;
mod classify;
mod deploy;
mod status;

use std::fmt;
use std::time::Duration;

pub use deploy::{BroadcastOutcome, DeployError, DeployFee, DeploymentReport};
pub use status::{DeploymentStatus, StatusView};

use crate::crypto::{Address, SaltNonce};
use crate::deployments::{FallbackHandler, SafeDeployments};
use crate::initializer::{InitParams, InitializerError};
use crate::rpc::TransactionRecord;

/// How a Safe can be reproduced on a target chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployMethod {
    /// Factory call with the primary fallback handler.
    Contract,
    /// Factory call with the alternate fallback handler.
    ContractAlt,
    /// Replay of the original deployment transaction's call data.
    Direct,
    #[default]
    None,
}

impl fmt::Display for DeployMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeployMethod::Contract => "contract",
            DeployMethod::ContractAlt => "contractAlt",
            DeployMethod::Direct => "direct",
            DeployMethod::None => "none",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deployability {
    pub can_deploy: bool,
    pub method: DeployMethod,
}

impl Deployability {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn via(method: DeployMethod) -> Self {
        Self {
            can_deploy: method != DeployMethod::None,
            method,
        }
    }
}

/// A Safe to be checked (and possibly deployed) on one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    pub chain_id: u64,
    pub expected_address: Address,
    pub owners: Vec<Address>,
    pub threshold: usize,
    pub salt: SaltNonce,
    /// Defaults to [`SafeDeployments::default_singleton`].
    pub singleton: Option<Address>,
    /// Defaults to the zero address.
    pub payment_receiver: Option<Address>,
    /// The transaction that created the Safe on its source chain.
    pub original_tx: Option<TransactionRecord>,
}

/// Classifies and deploys [`DeploymentTarget`]s against a set of Safe contracts.
#[derive(Debug, Clone)]
pub struct Verifier {
    deployments: SafeDeployments,
    receipt_polls: u32,
    receipt_interval: Duration,
}

impl Verifier {
    pub fn new(deployments: SafeDeployments) -> Self {
        Self {
            deployments,
            receipt_polls: 30,
            receipt_interval: Duration::from_secs(2),
        }
    }

    /// How long [`Verifier::deploy`] waits for a receipt before reporting it pending.
    pub fn with_receipt_polling(mut self, polls: u32, interval: Duration) -> Self {
        self.receipt_polls = polls;
        self.receipt_interval = interval;
        self
    }

    pub fn deployments(&self) -> &SafeDeployments {
        &self.deployments
    }

    fn singleton(&self, target: &DeploymentTarget) -> Address {
        self.deployments.resolve_singleton(target.singleton)
    }

    fn init_params(
        &self,
        target: &DeploymentTarget,
        variant: FallbackHandler,
    ) -> Result<InitParams, InitializerError> {
        InitParams::new(
            target.owners.clone(),
            target.threshold,
            target.payment_receiver.unwrap_or(Address::ZERO),
            self.deployments.fallback_handler(variant),
            self.singleton(target),
        )
    }
}
