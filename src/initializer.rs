//! Safe `setup` initializer encoding.
//!
//! The initializer bytes feed the proxy salt, so the encoding has to match
//! the Safe contracts exactly for a predicted address to be reachable.

use std::collections::HashSet;

use alloy_primitives::U256;
use alloy_sol_types::SolCall;

use crate::contracts::ISafe;
use crate::crypto::Address;
use crate::deployments::{FallbackHandler, SafeDeployments};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitializerError {
    #[error("Invalid owner set: {0}")]
    InvalidOwnerSet(String),
    #[error("Invalid threshold: {threshold} (must be between 1 and {owners})")]
    InvalidThreshold { threshold: usize, owners: usize },
}

/// Everything that determines a Safe's initializer and proxy deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitParams {
    owners: Vec<Address>,
    threshold: usize,
    payment_receiver: Address,
    fallback_handler: Address,
    singleton: Address,
}

impl InitParams {
    /// Validates owners and threshold. Owner order is kept; it changes the address.
    pub fn new(
        owners: Vec<Address>,
        threshold: usize,
        payment_receiver: Address,
        fallback_handler: Address,
        singleton: Address,
    ) -> Result<Self, InitializerError> {
        validate(&owners, threshold)?;
        Ok(Self {
            owners,
            threshold,
            payment_receiver,
            fallback_handler,
            singleton,
        })
    }

    /// Params with a zero payment receiver and the given fallback handler variant.
    pub fn with_deployments(
        deployments: &SafeDeployments,
        owners: Vec<Address>,
        threshold: usize,
        singleton: Address,
        variant: FallbackHandler,
    ) -> Result<Self, InitializerError> {
        Self::new(
            owners,
            threshold,
            Address::ZERO,
            deployments.fallback_handler(variant),
            singleton,
        )
    }

    /// Returns the owners in initializer order.
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Returns the number of confirmations a transaction needs.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Returns the account paid by `setup`; zero when no payment is made.
    pub fn payment_receiver(&self) -> Address {
        self.payment_receiver
    }

    /// Returns the fallback handler written into the Safe's storage.
    pub fn fallback_handler(&self) -> Address {
        self.fallback_handler
    }

    /// Returns the singleton the proxy delegates to.
    pub fn singleton(&self) -> Address {
        self.singleton
    }

    /// Encodes the `setup` call data.
    pub fn encode(&self) -> Vec<u8> {
        setup_call(
            &self.owners,
            self.threshold,
            self.payment_receiver,
            self.fallback_handler,
        )
    }
}

fn validate(owners: &[Address], threshold: usize) -> Result<(), InitializerError> {
    if owners.is_empty() {
        return Err(InitializerError::InvalidOwnerSet("no owners".into()));
    }
    let mut seen = HashSet::with_capacity(owners.len());
    for owner in owners {
        if owner.is_zero() {
            return Err(InitializerError::InvalidOwnerSet(
                "zero address cannot be an owner".into(),
            ));
        }
        if !seen.insert(owner) {
            return Err(InitializerError::InvalidOwnerSet(format!(
                "duplicate owner {owner}"
            )));
        }
    }
    if threshold == 0 || threshold > owners.len() {
        return Err(InitializerError::InvalidThreshold {
            threshold,
            owners: owners.len(),
        });
    }
    Ok(())
}

fn setup_call(
    owners: &[Address],
    threshold: usize,
    payment_receiver: Address,
    fallback_handler: Address,
) -> Vec<u8> {
    ISafe::setupCall {
        _owners: owners.iter().copied().map(Into::into).collect(),
        _threshold: U256::from(threshold),
        to: alloy_primitives::Address::ZERO,
        data: Default::default(),
        fallbackHandler: fallback_handler.into(),
        // native asset, no payment
        paymentToken: alloy_primitives::Address::ZERO,
        payment: U256::ZERO,
        paymentReceiver: payment_receiver.into(),
    }
    .abi_encode()
}

/// Validates and encodes a Safe `setup` call.
pub fn encode_initializer(
    owners: &[Address],
    threshold: usize,
    payment_receiver: Address,
    fallback_handler: Address,
    singleton: Address,
) -> Result<Vec<u8>, InitializerError> {
    let params = InitParams::new(
        owners.to_vec(),
        threshold,
        payment_receiver,
        fallback_handler,
        singleton,
    )?;
    Ok(params.encode())
}
