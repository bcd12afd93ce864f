//! Atomic deployment: fee transfer and Safe creation in one Multicall3 batch.

use tracing::{info, warn};

use crate::crypto::Address;
use crate::deployments::FallbackHandler;
use crate::initializer::InitializerError;
use crate::rpc::{ChainClient, RpcError, TransactionRequest, TxHash};

use super::calls::{aggregate3_value, create_proxy_with_nonce, disperse_ether, required};
use super::{DeployMethod, DeploymentStatus, DeploymentTarget, Verifier};

/// Service fee sent alongside a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployFee {
    pub recipient: Address,
    /// Wei.
    pub amount: u128,
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("Safe {0} is already deployed")]
    AlreadyDeployed(Address),
    #[error("Safe {address} cannot be deployed on chain {chain_id}")]
    NotDeployable { address: Address, chain_id: u64 },
    #[error("no factory known for singleton {0}")]
    UnknownSingleton(Address),
    #[error("direct deployment needs the original transaction")]
    MissingOriginalTx,
    #[error(transparent)]
    Initializer(#[from] InitializerError),
}

#[derive(Debug)]
pub enum BroadcastOutcome {
    Confirmed(TxHash),
    Reverted(TxHash),
    /// No receipt within the polling window.
    Pending(TxHash),
    Failed(RpcError),
}

/// Result of a deployment attempt plus the chain's status afterwards.
#[derive(Debug)]
pub struct DeploymentReport {
    pub outcome: BroadcastOutcome,
    pub status: DeploymentStatus,
}

impl Verifier {
    /// Builds the Multicall3 `aggregate3Value` transaction for `method`.
    ///
    /// Every call is sent with `allowFailure = false`, so a reverting Safe
    /// creation reverts the fee transfer with it.
    pub fn deployment_bundle(
        &self,
        target: &DeploymentTarget,
        method: DeployMethod,
        fee: Option<&DeployFee>,
        from: Option<Address>,
    ) -> Result<TransactionRequest, DeployError> {
        let (creation, creation_value) = match method {
            DeployMethod::Contract | DeployMethod::ContractAlt => {
                let variant = if method == DeployMethod::Contract {
                    FallbackHandler::Primary
                } else {
                    FallbackHandler::Alternate
                };
                let singleton = self.singleton(target);
                let factory = self
                    .deployments
                    .factory_for(&singleton)
                    .ok_or(DeployError::UnknownSingleton(singleton))?;
                let initializer = self.init_params(target, variant)?.encode();
                let call = required(
                    factory,
                    0,
                    create_proxy_with_nonce(singleton, &initializer, &target.salt),
                );
                (call, 0)
            }
            DeployMethod::Direct => {
                let tx = target
                    .original_tx
                    .as_ref()
                    .ok_or(DeployError::MissingOriginalTx)?;
                let to = tx.to.ok_or(DeployError::MissingOriginalTx)?;
                (required(to, tx.value, tx.input.clone()), tx.value)
            }
            DeployMethod::None => {
                return Err(DeployError::NotDeployable {
                    address: target.expected_address,
                    chain_id: target.chain_id,
                })
            }
        };

        let mut calls = Vec::with_capacity(2);
        let mut value = creation_value;
        if let Some(fee) = fee.filter(|f| f.amount > 0) {
            calls.push(required(
                self.deployments.disperse,
                fee.amount,
                disperse_ether(&[fee.recipient], &[fee.amount]),
            ));
            value += fee.amount;
        }
        calls.push(creation);

        Ok(TransactionRequest {
            from,
            to: self.deployments.multicall,
            data: aggregate3_value(calls),
            value,
        })
    }

    /// Deploys `target` if it is deployable, then re-reads its status.
    ///
    /// The status is re-checked whatever happened to the broadcast.
    pub async fn deploy<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        target: &DeploymentTarget,
        fee: Option<&DeployFee>,
        from: Option<Address>,
    ) -> Result<DeploymentReport, DeployError> {
        let method = match self.status(client, target).await {
            DeploymentStatus::Deployed => {
                return Err(DeployError::AlreadyDeployed(target.expected_address))
            }
            DeploymentStatus::CanDeploy(method) => method,
            DeploymentStatus::CannotDeploy | DeploymentStatus::Loading => {
                return Err(DeployError::NotDeployable {
                    address: target.expected_address,
                    chain_id: client.chain_id(),
                })
            }
        };

        let tx = self.deployment_bundle(target, method, fee, from)?;
        info!(
            chain_id = client.chain_id(),
            address = %target.expected_address,
            %method,
            value = tx.value,
            "deploying Safe"
        );

        let outcome = match client.send_transaction(&tx).await {
            Ok(hash) => self.await_receipt(client, hash).await,
            Err(err) => {
                warn!(chain_id = client.chain_id(), %err, "deployment broadcast failed");
                BroadcastOutcome::Failed(err)
            }
        };

        let status = self.status(client, target).await;
        info!(chain_id = client.chain_id(), ?outcome, %status, "deployment attempt finished");
        Ok(DeploymentReport { outcome, status })
    }

    async fn await_receipt<C: ChainClient + ?Sized>(&self, client: &C, hash: TxHash) -> BroadcastOutcome {
        for attempt in 0..self.receipt_polls {
            if attempt > 0 {
                tokio::time::sleep(self.receipt_interval).await;
            }
            match client.receipt_status(hash).await {
                Ok(Some(true)) => return BroadcastOutcome::Confirmed(hash),
                Ok(Some(false)) => return BroadcastOutcome::Reverted(hash),
                Ok(None) => {}
                Err(err) => warn!(%hash, %err, "receipt lookup failed"),
            }
        }
        BroadcastOutcome::Pending(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::IMulticall3;
    use alloy_sol_types::SolCall;
    use crate::deployments::{SafeDeployments, FACTORY_V130, MULTICALL3};
    use crate::rpc::mock::MockChain;
    use crate::rpc::TransactionRecord;
    use crate::verifier::fixtures::{factory_calldata, target};

    fn verifier() -> Verifier {
        Verifier::new(SafeDeployments::canonical())
    }

    fn fee() -> DeployFee {
        DeployFee {
            recipient: "0x00000000000000000000000000000000000000fe".parse().unwrap(),
            amount: 1_000_000_000_000_000,
        }
    }

    #[test]
    fn test_bundle_includes_fee_and_creation() {
        let v = verifier();
        let t = target();
        let fee = fee();
        let tx = v
            .deployment_bundle(&t, DeployMethod::Contract, Some(&fee), None)
            .unwrap();
        assert_eq!(tx.to, MULTICALL3);
        assert_eq!(tx.value, fee.amount);

        let expected = aggregate3_value(vec![
            required(
                v.deployments().disperse,
                fee.amount,
                disperse_ether(&[fee.recipient], &[fee.amount]),
            ),
            required(
                FACTORY_V130,
                0,
                factory_calldata(&v, &t, FallbackHandler::Primary),
            ),
        ]);
        assert_eq!(tx.data, expected);
    }

    #[test]
    fn test_bundle_without_fee_has_single_call() {
        let v = verifier();
        let t = target();
        let tx = v
            .deployment_bundle(&t, DeployMethod::ContractAlt, None, None)
            .unwrap();
        assert_eq!(tx.value, 0);
        assert_eq!(
            tx.data,
            aggregate3_value(vec![required(
                FACTORY_V130,
                0,
                factory_calldata(&v, &t, FallbackHandler::Alternate),
            )])
        );
    }

    #[test]
    fn test_direct_bundle_replays_original_input() {
        let v = verifier();
        let mut t = target();
        let relay: Address = "0x7777777777777777777777777777777777777777".parse().unwrap();
        let input = vec![0x12, 0x34, 0x56, 0x78, 1, 2];
        t.original_tx = Some(TransactionRecord {
            hash: TxHash([2; 32]),
            from: Address::ZERO,
            to: Some(relay),
            input: input.clone(),
            value: 3,
        });
        let fee = fee();
        let tx = v
            .deployment_bundle(&t, DeployMethod::Direct, Some(&fee), None)
            .unwrap();
        assert_eq!(tx.data[..4], IMulticall3::aggregate3ValueCall::SELECTOR);
        assert_eq!(tx.value, fee.amount + 3);

        let batch = IMulticall3::aggregate3ValueCall::abi_decode(&tx.data).unwrap();
        let creation = &batch.calls[1];
        assert_eq!(Address::from(creation.target), relay);
        assert_eq!(creation.value, alloy_primitives::U256::from(3));
        assert_eq!(creation.callData.to_vec(), input);
    }

    #[test]
    fn test_bundle_refuses_none() {
        assert!(matches!(
            verifier().deployment_bundle(&target(), DeployMethod::None, None, None),
            Err(DeployError::NotDeployable { .. })
        ));
        assert!(matches!(
            verifier().deployment_bundle(&target(), DeployMethod::Direct, None, None),
            Err(DeployError::MissingOriginalTx)
        ));
    }

    #[tokio::test]
    async fn test_deploy_then_recheck() {
        let v = verifier();
        let t = target();
        let chain = MockChain::new(10)
            .on_call(
                FACTORY_V130,
                factory_calldata(&v, &t, FallbackHandler::Primary),
                t.expected_address.to_word().to_vec(),
            )
            .deploys_on_send(t.expected_address);

        let report = v.deploy(&chain, &t, Some(&fee()), None).await.unwrap();
        assert!(matches!(report.outcome, BroadcastOutcome::Confirmed(_)));
        assert_eq!(report.status, DeploymentStatus::Deployed);
        assert_eq!(chain.sent.lock().unwrap().len(), 1);

        assert!(matches!(
            v.deploy(&chain, &t, None, None).await,
            Err(DeployError::AlreadyDeployed(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_broadcast_still_rechecks() {
        let v = verifier();
        let t = target();
        let chain = MockChain::new(10)
            .on_call(
                FACTORY_V130,
                factory_calldata(&v, &t, FallbackHandler::Primary),
                t.expected_address.to_word().to_vec(),
            )
            .failing_sends();

        let report = v.deploy(&chain, &t, None, None).await.unwrap();
        assert!(matches!(report.outcome, BroadcastOutcome::Failed(_)));
        assert_eq!(report.status, DeploymentStatus::CanDeploy(DeployMethod::Contract));
        // one classification before the attempt, one after
        assert_eq!(chain.calls(), 2);
    }

    #[tokio::test]
    async fn test_undeployable_target_is_refused() {
        let v = verifier();
        let chain = MockChain::new(10);
        assert!(matches!(
            v.deploy(&chain, &target(), None, None).await,
            Err(DeployError::NotDeployable { chain_id: 10, .. })
        ));
        assert!(chain.sent.lock().unwrap().is_empty());
    }
}
