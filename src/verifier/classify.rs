use tracing::{debug, warn};

use crate::deployments::FallbackHandler;
use crate::rpc::{ChainClient, TransactionRecord, TransactionRequest};

use super::calls::{create_proxy_with_nonce, created_in_bundle, decode_created_address};
use super::{DeployMethod, Deployability, DeploymentTarget, Verifier};

impl Verifier {
    /// Decides whether `target` can be deployed on `client`'s chain.
    ///
    /// Checks run in order and the first match wins: L1-only singleton
    /// (never), factory simulation with the primary then the alternate
    /// fallback handler, then a replay of the original transaction. A
    /// failing check counts as no match; this never errors.
    pub async fn classify<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        target: &DeploymentTarget,
    ) -> Deployability {
        let chain_id = client.chain_id();
        let singleton = self.singleton(target);

        if self.deployments.is_l1_only(&singleton) {
            debug!(chain_id, %singleton, "L1-only singleton, not replicable");
            return Deployability::none();
        }

        for (variant, method) in [
            (FallbackHandler::Primary, DeployMethod::Contract),
            (FallbackHandler::Alternate, DeployMethod::ContractAlt),
        ] {
            if self.simulate_factory(client, target, variant).await {
                debug!(chain_id, %method, address = %target.expected_address, "deployable");
                return Deployability::via(method);
            }
        }

        if let Some(tx) = &target.original_tx {
            if self.replay(client, target, tx).await {
                debug!(chain_id, address = %target.expected_address, "deployable by replay");
                return Deployability::via(DeployMethod::Direct);
            }
        }

        debug!(chain_id, address = %target.expected_address, "no deployment method matched");
        Deployability::none()
    }

    async fn simulate_factory<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        target: &DeploymentTarget,
        variant: FallbackHandler,
    ) -> bool {
        let chain_id = client.chain_id();
        let singleton = self.singleton(target);

        let Some(factory) = self.deployments.factory_for(&singleton) else {
            warn!(chain_id, %singleton, "no factory known for singleton");
            return false;
        };
        let params = match self.init_params(target, variant) {
            Ok(params) => params,
            Err(err) => {
                warn!(chain_id, %err, "cannot encode initializer");
                return false;
            }
        };

        let request = TransactionRequest {
            from: None,
            to: factory,
            data: create_proxy_with_nonce(singleton, &params.encode(), &target.salt),
            value: 0,
        };
        match client.call(&request).await {
            Ok(output) => {
                let simulated = decode_created_address(&output);
                debug!(chain_id, ?variant, ?simulated, "factory simulation");
                simulated == Some(target.expected_address)
            }
            Err(err) => {
                warn!(chain_id, ?variant, %err, "factory simulation failed");
                false
            }
        }
    }

    async fn replay<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        target: &DeploymentTarget,
        tx: &TransactionRecord,
    ) -> bool {
        let chain_id = client.chain_id();
        let Some(to) = tx.to else {
            debug!(chain_id, hash = %tx.hash, "original transaction is a contract creation");
            return false;
        };
        let request = TransactionRequest {
            from: Some(tx.from),
            to,
            data: tx.input.clone(),
            value: tx.value,
        };
        match client.call(&request).await {
            Ok(output) => {
                // Multicall3 returns Result[]; the proxy is in the factory call's returnData.
                let created = if to == self.deployments.multicall {
                    created_in_bundle(&tx.input, &output)
                } else {
                    decode_created_address(&output).into_iter().collect()
                };
                debug!(chain_id, hash = %tx.hash, ?created, "replayed original transaction");
                created.contains(&target.expected_address)
            }
            Err(err) => {
                warn!(chain_id, hash = %tx.hash, %err, "replaying original transaction failed");
                false
            }
        }
    }
}
