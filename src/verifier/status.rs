use futures::future::join_all;
use tracing::warn;

use crate::rpc::ChainClient;

use super::{DeployMethod, DeploymentTarget, Verifier};

/// What a UI shows for one target chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentStatus {
    /// Not checked yet.
    #[default]
    Loading,
    Deployed,
    CanDeploy(DeployMethod),
    CannotDeploy,
}

/// Flattened status for consumers that want plain fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusView {
    pub can_deploy: bool,
    pub is_loading: bool,
    pub method: DeployMethod,
}

impl DeploymentStatus {
    pub fn view(&self) -> StatusView {
        let (can_deploy, method) = match *self {
            DeploymentStatus::CanDeploy(method) => (true, method),
            _ => (false, DeployMethod::None),
        };
        StatusView {
            can_deploy,
            is_loading: matches!(self, DeploymentStatus::Loading),
            method,
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentStatus::Loading => write!(f, "Loading"),
            DeploymentStatus::Deployed => write!(f, "Deployed"),
            DeploymentStatus::CanDeploy(method) => write!(f, "CanDeploy ({method})"),
            DeploymentStatus::CannotDeploy => write!(f, "CannotDeploy"),
        }
    }
}

impl Verifier {
    /// Current status of `target` on `client`'s chain, read from the chain.
    ///
    /// Bytecode at the expected address means deployed; otherwise the
    /// target is classified. A failed bytecode lookup falls through to
    /// classification.
    pub async fn status<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        target: &DeploymentTarget,
    ) -> DeploymentStatus {
        match client.code(target.expected_address).await {
            Ok(code) if !code.is_empty() => return DeploymentStatus::Deployed,
            Ok(_) => {}
            Err(err) => {
                warn!(
                    chain_id = client.chain_id(),
                    address = %target.expected_address,
                    %err,
                    "bytecode lookup failed"
                );
            }
        }

        let result = self.classify(client, target).await;
        if result.can_deploy {
            DeploymentStatus::CanDeploy(result.method)
        } else {
            DeploymentStatus::CannotDeploy
        }
    }

    /// Checks several chains concurrently; results keep the input order.
    pub async fn status_all<'a, C, I>(&self, chains: I) -> Vec<DeploymentStatus>
    where
        C: ChainClient + ?Sized + 'a,
        I: IntoIterator<Item = (&'a C, &'a DeploymentTarget)>,
    {
        join_all(
            chains
                .into_iter()
                .map(|(client, target)| self.status(client, target)),
        )
        .await
    }
}
