//! Chain access used by the verifier: read-only calls, bytecode lookups and
//! transaction broadcast.

mod http;
#[cfg(test)]
pub(crate) mod mock;
mod types;

use alloy::transports::TransportError;
use async_trait::async_trait;

pub use http::HttpClient;
pub use types::{TransactionRecord, TransactionRequest, TxHash};

use crate::crypto::Address;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(TransportError),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed rpc response: {0}")]
    Decode(String),
    #[error("transaction {0} not found")]
    TransactionNotFound(TxHash),
}

impl From<TransportError> for RpcError {
    /// Error responses from the node keep their code; everything else is transport.
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => Self::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
            },
            None => Self::Transport(err),
        }
    }
}

/// One chain's JSON-RPC surface, as far as this crate needs it.
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn chain_id(&self) -> u64;

    /// Read-only call against latest state (`eth_call`), carrying the
    /// request's sender and value. Reverts surface as errors.
    async fn call(&self, tx: &TransactionRequest) -> Result<Vec<u8>, RpcError>;

    /// Deployed bytecode at `address`; empty when nothing is deployed.
    async fn code(&self, address: Address) -> Result<Vec<u8>, RpcError>;

    /// The mined transaction `hash`, or `None` if the node does not know it.
    async fn transaction(&self, hash: TxHash) -> Result<Option<TransactionRecord>, RpcError>;

    /// Submits a transaction for the node/wallet to sign and broadcast.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, RpcError>;

    /// `Some(true)` once mined successfully, `Some(false)` if reverted, `None` while pending.
    async fn receipt_status(&self, hash: TxHash) -> Result<Option<bool>, RpcError>;
}

/// Fetches the transaction that deployed the Safe on its source chain.
pub async fn original_transaction<C: ChainClient + ?Sized>(
    client: &C,
    hash: TxHash,
) -> Result<TransactionRecord, RpcError> {
    client
        .transaction(hash)
        .await?
        .ok_or(RpcError::TransactionNotFound(hash))
}
