//! [`ChainClient`] over an alloy HTTP provider.

use alloy::consensus::Transaction;
use alloy::network::{ReceiptResponse, TransactionBuilder, TransactionResponse};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest as EthTransactionRequest;
use alloy_primitives::{B256, U256};
use async_trait::async_trait;
use tracing::trace;
use url::Url;

use super::{ChainClient, RpcError, TransactionRecord, TransactionRequest, TxHash};
use crate::crypto::Address;

/// A [`ChainClient`] talking to one JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct HttpClient {
    provider: RootProvider,
    chain_id: u64,
}

impl HttpClient {
    /// Client for an endpoint whose chain id is already known.
    pub fn new(chain_id: u64, url: Url) -> Self {
        Self::from_provider(chain_id, RootProvider::new_http(url))
    }

    pub fn from_provider(chain_id: u64, provider: RootProvider) -> Self {
        Self { provider, chain_id }
    }

    /// Client for an endpoint whose chain id is read with `eth_chainId`.
    pub async fn connect(url: Url) -> Result<Self, RpcError> {
        let provider = RootProvider::new_http(url);
        let chain_id = provider.get_chain_id().await?;
        Ok(Self::from_provider(chain_id, provider))
    }
}

fn eth_request(tx: &TransactionRequest) -> EthTransactionRequest {
    let request = EthTransactionRequest::default()
        .with_to(tx.to.into())
        .with_input(tx.data.clone())
        .with_value(U256::from(tx.value));
    match tx.from {
        Some(from) => request.with_from(from.into()),
        None => request,
    }
}

#[async_trait]
impl ChainClient for HttpClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Vec<u8>, RpcError> {
        trace!(chain_id = self.chain_id, to = %tx.to, value = tx.value, "eth_call");
        let out = self.provider.call(eth_request(tx)).await?;
        Ok(out.to_vec())
    }

    async fn code(&self, address: Address) -> Result<Vec<u8>, RpcError> {
        let code = self.provider.get_code_at(address.into()).await?;
        Ok(code.to_vec())
    }

    async fn transaction(&self, hash: TxHash) -> Result<Option<TransactionRecord>, RpcError> {
        let Some(tx) = self.provider.get_transaction_by_hash(B256::from(hash)).await? else {
            return Ok(None);
        };
        let value = Transaction::value(&tx);
        let value = u128::try_from(value)
            .map_err(|_| RpcError::Decode(format!("value {value} exceeds 128 bits")))?;
        Ok(Some(TransactionRecord {
            hash: TransactionResponse::tx_hash(&tx).into(),
            from: TransactionResponse::from(&tx).into(),
            to: Transaction::to(&tx).map(Address::from),
            input: Transaction::input(&tx).to_vec(),
            value,
        }))
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, RpcError> {
        let pending = self.provider.send_transaction(eth_request(tx)).await?;
        Ok((*pending.tx_hash()).into())
    }

    async fn receipt_status(&self, hash: TxHash) -> Result<Option<bool>, RpcError> {
        let receipt = self.provider.get_transaction_receipt(hash.into()).await?;
        Ok(receipt.map(|r| r.status()))
    }
}
