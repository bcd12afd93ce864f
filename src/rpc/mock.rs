//! Scripted in-memory chain for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChainClient, RpcError, TransactionRecord, TransactionRequest, TxHash};
use crate::crypto::Address;

#[derive(Default)]
pub(crate) struct MockChain {
    chain_id: u64,
    calls: Mutex<HashMap<(Address, Vec<u8>, u128), Vec<u8>>>,
    code: Mutex<HashMap<Address, Vec<u8>>>,
    transactions: HashMap<TxHash, TransactionRecord>,
    /// Code installed at an address once a transaction is sent.
    deploys_on_send: Option<Address>,
    fail_sends: bool,
    pub(crate) call_count: AtomicUsize,
    pub(crate) sent: Mutex<Vec<TransactionRequest>>,
}

impl MockChain {
    pub(crate) fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Default::default()
        }
    }

    /// `eth_call(to, data)` with no value returns `output`; unscripted calls revert.
    pub(crate) fn on_call(self, to: Address, data: Vec<u8>, output: Vec<u8>) -> Self {
        self.on_call_with_value(to, data, 0, output)
    }

    pub(crate) fn on_call_with_value(
        self,
        to: Address,
        data: Vec<u8>,
        value: u128,
        output: Vec<u8>,
    ) -> Self {
        self.calls.lock().unwrap().insert((to, data, value), output);
        self
    }

    pub(crate) fn with_code(self, address: Address) -> Self {
        self.code.lock().unwrap().insert(address, vec![0x60, 0x80]);
        self
    }

    pub(crate) fn with_transaction(mut self, tx: TransactionRecord) -> Self {
        self.transactions.insert(tx.hash, tx);
        self
    }

    pub(crate) fn deploys_on_send(mut self, address: Address) -> Self {
        self.deploys_on_send = Some(address);
        self
    }

    pub(crate) fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Vec<u8>, RpcError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .get(&(tx.to, tx.data.clone(), tx.value))
            .cloned()
            .ok_or_else(|| RpcError::Rpc {
                code: 3,
                message: "execution reverted".into(),
            })
    }

    async fn code(&self, address: Address) -> Result<Vec<u8>, RpcError> {
        Ok(self
            .code
            .lock()
            .unwrap()
            .get(&address)
            .cloned()
            .unwrap_or_default())
    }

    async fn transaction(&self, hash: TxHash) -> Result<Option<TransactionRecord>, RpcError> {
        Ok(self.transactions.get(&hash).cloned())
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, RpcError> {
        if self.fail_sends {
            return Err(RpcError::Rpc {
                code: -32000,
                message: "insufficient funds".into(),
            });
        }
        self.sent.lock().unwrap().push(tx.clone());
        if let Some(address) = self.deploys_on_send {
            self.code.lock().unwrap().insert(address, vec![0x60, 0x80]);
        }
        Ok(TxHash([0xab; 32]))
    }

    async fn receipt_status(&self, _hash: TxHash) -> Result<Option<bool>, RpcError> {
        Ok(Some(self.deploys_on_send.is_some()))
    }
}
