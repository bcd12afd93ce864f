use std::fmt;
use std::str::FromStr;

use crate::crypto::Address;

/// 32-byte transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TxHash(pub [u8; 32]);

impl FromStr for TxHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let h = s.trim().strip_prefix("0x").unwrap_or(s.trim());
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(h, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl From<alloy_primitives::B256> for TxHash {
    fn from(hash: alloy_primitives::B256) -> Self {
        Self(hash.0)
    }
}

impl From<TxHash> for alloy_primitives::B256 {
    fn from(hash: TxHash) -> Self {
        Self::new(hash.0)
    }
}

/// The parts of a mined transaction needed to replay it elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub from: Address,
    /// `None` for contract creations, which cannot be replayed as a call.
    pub to: Option<Address>,
    pub input: Vec<u8>,
    pub value: u128,
}

/// A call or transaction to send; `from: None` leaves the sender to the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Vec<u8>,
    pub value: u128,
}
