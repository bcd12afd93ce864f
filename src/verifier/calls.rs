//! Call data for the factory, Disperse and Multicall3 contracts.

use alloy_primitives::U256;
use alloy_sol_types::SolCall;

use crate::contracts::{IDisperse, IMulticall3, ISafeProxyFactory};
use crate::crypto::{Address, SaltNonce};

pub use crate::contracts::IMulticall3::Call3Value;

/// `SafeProxyFactory.createProxyWithNonce(singleton, initializer, saltNonce)`.
pub fn create_proxy_with_nonce(singleton: Address, initializer: &[u8], salt: &SaltNonce) -> Vec<u8> {
    ISafeProxyFactory::createProxyWithNonceCall {
        _singleton: singleton.into(),
        initializer: initializer.to_vec().into(),
        saltNonce: (*salt).into(),
    }
    .abi_encode()
}

/// `Disperse.disperseEther(recipients, values)`.
pub fn disperse_ether(recipients: &[Address], values: &[u128]) -> Vec<u8> {
    IDisperse::disperseEtherCall {
        recipients: recipients.iter().copied().map(Into::into).collect(),
        values: values.iter().map(|v| U256::from(*v)).collect(),
    }
    .abi_encode()
}

/// A batch entry whose revert reverts the whole batch.
pub fn required(target: Address, value: u128, call_data: Vec<u8>) -> Call3Value {
    Call3Value {
        target: target.into(),
        allowFailure: false,
        value: U256::from(value),
        callData: call_data.into(),
    }
}

/// `Multicall3.aggregate3Value(calls)`.
pub fn aggregate3_value(calls: Vec<Call3Value>) -> Vec<u8> {
    IMulticall3::aggregate3ValueCall { calls }.abi_encode()
}

/// Reads the proxy address returned by `createProxyWithNonce`.
pub fn decode_created_address(output: &[u8]) -> Option<Address> {
    ISafeProxyFactory::createProxyWithNonceCall::abi_decode_returns(output)
        .ok()
        .map(Address::from)
}

/// Proxies created by the successful factory calls of an `aggregate3Value`
/// batch, given the batch call data and its return data.
pub fn created_in_bundle(input: &[u8], output: &[u8]) -> Vec<Address> {
    let Ok(batch) = IMulticall3::aggregate3ValueCall::abi_decode(input) else {
        return Vec::new();
    };
    let Ok(results) = IMulticall3::aggregate3ValueCall::abi_decode_returns(output) else {
        return Vec::new();
    };
    batch
        .calls
        .iter()
        .zip(&results)
        .filter(|(call, result)| {
            result.success
                && call
                    .callData
                    .starts_with(&ISafeProxyFactory::createProxyWithNonceCall::SELECTOR)
        })
        .filter_map(|(_, result)| decode_created_address(&result.returnData))
        .collect()
}
