//! Solidity interfaces for the contracts multisafe calls.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface ISafe {
        function setup(
            address[] calldata _owners,
            uint256 _threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address paymentReceiver
        ) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface ISafeProxyFactory {
        function createProxyWithNonce(
            address _singleton,
            bytes memory initializer,
            uint256 saltNonce
        ) public returns (address proxy);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IDisperse {
        function disperseEther(address[] recipients, uint256[] values) external payable;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IMulticall3 {
        struct Call3Value {
            address target;
            bool allowFailure;
            uint256 value;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3Value(Call3Value[] calldata calls)
            external
            payable
            returns (Result[] memory returnData);
    }
}
