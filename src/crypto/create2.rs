//! Safe CREATE2 address computation.
//!
//! Matches SafeProxyFactory.createProxyWithNonce:
//!   salt = keccak256(abi.encodePacked(keccak256(initializer), saltNonce))
//!   address = CREATE2(factory, salt, keccak256(proxyCreationCode || uint256(singleton)))[12:32]

use super::{keccak256, Address, SaltNonce};

/// Computes the CREATE2 salt used by Safe: keccak256(initializer_hash || salt_nonce).
pub fn safe_salt(initializer_hash: &[u8; 32], salt_nonce: &SaltNonce) -> [u8; 32] {
    let mut preimage = [0u8; 64];
    preimage[0..32].copy_from_slice(initializer_hash);
    preimage[32..64].copy_from_slice(salt_nonce.as_bytes());
    keccak256(&preimage)
}

/// Standard CREATE2 derivation.
/// Preimage: 0xff (1) || factory (20) || salt (32) || init_code_hash (32) = 85 bytes.
pub fn create2_address(factory: &Address, init_code_hash: &[u8; 32], salt: &[u8; 32]) -> Address {
    let mut preimage = [0u8; 85];
    preimage[0] = 0xff;
    preimage[1..21].copy_from_slice(factory.as_bytes());
    preimage[21..53].copy_from_slice(salt);
    preimage[53..85].copy_from_slice(init_code_hash);

    let hash = keccak256(&preimage);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::from_bytes(addr)
}

/// keccak256 of the proxy deployment data: creation code followed by the
/// singleton as a constructor argument.
pub fn proxy_init_code_hash(creation_code: &[u8], singleton: &Address) -> [u8; 32] {
    let mut init_code = Vec::with_capacity(creation_code.len() + 32);
    init_code.extend_from_slice(creation_code);
    init_code.extend_from_slice(&singleton.to_word());
    keccak256(&init_code)
}

/// Address the factory will deploy the proxy at for this initializer and nonce.
pub fn predict_safe_address(
    factory: &Address,
    init_code_hash: &[u8; 32],
    initializer: &[u8],
    salt_nonce: &SaltNonce,
) -> Address {
    let salt = safe_salt(&keccak256(initializer), salt_nonce);
    create2_address(factory, init_code_hash, &salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_salt_deterministic() {
        let init = [1u8; 32];
        let nonce = SaltNonce([2u8; 32]);
        assert_eq!(safe_salt(&init, &nonce), safe_salt(&init, &nonce));
        assert_ne!(safe_salt(&init, &nonce), safe_salt(&init, &SaltNonce([3u8; 32])));
    }

    /// EIP-1014 example 1: zero deployer, zero salt, init code 0x00.
    #[test]
    fn test_create2_eip1014_vector() {
        let init_code_hash = keccak256(&[0x00]);
        let addr = create2_address(&Address::ZERO, &init_code_hash, &[0u8; 32]);
        assert_eq!(addr.to_hex(), "4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38");
    }

    /// EIP-1014 example 2: deployer 0xdeadbeef00..., zero salt, init code 0x00.
    #[test]
    fn test_create2_eip1014_deployer_vector() {
        let deployer: Address = "0xdeadbeef00000000000000000000000000000000".parse().unwrap();
        let addr = create2_address(&deployer, &keccak256(&[0x00]), &[0u8; 32]);
        assert_eq!(addr.to_hex(), "b928f69bb1d91cd65274e3c79d8986362984fda3");
    }

    #[test]
    fn test_init_code_hash_appends_padded_singleton() {
        let singleton: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
        let mut expected = vec![0x60, 0x80];
        expected.extend_from_slice(&[0u8; 31]);
        expected.push(0xaa);
        assert_eq!(proxy_init_code_hash(&[0x60, 0x80], &singleton), keccak256(&expected));
    }

    #[test]
    fn test_predict_is_deterministic() {
        let factory: Address = "0xa6B71E26C5e0845f74c812102Ca7114b6a896AB2".parse().unwrap();
        let initializer = [0x01, 0x02, 0x03];
        let a1 = predict_safe_address(&factory, &[7u8; 32], &initializer, &SaltNonce::from_u64(42));
        let a2 = predict_safe_address(&factory, &[7u8; 32], &initializer, &SaltNonce::from_u64(42));
        let a3 = predict_safe_address(&factory, &[7u8; 32], &initializer, &SaltNonce::from_u64(43));
        assert_eq!(a1, a2);
        assert_ne!(a1, a3);
    }
}
