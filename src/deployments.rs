//! Safe contract addresses the encoder, search and verifier are configured with.

use alloy_primitives::hex;

use crate::crypto::{proxy_init_code_hash, Address};
use crate::matcher::Pattern;
use crate::search::SaltSearch;

/// Which fallback handler deployment the initializer points at.
///
/// Safes created through different frontends historically used one of two
/// CompatibilityFallbackHandler deployments, so both have to be tried when
/// re-deriving an existing Safe on another chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackHandler {
    #[default]
    Primary,
    Alternate,
}

/// A Safe implementation and the factory that deploys proxies for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Singleton {
    pub name: &'static str,
    pub address: Address,
    pub factory: Address,
    /// `proxyCreationCode()` of the factory; the init code hash is derived from it.
    pub proxy_creation_code: &'static [u8],
    /// Non-L2 singleton; proxies for it are not replicated cross-chain.
    pub l1_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeDeployments {
    pub singletons: Vec<Singleton>,
    pub default_singleton: Address,
    pub fallback_primary: Address,
    pub fallback_alternate: Address,
    pub multicall: Address,
    pub disperse: Address,
}

/// Parses a hard-coded address literal.
const fn addr(hex: &str) -> Address {
    let bytes = hex.as_bytes();
    let mut out = [0u8; 20];
    let mut i = 0;
    while i < 20 {
        out[i] = (nibble(bytes[2 + 2 * i]) << 4) | nibble(bytes[3 + 2 * i]);
        i += 1;
    }
    Address::from_bytes(out)
}

const fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex literal"),
    }
}

pub const SAFE_V130_L1: Address = addr("0xd9Db270c1B5E3Bd161E8c8503c55cEABeE709552");
pub const SAFE_V130_L2: Address = addr("0x3E5c63644E683549055b9Be8653de26E0B4CD36E");
pub const SAFE_V130_L2_EIP155: Address = addr("0xfb1bffC9d739B8D520DaF37dF666da4C687191EA");
pub const SAFE_V141_L2: Address = addr("0x29fcB43b46531BcA003ddC8FCB67FFE91900C762");
pub const FACTORY_V130: Address = addr("0xa6B71E26C5e0845f74c812102Ca7114b6a896AB2");
pub const FACTORY_V130_EIP155: Address = addr("0xC22834581EbC8527d974F8a1c97E1bEA4EF910BC");
pub const FACTORY_V141: Address = addr("0x4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67");
pub const FALLBACK_HANDLER_V130: Address = addr("0xf48f2B2d2a534e402487b3ee7C18c33Aec0Fe5e4");
pub const FALLBACK_HANDLER_V130_EIP155: Address = addr("0x017062a1dE2FE6b99BE3d9d37841FeD19F573804");
pub const MULTICALL3: Address = addr("0xcA11bde05977b3631167028862bE2a173976CA11");
pub const DISPERSE: Address = addr("0xD152f549545093347A162Dce210e7293f1452150");

/// `SafeProxyFactory.proxyCreationCode()` for v1.3.0 (both deployments).
pub const PROXY_CREATION_CODE_V130: &[u8] = &hex!(
    "608060405234801561001057600080fd5b506040516101e63803806101e6833981810160405260208110156100335760"
    "0080fd5b8101908080519060200190929190505050600073ffffffffffffffffffffffffffffffffffffffff168173ff"
    "ffffffffffffffffffffffffffffffffffffff1614156100ca576040517f08c379a00000000000000000000000000000"
    "000000000000000000000000000081526004018080602001828103825260228152602001806101c46022913960400191"
    "505060405180910390fd5b806000806101000a81548173ffffffffffffffffffffffffffffffffffffffff0219169083"
    "73ffffffffffffffffffffffffffffffffffffffff1602179055505060ab806101196000396000f3fe608060405273ff"
    "ffffffffffffffffffffffffffffffffffffff600054167fa619486e0000000000000000000000000000000000000000"
    "000000000000000060003514156050578060005260206000f35b3660008037600080366000845af43d6000803e600081"
    "14156070573d6000fd5b3d6000f3fea2646970667358221220d1429297349653a4918076d650332de1a1068c5f3e07c5"
    "c82360c277770b955264736f6c63430007060033496e76616c69642073696e676c65746f6e2061646472657373207072"
    "6f7669646564"
);

/// `SafeProxyFactory.proxyCreationCode()` for v1.4.1.
pub const PROXY_CREATION_CODE_V141: &[u8] = &hex!(
    "608060405234801561001057600080fd5b506040516101e63803806101e6833981810160405260208110156100335760"
    "0080fd5b8101908080519060200190929190505050600073ffffffffffffffffffffffffffffffffffffffff168173ff"
    "ffffffffffffffffffffffffffffffffffffff1614156100ca576040517f08c379a00000000000000000000000000000"
    "000000000000000000000000000081526004018080602001828103825260228152602001806101c46022913960400191"
    "505060405180910390fd5b806000806101000a81548173ffffffffffffffffffffffffffffffffffffffff0219169083"
    "73ffffffffffffffffffffffffffffffffffffffff1602179055505060ab806101196000396000f3fe608060405273ff"
    "ffffffffffffffffffffffffffffffffffffff600054167fa619486e0000000000000000000000000000000000000000"
    "000000000000000060003514156050578060005260206000f35b3660008037600080366000845af43d6000803e600081"
    "14156070573d6000fd5b3d6000f3fea264697066735822122003d1488ee65e08fa41e58e888a9865554c535f2c77126a"
    "82cb4c0f917f31441364736f6c63430007060033496e76616c69642073696e676c65746f6e2061646472657373207072"
    "6f7669646564"
);

/// keccak256(proxyCreationCode || uint256(SAFE_V130_L1)) for the v1.3.0 factory.
pub const INIT_CODE_HASH_V130_L1: [u8; 32] =
    hex!("56e3081a3d1bb38ed4eed1a39f7729c3cc77c7825794c15bbf326f3047fd779c");

/// keccak256(proxyCreationCode || uint256(SAFE_V141_L2)) for the v1.4.1 factory.
pub const INIT_CODE_HASH_V141_L2: [u8; 32] =
    hex!("e298282cefe913ab5d282047161268a8222e4bd4ed106300c547894bbefd31ee");

impl Singleton {
    /// Returns the CREATE2 init code hash of proxies for this singleton.
    pub fn init_code_hash(&self) -> [u8; 32] {
        proxy_init_code_hash(self.proxy_creation_code, &self.address)
    }
}

impl Default for SafeDeployments {
    fn default() -> Self {
        Self::canonical()
    }
}

impl SafeDeployments {
    /// Canonical v1.3.0 (plus its eip155 redeployment) and v1.4.1 addresses.
    pub fn canonical() -> Self {
        Self {
            singletons: vec![
                Singleton {
                    name: "v1.3.0 L2",
                    address: SAFE_V130_L2,
                    factory: FACTORY_V130,
                    proxy_creation_code: PROXY_CREATION_CODE_V130,
                    l1_only: false,
                },
                Singleton {
                    name: "v1.3.0 L2 (eip155)",
                    address: SAFE_V130_L2_EIP155,
                    factory: FACTORY_V130_EIP155,
                    proxy_creation_code: PROXY_CREATION_CODE_V130,
                    l1_only: false,
                },
                Singleton {
                    name: "v1.4.1 L2",
                    address: SAFE_V141_L2,
                    factory: FACTORY_V141,
                    proxy_creation_code: PROXY_CREATION_CODE_V141,
                    l1_only: false,
                },
                Singleton {
                    name: "v1.3.0 L1",
                    address: SAFE_V130_L1,
                    factory: FACTORY_V130,
                    proxy_creation_code: PROXY_CREATION_CODE_V130,
                    l1_only: true,
                },
            ],
            default_singleton: SAFE_V130_L2,
            fallback_primary: FALLBACK_HANDLER_V130,
            fallback_alternate: FALLBACK_HANDLER_V130_EIP155,
            multicall: MULTICALL3,
            disperse: DISPERSE,
        }
    }

    /// Looks up a known singleton by address.
    pub fn singleton(&self, address: &Address) -> Option<&Singleton> {
        self.singletons.iter().find(|s| s.address == *address)
    }

    /// Returns the factory that deploys proxies for `singleton`.
    pub fn factory_for(&self, singleton: &Address) -> Option<Address> {
        self.singleton(singleton).map(|s| s.factory)
    }

    /// Returns the proxy init code hash for `singleton`.
    pub fn init_code_hash(&self, singleton: &Address) -> Option<[u8; 32]> {
        self.singleton(singleton).map(Singleton::init_code_hash)
    }

    /// A search over proxies of `singleton`, with its factory and init code.
    pub fn salt_search(&self, singleton: &Address, pattern: Pattern) -> Option<SaltSearch> {
        let s = self.singleton(singleton)?;
        Some(SaltSearch::from_creation_code(
            s.factory,
            s.proxy_creation_code,
            &s.address,
            pattern,
        ))
    }

    /// Whether `singleton` is a known non-L2 deployment.
    pub fn is_l1_only(&self, singleton: &Address) -> bool {
        self.singleton(singleton).is_some_and(|s| s.l1_only)
    }

    /// Returns the fallback handler address for `variant`.
    pub fn fallback_handler(&self, variant: FallbackHandler) -> Address {
        match variant {
            FallbackHandler::Primary => self.fallback_primary,
            FallbackHandler::Alternate => self.fallback_alternate,
        }
    }

    /// Returns `singleton`, or the default singleton when none is given.
    pub fn resolve_singleton(&self, singleton: Option<Address>) -> Address {
        singleton.unwrap_or(self.default_singleton)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_literals_match_parser() {
        assert_eq!(
            SAFE_V130_L1,
            "0xd9Db270c1B5E3Bd161E8c8503c55cEABeE709552".parse().unwrap()
        );
        assert_eq!(MULTICALL3.to_checksum(), "0xcA11bde05977b3631167028862bE2a173976CA11");
    }

    #[test]
    fn test_lookups() {
        let d = SafeDeployments::canonical();
        assert!(d.is_l1_only(&SAFE_V130_L1));
        assert!(!d.is_l1_only(&SAFE_V130_L2));
        assert!(!d.is_l1_only(&Address::ZERO));
        assert_eq!(d.factory_for(&SAFE_V141_L2), Some(FACTORY_V141));
        assert_eq!(d.factory_for(&Address::ZERO), None);
        assert_eq!(d.resolve_singleton(None), SAFE_V130_L2);
        assert_eq!(d.resolve_singleton(Some(SAFE_V141_L2)), SAFE_V141_L2);
        assert_eq!(d.fallback_handler(FallbackHandler::Alternate), FALLBACK_HANDLER_V130_EIP155);
    }

    #[test]
    fn test_init_code_hashes_follow_singleton() {
        let d = SafeDeployments::canonical();
        assert_eq!(d.init_code_hash(&SAFE_V130_L1), Some(INIT_CODE_HASH_V130_L1));
        assert_eq!(d.init_code_hash(&SAFE_V141_L2), Some(INIT_CODE_HASH_V141_L2));
        assert_eq!(
            d.init_code_hash(&SAFE_V130_L2).map(hex::encode).as_deref(),
            Some("caf2dc2f91b804b2fcf1ed3a965a1ff4404b840b80c124277b00a43b4634b2ce")
        );
        assert_eq!(d.init_code_hash(&Address::ZERO), None);
    }

    #[test]
    fn test_salt_search_uses_singleton_factory() {
        let d = SafeDeployments::canonical();
        let search = d.salt_search(&SAFE_V141_L2, Pattern::any()).unwrap();
        assert_eq!(search.factory(), FACTORY_V141);
        assert_eq!(search.init_code_hash(), &INIT_CODE_HASH_V141_L2);
        assert!(d.salt_search(&Address::ZERO, Pattern::any()).is_none());
    }
}
