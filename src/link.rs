//! Deep-link query parameters for a found Safe address.
//!
//! `owners`, `threshold`, `singleton`, `salt` and `address` are all a later
//! session needs to rebuild the exact initializer and re-derive the address.

use url::form_urlencoded;
use url::Url;

use crate::crypto::{Address, AddressError, NonceError, SaltNonce};
use crate::deployments::{FallbackHandler, SafeDeployments};
use crate::initializer::{InitParams, InitializerError};
use crate::matcher::Pattern;
use crate::verifier::DeploymentTarget;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("missing query parameter `{0}`")]
    Missing(&'static str),
    #[error("invalid `{field}`: {source}")]
    Address {
        field: &'static str,
        source: AddressError,
    },
    #[error("invalid `threshold`: {0}")]
    Threshold(String),
    #[error("invalid `salt`: {0}")]
    Salt(#[from] NonceError),
    #[error("invalid url: {0}")]
    Url(String),
    #[error("unknown singleton {0}")]
    UnknownSingleton(Address),
    #[error(transparent)]
    Initializer(#[from] InitializerError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentLink {
    pub owners: Vec<Address>,
    pub threshold: usize,
    pub singleton: Address,
    pub salt: SaltNonce,
    pub address: Address,
}

impl DeploymentLink {
    pub fn to_query(&self) -> String {
        let owners = self
            .owners
            .iter()
            .map(Address::to_checksum)
            .collect::<Vec<_>>()
            .join(",");
        form_urlencoded::Serializer::new(String::new())
            .append_pair("owners", &owners)
            .append_pair("threshold", &self.threshold.to_string())
            .append_pair("singleton", &self.singleton.to_checksum())
            .append_pair("salt", &self.salt.to_decimal())
            .append_pair("address", &self.address.to_checksum())
            .finish()
    }

    /// Parses a bare query string (leading `?` allowed).
    pub fn from_query(query: &str) -> Result<Self, LinkError> {
        let query = query.trim().trim_start_matches('?');

        let mut owners = None;
        let mut threshold = None;
        let mut singleton = None;
        let mut salt = None;
        let mut address = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "owners" => owners = Some(value.into_owned()),
                "threshold" => threshold = Some(value.into_owned()),
                "singleton" => singleton = Some(value.into_owned()),
                "salt" => salt = Some(value.into_owned()),
                "address" => address = Some(value.into_owned()),
                _ => {}
            }
        }

        let owners = owners
            .ok_or(LinkError::Missing("owners"))?
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_address("owners", s))
            .collect::<Result<Vec<_>, _>>()?;
        let threshold = threshold.ok_or(LinkError::Missing("threshold"))?;
        let threshold = threshold
            .trim()
            .parse()
            .map_err(|_| LinkError::Threshold(threshold.clone()))?;

        Ok(Self {
            owners,
            threshold,
            singleton: parse_address("singleton", &singleton.ok_or(LinkError::Missing("singleton"))?)?,
            salt: SaltNonce::from_decimal(&salt.ok_or(LinkError::Missing("salt"))?)?,
            address: parse_address("address", &address.ok_or(LinkError::Missing("address"))?)?,
        })
    }

    /// Parses either a full URL or a bare query string.
    pub fn parse(input: &str) -> Result<Self, LinkError> {
        if input.contains("://") {
            let url = Url::parse(input).map_err(|e| LinkError::Url(e.to_string()))?;
            Self::from_query(url.query().unwrap_or(""))
        } else {
            Self::from_query(input)
        }
    }

    /// Rebuilds the params the address was searched with: primary fallback
    /// handler, zero payment receiver.
    pub fn init_params(&self, deployments: &SafeDeployments) -> Result<InitParams, InitializerError> {
        InitParams::with_deployments(
            deployments,
            self.owners.clone(),
            self.threshold,
            self.singleton,
            FallbackHandler::Primary,
        )
    }

    /// Whether the stored params and salt re-derive the stored address
    /// through the singleton's own factory and proxy init code.
    pub fn verify(&self, deployments: &SafeDeployments) -> Result<bool, LinkError> {
        let search = deployments
            .salt_search(&self.singleton, Pattern::any())
            .ok_or(LinkError::UnknownSingleton(self.singleton))?;
        let initializer = self.init_params(deployments)?.encode();
        Ok(search.predict(&initializer, &self.salt) == self.address)
    }

    pub fn target(&self, chain_id: u64) -> DeploymentTarget {
        DeploymentTarget {
            chain_id,
            expected_address: self.address,
            owners: self.owners.clone(),
            threshold: self.threshold,
            salt: self.salt,
            singleton: Some(self.singleton),
            payment_receiver: None,
            original_tx: None,
        }
    }
}

fn parse_address(field: &'static str, s: &str) -> Result<Address, LinkError> {
    s.parse().map_err(|source| LinkError::Address { field, source })
}
