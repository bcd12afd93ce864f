//! Command-line configuration.

use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::crypto::{proxy_init_code_hash, Address, SaltNonce};
use crate::deployments::SafeDeployments;
use crate::link::DeploymentLink;
use crate::matcher::Pattern;
use crate::rpc::TxHash;
use crate::search::SaltSearch;
use crate::verifier::DeployFee;

/// Multi-chain Safe address tool
///
/// Searches salt nonces for vanity Safe proxy addresses and checks whether a
/// Safe can be reproduced at the same address on other chains.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Find a salt nonce whose Safe address matches a prefix/suffix
    Search(SearchArgs),
    /// Show per-chain deployment status for a deep link
    Status(ChainArgs),
    /// Deploy a Safe from a deep link on one chain
    Deploy(DeployArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Owner addresses, comma separated (order matters)
    #[arg(long, value_delimiter = ',', required = true)]
    pub owners: Vec<String>,

    /// Required confirmations
    #[arg(short = 't', long, default_value = "1")]
    pub threshold: usize,

    /// Safe singleton (defaults to v1.3.0 L2)
    #[arg(long)]
    pub singleton: Option<String>,

    /// SafeProxyFactory address; required for an unknown singleton
    #[arg(long)]
    pub factory: Option<String>,

    /// keccak256(proxyCreationCode || singleton), 32 bytes hex; checked
    /// against a known singleton, required for an unknown one
    #[arg(long, conflicts_with = "creation_code")]
    pub init_code_hash: Option<String>,

    /// Factory proxyCreationCode hex; the init code hash is derived from it
    #[arg(long)]
    pub creation_code: Option<String>,

    /// Address prefix (hex, 0x optional)
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Address suffix (hex)
    #[arg(short, long)]
    pub suffix: Option<String>,

    /// Ignore prefix/suffix and accept the first salt
    #[arg(long)]
    pub expert: bool,

    /// Use exactly this salt nonce (decimal or 0x hex), no search
    #[arg(long)]
    pub salt: Option<String>,

    /// Worker threads; 1 runs the cooperative single-task search
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,
}

#[derive(Args, Debug, Clone)]
pub struct ChainArgs {
    /// Deep link (URL or query string) produced by `search`
    #[arg(long)]
    pub link: String,

    /// RPC endpoint per chain as `<chain_id>=<url>`; repeatable
    #[arg(long = "rpc", required = true)]
    pub rpcs: Vec<String>,

    /// Hash of the transaction that created the Safe on its source chain
    #[arg(long, requires = "source_rpc")]
    pub original_tx: Option<String>,

    /// RPC endpoint of the source chain, used to fetch `--original-tx`
    #[arg(long)]
    pub source_rpc: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    #[command(flatten)]
    pub chains: ChainArgs,

    /// Chain to deploy on (must have an `--rpc` entry)
    #[arg(long)]
    pub chain: u64,

    /// Sender account, signed by the node/wallet behind the RPC
    #[arg(long)]
    pub from: Option<String>,

    /// Service fee recipient
    #[arg(long, requires = "fee_wei")]
    pub fee_recipient: Option<String>,

    /// Service fee in wei
    #[arg(long, default_value = "0")]
    pub fee_wei: u128,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

fn address(field: &str, s: &str) -> Result<Address, ConfigError> {
    s.parse()
        .map_err(|e| ConfigError::InvalidConfig(format!("{field}: {e}")))
}

fn hex_bytes(field: &str, s: &str) -> Result<Vec<u8>, ConfigError> {
    hex::decode(s.trim().strip_prefix("0x").unwrap_or(s.trim()))
        .map_err(|e| ConfigError::InvalidConfig(format!("{field}: {e}")))
}

impl SearchArgs {
    /// Returns the number of workers, defaulting to CPU count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    pub fn owner_addresses(&self) -> Result<Vec<Address>, ConfigError> {
        self.owners.iter().map(|o| address("owners", o)).collect()
    }

    pub fn singleton_address(&self) -> Result<Option<Address>, ConfigError> {
        self.singleton.as_deref().map(|s| address("singleton", s)).transpose()
    }

    pub fn factory_address(&self) -> Result<Option<Address>, ConfigError> {
        self.factory.as_deref().map(|s| address("factory", s)).transpose()
    }

    pub fn pinned_salt(&self) -> Result<Option<SaltNonce>, ConfigError> {
        self.salt
            .as_deref()
            .map(|s| {
                s.parse()
                    .map_err(|e| ConfigError::InvalidConfig(format!("salt: {e}")))
            })
            .transpose()
    }

    pub fn pattern(&self) -> Result<Pattern, ConfigError> {
        if self.expert {
            return Ok(Pattern::any());
        }
        Pattern::new(self.prefix.as_deref(), self.suffix.as_deref())
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))
    }

    /// Init code hash, given directly or derived by the caller from creation code.
    pub fn init_code_hash_bytes(&self) -> Result<Option<[u8; 32]>, ConfigError> {
        let Some(h) = self.init_code_hash.as_deref() else {
            return Ok(None);
        };
        hex_bytes("init_code_hash", h)?.try_into().map(Some).map_err(|_| {
            ConfigError::InvalidConfig("init_code_hash must be 32 bytes (64 hex chars)".into())
        })
    }

    pub fn creation_code_bytes(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        self.creation_code
            .as_deref()
            .map(|c| hex_bytes("creation_code", c))
            .transpose()
    }

    /// The search for the selected singleton.
    ///
    /// A known singleton fixes the factory and init code hash; an explicit
    /// `--factory`, `--init-code-hash` or `--creation-code` must agree with
    /// them. An unknown singleton needs a factory and a hash or creation code.
    pub fn salt_search(&self, deployments: &SafeDeployments) -> Result<SaltSearch, ConfigError> {
        let singleton = deployments.resolve_singleton(self.singleton_address()?);
        let pattern = self.pattern()?;
        let factory = self.factory_address()?;
        let hash = match (self.init_code_hash_bytes()?, self.creation_code_bytes()?) {
            (Some(hash), _) => Some(hash),
            (None, Some(code)) => Some(proxy_init_code_hash(&code, &singleton)),
            (None, None) => None,
        };

        let Some(known) = deployments.salt_search(&singleton, pattern.clone()) else {
            return match (factory, hash) {
                (Some(factory), Some(hash)) => Ok(SaltSearch::new(factory, hash, pattern)),
                _ => Err(ConfigError::InvalidConfig(format!(
                    "singleton {singleton} is unknown; pass --factory and \
                     --init-code-hash or --creation-code"
                ))),
            };
        };
        if let Some(factory) = factory.filter(|f| *f != known.factory()) {
            return Err(ConfigError::InvalidConfig(format!(
                "factory {factory} does not deploy singleton {singleton} (expected {})",
                known.factory()
            )));
        }
        if let Some(hash) = hash.filter(|h| h != known.init_code_hash()) {
            return Err(ConfigError::InvalidConfig(format!(
                "init code hash 0x{} does not match singleton {singleton} (expected 0x{})",
                hex::encode(hash),
                hex::encode(known.init_code_hash())
            )));
        }
        Ok(known)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.owner_addresses()?;
        self.pinned_salt()?;
        self.pattern()?;
        self.salt_search(&SafeDeployments::canonical())?;
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidConfig("workers must be at least 1".into()));
        }
        Ok(())
    }
}

impl ChainArgs {
    pub fn deployment_link(&self) -> Result<DeploymentLink, ConfigError> {
        DeploymentLink::parse(&self.link).map_err(|e| ConfigError::InvalidConfig(format!("link: {e}")))
    }

    /// `(chain_id, url)` pairs from `--rpc`.
    pub fn endpoints(&self) -> Result<Vec<(u64, Url)>, ConfigError> {
        self.rpcs
            .iter()
            .map(|entry| {
                let (chain, url) = entry.split_once('=').ok_or_else(|| {
                    ConfigError::InvalidConfig(format!("rpc `{entry}` must be <chain_id>=<url>"))
                })?;
                let chain_id = chain.trim().parse().map_err(|_| {
                    ConfigError::InvalidConfig(format!("rpc `{entry}`: bad chain id"))
                })?;
                let url = Url::parse(url.trim())
                    .map_err(|e| ConfigError::InvalidConfig(format!("rpc `{entry}`: {e}")))?;
                Ok((chain_id, url))
            })
            .collect()
    }

    pub fn original_tx_hash(&self) -> Result<Option<TxHash>, ConfigError> {
        self.original_tx
            .as_deref()
            .map(|h| {
                h.parse()
                    .map_err(|e| ConfigError::InvalidConfig(format!("original_tx: {e}")))
            })
            .transpose()
    }

    pub fn source_endpoint(&self) -> Result<Option<Url>, ConfigError> {
        self.source_rpc
            .as_deref()
            .map(|u| {
                Url::parse(u).map_err(|e| ConfigError::InvalidConfig(format!("source_rpc: {e}")))
            })
            .transpose()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.deployment_link()?;
        self.endpoints()?;
        self.original_tx_hash()?;
        self.source_endpoint()?;
        Ok(())
    }
}

impl DeployArgs {
    pub fn sender(&self) -> Result<Option<Address>, ConfigError> {
        self.from.as_deref().map(|s| address("from", s)).transpose()
    }

    pub fn fee(&self) -> Result<Option<DeployFee>, ConfigError> {
        self.fee_recipient
            .as_deref()
            .map(|r| {
                Ok(DeployFee {
                    recipient: address("fee_recipient", r)?,
                    amount: self.fee_wei,
                })
            })
            .transpose()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chains.validate()?;
        self.sender()?;
        self.fee()?;
        if !self.chains.endpoints()?.iter().any(|(id, _)| *id == self.chain) {
            return Err(ConfigError::InvalidConfig(format!(
                "no --rpc entry for chain {}",
                self.chain
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.command {
            Command::Search(args) => args.validate(),
            Command::Status(args) => args.validate(),
            Command::Deploy(args) => args.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployments::{
        FACTORY_V130, FACTORY_V141, INIT_CODE_HASH_V130_L1, PROXY_CREATION_CODE_V130, SAFE_V130_L2,
    };

    const OWNER: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1";
    const SINGLETON_L1: &str = "0xd9Db270c1B5E3Bd161E8c8503c55cEABeE709552";
    const HASH_L1: &str = "0x56e3081a3d1bb38ed4eed1a39f7729c3cc77c7825794c15bbf326f3047fd779c";

    fn search_args(extra: &[&str]) -> SearchArgs {
        let mut args = vec!["search", "--owners", OWNER];
        args.extend_from_slice(extra);
        let Command::Search(args) = parse(&args).command else {
            panic!("expected search");
        };
        args
    }

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("multisafe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_search_args() {
        let config = parse(&[
            "search",
            "--owners",
            &format!("{OWNER},0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb2"),
            "-t",
            "2",
            "--prefix",
            "0x1234",
            "--singleton",
            SINGLETON_L1,
            "--init-code-hash",
            HASH_L1,
        ]);
        config.validate().unwrap();
        let Command::Search(args) = config.command else {
            panic!("expected search");
        };
        assert_eq!(args.owner_addresses().unwrap().len(), 2);
        assert_eq!(args.pattern().unwrap().prefix(), "1234");
        assert!(args.init_code_hash_bytes().unwrap().is_some());
    }

    #[test]
    fn test_known_singleton_derives_factory_and_hash() {
        let deployments = SafeDeployments::canonical();
        let search = search_args(&[]).salt_search(&deployments).unwrap();
        assert_eq!(search.factory(), FACTORY_V130);
        assert_eq!(Some(*search.init_code_hash()), deployments.init_code_hash(&SAFE_V130_L2));

        let search = search_args(&["--singleton", SINGLETON_L1])
            .salt_search(&deployments)
            .unwrap();
        assert_eq!(search.init_code_hash(), &INIT_CODE_HASH_V130_L1);

        let code = hex::encode(PROXY_CREATION_CODE_V130);
        let search = search_args(&["--singleton", SINGLETON_L1, "--creation-code", &code])
            .salt_search(&deployments)
            .unwrap();
        assert_eq!(search.init_code_hash(), &INIT_CODE_HASH_V130_L1);
    }

    #[test]
    fn test_hash_of_another_singleton_rejected() {
        let deployments = SafeDeployments::canonical();
        // the L1 hash with the default L2 singleton
        let err = search_args(&["--init-code-hash", HASH_L1])
            .salt_search(&deployments)
            .unwrap_err();
        assert!(err.to_string().contains("does not match singleton"));

        let factory = FACTORY_V141.to_checksum();
        assert!(matches!(
            search_args(&["--factory", &factory]).salt_search(&deployments),
            Err(ConfigError::InvalidConfig(_))
        ));
        assert!(parse(&["search", "--owners", OWNER, "--init-code-hash", HASH_L1])
            .validate()
            .is_err());
    }

    #[test]
    fn test_unknown_singleton_needs_factory_and_hash() {
        let deployments = SafeDeployments::canonical();
        let custom = "0x9999999999999999999999999999999999999999";
        assert!(search_args(&["--singleton", custom])
            .salt_search(&deployments)
            .is_err());

        let factory = FACTORY_V130.to_checksum();
        let search = search_args(&[
            "--singleton",
            custom,
            "--factory",
            &factory,
            "--init-code-hash",
            HASH_L1,
        ])
        .salt_search(&deployments)
        .unwrap();
        assert_eq!(search.factory(), FACTORY_V130);
        assert_eq!(search.init_code_hash(), &INIT_CODE_HASH_V130_L1);
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let config = parse(&["search", "--owners", OWNER, "--prefix", "xyz"]);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPattern(_))));
    }

    #[test]
    fn test_expert_ignores_pattern() {
        let config = parse(&["search", "--owners", OWNER, "--prefix", "ffff", "--expert"]);
        let Command::Search(args) = config.command else {
            panic!("expected search");
        };
        assert!(args.pattern().unwrap().is_unconstrained());
    }

    #[test]
    fn test_rpc_endpoints() {
        let link = format!(
            "owners={OWNER}&threshold=1&singleton={OWNER}&salt=1&address={OWNER}"
        );
        let config = parse(&[
            "deploy",
            "--link",
            &link,
            "--rpc",
            "10=https://mainnet.optimism.io",
            "--rpc",
            "8453=https://mainnet.base.org",
            "--chain",
            "8453",
        ]);
        config.validate().unwrap();
        let Command::Deploy(args) = config.command else {
            panic!("expected deploy");
        };
        let endpoints = args.chains.endpoints().unwrap();
        assert_eq!(endpoints[0].0, 10);
        assert_eq!(endpoints[1].1.as_str(), "https://mainnet.base.org/");
        assert!(args.fee().unwrap().is_none());
    }

    #[test]
    fn test_deploy_chain_must_have_rpc() {
        let link = format!(
            "owners={OWNER}&threshold=1&singleton={OWNER}&salt=1&address={OWNER}"
        );
        let config = parse(&["deploy", "--link", &link, "--rpc", "10=http://localhost:8545", "--chain", "1"]);
        assert!(config.validate().is_err());
    }
}
