//! Network Configuration
//!
//! Maps a chain id or network name to the endpoints and deployed-contract
//! addresses the SDK talks to. The network table is static and immutable;
//! addresses come from the bundled contract-package table, optionally
//! overridden by an `ADDRESS_FILE` and by caller-supplied addresses.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, error, warn};

use crate::error::{Result, SdkError};

// ============================================
// DEFAULT ENDPOINTS
// ============================================

const DEFAULT_METADATA_CACHE_URI: &str = "https://v4.aquarius.oceanprotocol.com";
const DEFAULT_PROVIDER_URI: &str = "https://v4.provider.oceanprotocol.com";

/// Contract-package address table shipped with the SDK
const BUNDLED_ADDRESSES: &str = include_str!("addresses.json");

// ============================================
// NETWORK CONFIG
// ============================================

/// Endpoints, deployed addresses and transaction tuning for one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    // ========== Identity ==========
    pub chain_id: u64,
    pub network: String,

    // ========== Endpoints ==========
    /// JSON-RPC node
    pub node_uri: String,

    /// Off-chain metadata cache (Aquarius)
    pub metadata_cache_uri: String,

    /// Access-control / encryption provider service
    pub provider_uri: String,

    pub subgraph_uri: String,
    pub explorer_uri: Option<String>,

    // ========== Deployed contracts ==========
    pub ocean_token_symbol: String,
    pub ocean_token_address: Option<Address>,
    pub nft_factory_address: Option<Address>,
    pub fixed_rate_exchange_address: Option<Address>,
    pub dispenser_address: Option<Address>,
    pub router_factory_address: Option<Address>,
    pub opf_community_fee_collector: Option<Address>,
    pub ve_ocean: Option<Address>,
    pub ve_allocate: Option<Address>,
    pub ve_delegation: Option<Address>,
    pub ve_fee_distributor: Option<Address>,
    pub ve_fee_estimate: Option<Address>,
    pub df_rewards: Option<Address>,
    pub df_strategy_v1: Option<Address>,
    pub access_list_factory: Option<Address>,
    pub escrow: Option<Address>,

    /// First block the protocol contracts were deployed at
    pub start_block: Option<u64>,

    // ========== Transaction tuning ==========
    /// Scalar applied to the node-reported gas price
    pub gas_fee_multiplier: Option<f64>,
    pub transaction_block_timeout: u64,
    pub transaction_confirmation_blocks: u64,
    pub transaction_polling_timeout: u64,
}

impl NetworkConfig {
    /// Load a configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save this configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Look up a required contract address, failing with its name
    pub fn require(&self, field: Option<Address>, name: &'static str) -> Result<Address> {
        field.ok_or(SdkError::MissingAddress(name))
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_uri.is_empty() {
            return Err(SdkError::invalid("nodeUri is empty"));
        }
        if let Some(m) = self.gas_fee_multiplier {
            if !(m.is_finite() && m > 0.0) {
                return Err(SdkError::invalid(format!("gasFeeMultiplier {m} must be positive")));
            }
        }
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        fn addr(a: Option<Address>) -> String {
            a.map(|a| a.to_checksum(None)).unwrap_or_else(|| "✗ Not Set".to_string())
        }

        println!("╔════════════════════════════════════════════════════════════════════╗");
        println!("║ NETWORK: {:<57} ║", format!("{} ({})", self.network, self.chain_id));
        println!("╠════════════════════════════════════════════════════════════════════╣");
        println!("║ • Node:            {:<47} ║", self.node_uri);
        println!("║ • Metadata cache:  {:<47} ║", self.metadata_cache_uri);
        println!("║ • Provider:        {:<47} ║", self.provider_uri);
        println!("║ • Subgraph:        {:<47} ║", self.subgraph_uri);
        println!("╠════════════════════════════════════════════════════════════════════╣");
        println!("║ • {:<16} {:<47} ║", self.ocean_token_symbol, addr(self.ocean_token_address));
        println!("║ • NFT factory:     {:<47} ║", addr(self.nft_factory_address));
        println!("║ • Fixed rate:      {:<47} ║", addr(self.fixed_rate_exchange_address));
        println!("║ • Dispenser:       {:<47} ║", addr(self.dispenser_address));
        println!("║ • Router:          {:<47} ║", addr(self.router_factory_address));
        println!("║ • Access lists:    {:<47} ║", addr(self.access_list_factory));
        println!("║ • Escrow:          {:<47} ║", addr(self.escrow));
        println!("║ • veOCEAN:         {:<47} ║", addr(self.ve_ocean));
        println!("╠════════════════════════════════════════════════════════════════════╣");
        println!(
            "║ • Gas multiplier:  {:<47} ║",
            self.gas_fee_multiplier.map(|m| m.to_string()).unwrap_or_else(|| "none".into())
        );
        println!(
            "║ • Confirmations:   {:<47} ║",
            format!(
                "{} blocks (timeout {} blocks)",
                self.transaction_confirmation_blocks, self.transaction_block_timeout
            )
        );
        println!("╚════════════════════════════════════════════════════════════════════╝");
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: 0,
            network: "unknown".to_string(),
            node_uri: "http://127.0.0.1:8545".to_string(),
            metadata_cache_uri: DEFAULT_METADATA_CACHE_URI.to_string(),
            provider_uri: DEFAULT_PROVIDER_URI.to_string(),
            subgraph_uri: "https://subgraph.oceanprotocol.com".to_string(),
            explorer_uri: None,
            ocean_token_symbol: "OCEAN".to_string(),
            ocean_token_address: None,
            nft_factory_address: None,
            fixed_rate_exchange_address: None,
            dispenser_address: None,
            router_factory_address: None,
            opf_community_fee_collector: None,
            ve_ocean: None,
            ve_allocate: None,
            ve_delegation: None,
            ve_fee_distributor: None,
            ve_fee_estimate: None,
            df_rewards: None,
            df_strategy_v1: None,
            access_list_factory: None,
            escrow: None,
            start_block: None,
            gas_fee_multiplier: Some(1.0),
            transaction_block_timeout: 50,
            transaction_confirmation_blocks: 1,
            transaction_polling_timeout: 750,
        }
    }
}

// ============================================
// NETWORK TABLE
// ============================================

fn public_network(chain_id: u64, network: &str, node_uri: &str, explorer_uri: &str) -> NetworkConfig {
    NetworkConfig {
        chain_id,
        network: network.to_string(),
        node_uri: node_uri.to_string(),
        subgraph_uri: format!("https://v4.subgraph.{network}.oceanprotocol.com"),
        explorer_uri: Some(explorer_uri.to_string()),
        ..NetworkConfig::default()
    }
}

fn network_table() -> Vec<NetworkConfig> {
    vec![
        NetworkConfig {
            chain_id: 8996,
            network: "development".to_string(),
            node_uri: "http://127.0.0.1:8545".to_string(),
            metadata_cache_uri: "http://127.0.0.1:5000".to_string(),
            provider_uri: "http://127.0.0.1:8030".to_string(),
            subgraph_uri: "http://127.0.0.1:9000".to_string(),
            explorer_uri: Some("https://etherscan.io/".to_string()),
            ..NetworkConfig::default()
        },
        NetworkConfig {
            start_block: Some(11105459),
            transaction_block_timeout: 150,
            transaction_confirmation_blocks: 5,
            transaction_polling_timeout: 1750,
            gas_fee_multiplier: Some(1.05),
            ..public_network(1, "mainnet", "https://mainnet.infura.io/v3", "https://etherscan.io")
        },
        NetworkConfig {
            gas_fee_multiplier: Some(1.1),
            ..public_network(11155111, "sepolia", "https://sepolia.infura.io/v3", "https://sepolia.etherscan.io")
        },
        NetworkConfig {
            ocean_token_symbol: "mOCEAN".to_string(),
            gas_fee_multiplier: Some(1.6),
            ..public_network(137, "polygon", "https://polygon-rpc.com", "https://polygonscan.com")
        },
        NetworkConfig {
            gas_fee_multiplier: Some(1.1),
            ..public_network(80001, "mumbai", "https://polygon-mumbai.infura.io/v3", "https://mumbai.polygonscan.com")
        },
        NetworkConfig {
            gas_fee_multiplier: Some(1.05),
            ..public_network(56, "bsc", "https://bsc-dataseed.binance.org", "https://bscscan.com/")
        },
        NetworkConfig {
            gas_fee_multiplier: Some(1.05),
            ..public_network(246, "energyweb", "https://rpc.energyweb.org", "https://explorer.energyweb.org")
        },
        NetworkConfig {
            gas_fee_multiplier: Some(1.05),
            ..public_network(1285, "moonriver", "https://moonriver.api.onfinality.io/public", "https://moonriver.moonscan.io/")
        },
        NetworkConfig {
            gas_fee_multiplier: Some(1.1),
            ..public_network(10, "optimism", "https://mainnet.optimism.io", "https://optimistic.etherscan.io/")
        },
        NetworkConfig {
            gas_fee_multiplier: Some(1.1),
            ..public_network(11155420, "optimism-sepolia", "https://sepolia.optimism.io", "https://sepolia-optimism.etherscan.io/")
        },
        NetworkConfig {
            subgraph_uri: "https://v4.subgraph.sapphire-mainnet.oceanprotocol.com".to_string(),
            ..public_network(23294, "oasis_saphire", "https://sapphire.oasis.io", "https://explorer.oasis.io/mainnet/sapphire/")
        },
        NetworkConfig {
            subgraph_uri: "https://v4.subgraph.sapphire-testnet.oceanprotocol.com".to_string(),
            ..public_network(23295, "oasis_saphire_testnet", "https://testnet.sapphire.oasis.dev", "https://explorer.oasis.io/testnet/sapphire/")
        },
        NetworkConfig {
            subgraph_uri: "https://subgraph.dev.pontus-x.eu".to_string(),
            gas_fee_multiplier: Some(1.05),
            ..public_network(32456, "pontusx", "https://rpc.dev.pontus-x.eu", "https://explorer.dev.pontus-x.eu/testnet/pontusx")
        },
        NetworkConfig {
            provider_uri: "https://v4.provider.gaiaxtestnet.oceanprotocol.com".to_string(),
            ..public_network(2021000, "gaiaxtestnet", "https://rpc.gaiaxtestnet.oceanprotocol.com", "https://blockscout.gaiaxtestnet.oceanprotocol.com")
        },
    ]
}

lazy_static::lazy_static! {
    static ref NETWORKS: Vec<NetworkConfig> = network_table();

    static ref BUNDLED: HashMap<String, ContractAddresses> =
        serde_json::from_str(BUNDLED_ADDRESSES).unwrap_or_else(|e| {
            error!("Bundled address table is malformed: {}", e);
            HashMap::new()
        });
}

/// All networks the SDK knows about
pub fn supported_networks() -> &'static [NetworkConfig] {
    &NETWORKS
}

// ============================================
// NETWORK IDENTIFIER
// ============================================

/// A chain id or a network name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkId {
    ChainId(u64),
    Name(String),
}

impl From<u64> for NetworkId {
    fn from(id: u64) -> Self {
        NetworkId::ChainId(id)
    }
}

impl From<&str> for NetworkId {
    fn from(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(id) => NetworkId::ChainId(id),
            Err(_) => NetworkId::Name(s.to_string()),
        }
    }
}

impl FromStr for NetworkId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(NetworkId::from(s))
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkId::ChainId(id) => write!(f, "chain id {id}"),
            NetworkId::Name(name) => write!(f, "{name}"),
        }
    }
}

// ============================================
// ADDRESS BUNDLES
// ============================================

/// One network's entry in the contract-package address file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractAddresses {
    #[serde(rename = "chainId", default)]
    pub chain_id: Option<u64>,
    #[serde(rename = "Router", default)]
    pub router: Option<Address>,
    #[serde(rename = "FixedPrice", default)]
    pub fixed_price: Option<Address>,
    #[serde(rename = "Dispenser", default)]
    pub dispenser: Option<Address>,
    #[serde(rename = "ERC721Factory", default)]
    pub erc721_factory: Option<Address>,
    #[serde(rename = "Ocean", default)]
    pub ocean: Option<Address>,
    #[serde(rename = "OPFCommunityFeeCollector", default)]
    pub opf_community_fee_collector: Option<Address>,
    #[serde(rename = "veOCEAN", default)]
    pub ve_ocean: Option<Address>,
    #[serde(rename = "veAllocate", default)]
    pub ve_allocate: Option<Address>,
    #[serde(rename = "veDelegation", default)]
    pub ve_delegation: Option<Address>,
    #[serde(rename = "veFeeDistributor", default)]
    pub ve_fee_distributor: Option<Address>,
    #[serde(rename = "veFeeEstimate", default)]
    pub ve_fee_estimate: Option<Address>,
    #[serde(rename = "DFRewards", default)]
    pub df_rewards: Option<Address>,
    #[serde(rename = "DFStrategyV1", default)]
    pub df_strategy_v1: Option<Address>,
    #[serde(rename = "AccessListFactory", default)]
    pub access_list_factory: Option<Address>,
    #[serde(rename = "Escrow", default)]
    pub escrow: Option<Address>,
    #[serde(rename = "startBlock", default)]
    pub start_block: Option<u64>,
}

impl ContractAddresses {
    /// Copy every address present in this bundle onto `config`
    pub fn apply_to(&self, config: &mut NetworkConfig) {
        fn set<T: Copy>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut config.router_factory_address, self.router);
        set(&mut config.fixed_rate_exchange_address, self.fixed_price);
        set(&mut config.dispenser_address, self.dispenser);
        set(&mut config.nft_factory_address, self.erc721_factory);
        set(&mut config.ocean_token_address, self.ocean);
        set(&mut config.opf_community_fee_collector, self.opf_community_fee_collector);
        set(&mut config.ve_ocean, self.ve_ocean);
        set(&mut config.ve_allocate, self.ve_allocate);
        set(&mut config.ve_delegation, self.ve_delegation);
        set(&mut config.ve_fee_distributor, self.ve_fee_distributor);
        set(&mut config.ve_fee_estimate, self.ve_fee_estimate);
        set(&mut config.df_rewards, self.df_rewards);
        set(&mut config.df_strategy_v1, self.df_strategy_v1);
        set(&mut config.access_list_factory, self.access_list_factory);
        set(&mut config.escrow, self.escrow);
        set(&mut config.start_block, self.start_block);
    }
}

/// Parse an address file given either as a path or as inline JSON
pub fn load_address_file(source: &str) -> Result<HashMap<String, ContractAddresses>> {
    let trimmed = source.trim();
    let content = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        let expanded = match (trimmed.strip_prefix("~/"), env::var("HOME")) {
            (Some(rest), Ok(home)) => format!("{home}/{rest}"),
            _ => trimmed.to_string(),
        };
        fs::read_to_string(&expanded)?
    };
    Ok(serde_json::from_str(&content)?)
}

// ============================================
// CONFIG HELPER
// ============================================

/// Resolves [`NetworkConfig`]s, applying address and endpoint overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigHelper {
    address_overrides: HashMap<String, ContractAddresses>,
    metadata_cache_uri: Option<String>,
    provider_uri: Option<String>,
}

impl ConfigHelper {
    /// Capture `ADDRESS_FILE`, `AQUARIUS_URL` and `PROVIDER_URL` from the environment
    pub fn from_env() -> Result<Self> {
        let mut helper = Self::default();

        if let Ok(source) = env::var("ADDRESS_FILE") {
            helper = helper.with_address_file(&source)?;
        }
        helper.metadata_cache_uri = env::var("AQUARIUS_URL").ok().filter(|s| !s.is_empty());
        helper.provider_uri = env::var("PROVIDER_URL").ok().filter(|s| !s.is_empty());

        Ok(helper)
    }

    pub fn with_address_file(mut self, source: &str) -> Result<Self> {
        self.address_overrides = load_address_file(source)?;
        debug!("Loaded address overrides for {} networks", self.address_overrides.len());
        Ok(self)
    }

    pub fn with_metadata_cache_uri(mut self, uri: impl Into<String>) -> Self {
        self.metadata_cache_uri = Some(uri.into());
        self
    }

    pub fn with_provider_uri(mut self, uri: impl Into<String>) -> Self {
        self.provider_uri = Some(uri.into());
        self
    }

    /// Resolve the config for a chain id or network name
    pub fn get_config(
        &self,
        network: impl Into<NetworkId>,
        infura_project_id: Option<&str>,
    ) -> Result<NetworkConfig> {
        self.resolve(network.into(), infura_project_id, None)
    }

    /// Like [`get_config`](Self::get_config), with caller-supplied addresses taking priority
    pub fn get_config_with_addresses(
        &self,
        network: impl Into<NetworkId>,
        infura_project_id: Option<&str>,
        custom: &ContractAddresses,
    ) -> Result<NetworkConfig> {
        self.resolve(network.into(), infura_project_id, Some(custom))
    }

    fn resolve(
        &self,
        network: NetworkId,
        infura_project_id: Option<&str>,
        custom: Option<&ContractAddresses>,
    ) -> Result<NetworkConfig> {
        let base = NETWORKS.iter().find(|n| match &network {
            NetworkId::ChainId(id) => n.chain_id == *id,
            NetworkId::Name(name) => n.network == *name,
        });

        let mut config = match base {
            Some(c) => c.clone(),
            None => {
                error!("No config found for given network '{}'", network);
                return Err(SdkError::UnknownNetwork(network.to_string()));
            }
        };

        if let Some(bundled) = BUNDLED.get(&config.network) {
            bundled.apply_to(&mut config);
        }
        if let Some(overrides) = self.address_overrides.get(&config.network) {
            if overrides.chain_id.is_some_and(|id| id != config.chain_id) {
                warn!(
                    "Address file entry for {} declares chain id {:?}, expected {}",
                    config.network, overrides.chain_id, config.chain_id
                );
            }
            overrides.apply_to(&mut config);
        }
        if let Some(custom) = custom {
            custom.apply_to(&mut config);
        }

        if let Some(uri) = &self.metadata_cache_uri {
            config.metadata_cache_uri = uri.clone();
        }
        if let Some(uri) = &self.provider_uri {
            config.provider_uri = uri.clone();
        }

        if let Some(project_id) = infura_project_id {
            if config.node_uri.contains("infura") {
                config.node_uri = format!("{}/{}", config.node_uri, project_id);
            }
        }

        debug!("Resolved config for {} ({})", config.network, config.chain_id);
        Ok(config)
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_mainnet_by_chain_id() {
        let config = ConfigHelper::default().get_config(1u64, None).unwrap();
        assert_eq!(config.network, "mainnet");
        assert_eq!(config.gas_fee_multiplier, Some(1.05));
        assert!(config.ocean_token_address.is_some_and(|a| a != Address::ZERO));
        assert_eq!(config.start_block, Some(11105459));
    }

    #[test]
    fn test_chain_id_and_name_agree() {
        let helper = ConfigHelper::default();
        for network in supported_networks() {
            let by_id = helper.get_config(network.chain_id, None).unwrap();
            let by_name = helper.get_config(network.network.as_str(), None).unwrap();
            assert_eq!(by_id, by_name, "{}", network.network);
        }
    }

    #[test]
    fn test_unknown_network_is_error() {
        let helper = ConfigHelper::default();
        assert!(matches!(helper.get_config(424242u64, None), Err(SdkError::UnknownNetwork(_))));
        assert!(matches!(helper.get_config("atlantis", None), Err(SdkError::UnknownNetwork(_))));
    }

    #[test]
    fn test_infura_project_id_appended() {
        let helper = ConfigHelper::default();
        let config = helper.get_config("sepolia", Some("abc123")).unwrap();
        assert_eq!(config.node_uri, "https://sepolia.infura.io/v3/abc123");

        let polygon = helper.get_config("polygon", Some("abc123")).unwrap();
        assert_eq!(polygon.node_uri, "https://polygon-rpc.com");
    }

    #[test]
    fn test_inline_address_file_overrides() {
        let helper = ConfigHelper::default()
            .with_address_file(
                r#"{"development": {"chainId": 8996,
                    "ERC721Factory": "0x0000000000000000000000000000000000000aaa",
                    "FixedPrice": "0x0000000000000000000000000000000000000bbb",
                    "Ocean": "0x0000000000000000000000000000000000000ccc"}}"#,
            )
            .unwrap()
            .with_metadata_cache_uri("http://aqua:5000");

        let config = helper.get_config(8996u64, None).unwrap();
        assert_eq!(config.nft_factory_address, Some(address!("0000000000000000000000000000000000000aaa")));
        assert_eq!(config.fixed_rate_exchange_address, Some(address!("0000000000000000000000000000000000000bbb")));
        assert_eq!(config.dispenser_address, None);
        assert_eq!(config.metadata_cache_uri, "http://aqua:5000");
    }

    #[test]
    fn test_custom_addresses_win() {
        let custom = ContractAddresses {
            ocean: Some(Address::with_last_byte(7)),
            ..Default::default()
        };
        let config = ConfigHelper::default()
            .get_config_with_addresses("mainnet", None, &custom)
            .unwrap();
        assert_eq!(config.ocean_token_address, Some(Address::with_last_byte(7)));
    }

    #[test]
    fn test_bundled_table_parses() {
        let parsed: HashMap<String, ContractAddresses> =
            serde_json::from_str(BUNDLED_ADDRESSES).unwrap();
        assert!(parsed.contains_key("mainnet"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ConfigHelper::default().get_config("polygon", None).unwrap();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: NetworkConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
        assert!(back.validate().is_ok());
    }
}
