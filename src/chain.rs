//! Chain access
//!
//! [`ChainClient`] is the contract-binding capability every wrapper is built
//! on: read calls, gas estimation, gas price and transaction submission for
//! one signer. [`AlloyChain`] implements it over an alloy HTTP provider.
//!
//! ⚠️  SECURITY WARNING:
//! - Never log or expose private keys
//! - Use environment variables, not hardcoded keys

#![allow(async_fn_in_trait)]

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Bytes, Log, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::SolEvent;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{Result, SdkError};

// ============================================
// TRANSACTION TYPES
// ============================================

/// A call or transaction addressed to one contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u128>,
}

impl TxRequest {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
            value: U256::ZERO,
            gas_limit: None,
            gas_price: None,
        }
    }

    /// First four bytes of the calldata
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|s| s.try_into().ok())
    }
}

/// The parts of a mined receipt the wrappers care about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub status: bool,
    pub logs: Vec<Log>,
}

impl TxReceipt {
    /// First log in the receipt that decodes as `E`
    pub fn decode_event<E: SolEvent>(&self) -> Option<E> {
        self.logs.iter().find_map(|log| E::decode_log_data(&log.data).ok())
    }

    /// Like [`decode_event`](Self::decode_event) but an error when absent
    pub fn require_event<E: SolEvent>(&self) -> Result<E> {
        self.decode_event::<E>()
            .ok_or(SdkError::MissingEvent(E::SIGNATURE))
    }

    /// Every log that decodes as `E`
    pub fn decode_events<E: SolEvent>(&self) -> Vec<E> {
        self.logs
            .iter()
            .filter_map(|log| E::decode_log_data(&log.data).ok())
            .collect()
    }
}

// ============================================
// CHAIN CLIENT
// ============================================

/// Everything a contract wrapper needs from the node and the signer
pub trait ChainClient: Send + Sync {
    /// Account transactions are sent from (and read calls are made as)
    fn signer_address(&self) -> Address;

    async fn chain_id(&self) -> Result<u64>;

    /// `eth_call` returning raw ABI-encoded output
    async fn call(&self, tx: &TxRequest) -> Result<Bytes>;

    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64>;

    /// Node-reported gas price in wei
    async fn gas_price(&self) -> Result<u128>;

    /// Submit and wait for the receipt
    async fn send(&self, tx: TxRequest) -> Result<TxReceipt>;
}

// ============================================
// ALLOY IMPLEMENTATION
// ============================================

/// [`ChainClient`] over an alloy HTTP provider
pub struct AlloyChain {
    provider: DynProvider,
    account: Address,
}

impl AlloyChain {
    /// Connect with a local private-key signer
    pub fn connect(rpc_url: &str, signer: PrivateKeySigner) -> Result<Self> {
        let account = signer.address();
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| SdkError::invalid(format!("invalid RPC url {rpc_url}: {e}")))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        debug!("Connected to {} as {:?}", rpc_url, account);
        Ok(Self { provider, account })
    }

    /// Connect without a wallet; reads are made as `account`, sends fail
    pub fn read_only(rpc_url: &str, account: Address) -> Result<Self> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| SdkError::invalid(format!("invalid RPC url {rpc_url}: {e}")))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self { provider, account })
    }

    /// Connect using the `PRIVATE_KEY` environment variable
    pub fn from_env(rpc_url: &str, chain_id: u64) -> Result<Self> {
        let key = std::env::var("PRIVATE_KEY")
            .map_err(|_| SdkError::invalid("PRIVATE_KEY is not set"))?;
        let signer = parse_private_key(&key)?.with_chain_id(Some(chain_id));
        info!("✓ Signer loaded: {:?}", signer.address());
        Self::connect(rpc_url, signer)
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    fn request(&self, tx: &TxRequest) -> TransactionRequest {
        let mut request = TransactionRequest::default()
            .from(self.account)
            .to(tx.to)
            .input(tx.data.clone().into())
            .value(tx.value);
        request.gas = tx.gas_limit;
        request.gas_price = tx.gas_price;
        request
    }
}

impl ChainClient for AlloyChain {
    fn signer_address(&self) -> Address {
        self.account
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn call(&self, tx: &TxRequest) -> Result<Bytes> {
        Ok(self.provider.call(self.request(tx)).await?)
    }

    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64> {
        Ok(self.provider.estimate_gas(self.request(tx)).await?)
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn send(&self, tx: TxRequest) -> Result<TxReceipt> {
        let pending = self.provider.send_transaction(self.request(&tx)).await?;
        debug!("Submitted transaction {:?}", pending.tx_hash());

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| SdkError::Transaction(e.to_string()))?;

        let receipt = TxReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            status: receipt.status(),
            logs: receipt.inner.logs().iter().map(|log| log.inner.clone()).collect(),
        };

        if !receipt.status {
            return Err(SdkError::Reverted(receipt.transaction_hash));
        }
        Ok(receipt)
    }
}

/// Parse a hex private key with or without the `0x` prefix
pub fn parse_private_key(key: &str) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_str(key.trim().trim_start_matches("0x"))
        .map_err(|e| SdkError::invalid(format!("invalid private key: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::LogData;
    use alloy_sol_types::sol;

    sol! {
        event Ping(address indexed from, uint256 value);
    }

    #[test]
    fn test_parse_private_key() {
        // Anvil's first dev key (DO NOT USE IN PRODUCTION)
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let signer = parse_private_key(key).unwrap();
        assert_eq!(
            signer.address(),
            Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );
        assert!(parse_private_key("0x1234").is_err());
    }

    #[test]
    fn test_selector() {
        let tx = TxRequest::new(Address::ZERO, vec![0xde, 0xad, 0xbe, 0xef, 0x00]);
        assert_eq!(tx.selector(), Some([0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(TxRequest::new(Address::ZERO, vec![0x01]).selector(), None);
    }

    #[test]
    fn test_receipt_event_decoding() {
        let event = Ping { from: Address::with_last_byte(9), value: U256::from(5) };
        let log = Log { address: Address::with_last_byte(1), data: event.encode_log_data() };
        let noise = Log { address: Address::ZERO, data: LogData::new_unchecked(vec![], Bytes::new()) };

        let receipt = TxReceipt {
            transaction_hash: B256::ZERO,
            block_number: Some(1),
            gas_used: 21_000,
            status: true,
            logs: vec![noise, log],
        };

        let decoded = receipt.require_event::<Ping>().unwrap();
        assert_eq!(decoded.from, Address::with_last_byte(9));
        assert_eq!(decoded.value, U256::from(5));
        assert_eq!(receipt.decode_events::<Ping>().len(), 1);
    }
}
