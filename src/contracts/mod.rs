//! Contract wrappers
//!
//! Every wrapper composes a [`ContractHandle`]: the chain capability, the
//! contract address and the network's gas policy. Mutating operations run
//! their read-only pre-checks and hand back a [`PreparedTx`]; the caller
//! decides whether to only estimate gas or to submit.

pub mod abi;
pub mod access_list;
pub mod datatoken;
pub mod df;
pub mod dispenser;
pub mod escrow;
pub mod fixed_rate;
pub mod nft;
pub mod nft_factory;
pub mod params;
pub mod router;
pub mod token;
pub mod ve;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chain::{ChainClient, TxReceipt, TxRequest};
use crate::config::NetworkConfig;
use crate::error::{Result, SdkError};
use crate::gas::GasPolicy;
use crate::units;

use abi::IERC20;

// ============================================
// CONTRACT HANDLE
// ============================================

/// One deployed contract bound to a chain client
pub struct ContractHandle<C> {
    chain: Arc<C>,
    address: Address,
    gas: GasPolicy,
}

impl<C> std::fmt::Debug for ContractHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractHandle")
            .field("address", &self.address)
            .field("gas", &self.gas)
            .finish()
    }
}

impl<C> Clone for ContractHandle<C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            address: self.address,
            gas: self.gas,
        }
    }
}

impl<C: ChainClient> ContractHandle<C> {
    pub fn new(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self {
            chain,
            address,
            gas: GasPolicy::for_network(config),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> Address {
        self.chain.signer_address()
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    pub fn gas_policy(&self) -> GasPolicy {
        self.gas
    }

    /// A handle for another contract sharing this chain and gas policy
    pub fn at(&self, address: Address) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            address,
            gas: self.gas,
        }
    }

    /// Read-only call on this contract
    pub async fn read<T: SolCall>(&self, call: T) -> Result<T::Return> {
        self.read_at(self.address, call).await
    }

    /// Read-only call on any contract
    pub async fn read_at<T: SolCall>(&self, to: Address, call: T) -> Result<T::Return> {
        debug!("call {} on {:?}", T::SIGNATURE, to);
        let output = self.chain.call(&TxRequest::new(to, call.abi_encode())).await?;
        Ok(T::abi_decode_returns(&output)?)
    }

    /// Mutating call on this contract, not yet estimated or sent
    pub fn prepare<T: SolCall>(&self, call: T) -> PreparedTx<C> {
        self.prepare_at(self.address, call)
    }

    pub fn prepare_at<T: SolCall>(&self, to: Address, call: T) -> PreparedTx<C> {
        PreparedTx {
            chain: Arc::clone(&self.chain),
            tx: TxRequest::new(to, call.abi_encode()),
            gas: self.gas,
            method: T::SIGNATURE,
        }
    }

    // ========== Token amounts ==========

    /// Decimals of an ERC20, treating a reported 0 as 18
    pub async fn token_decimals(&self, token: Address) -> Result<u8> {
        let reported = self.read_at(token, IERC20::decimalsCall {}).await?;
        if reported == 0 {
            warn!("Token {:?} reports 0 decimals, using 18", token);
        }
        Ok(units::effective_decimals(reported))
    }

    /// Human amount to base units of `token`, looking up decimals when not given
    pub async fn amount_to_units(
        &self,
        token: Address,
        amount: &str,
        decimals: Option<u8>,
    ) -> Result<U256> {
        let decimals = match decimals {
            Some(d) => d,
            None => self.token_decimals(token).await?,
        };
        units::amount_to_units(amount, decimals)
    }

    pub async fn units_to_amount(
        &self,
        token: Address,
        amount: U256,
        decimals: Option<u8>,
    ) -> Result<String> {
        let decimals = match decimals {
            Some(d) => d,
            None => self.token_decimals(token).await?,
        };
        Ok(units::units_to_amount(amount, decimals))
    }
}

// ============================================
// PREPARED TRANSACTIONS
// ============================================

/// Whether a mutating call should stop after estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxMode {
    EstimateOnly,
    #[default]
    Send,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    Estimate(u64),
    Receipt(TxReceipt),
}

impl TxOutcome {
    pub fn receipt(&self) -> Option<&TxReceipt> {
        match self {
            TxOutcome::Receipt(r) => Some(r),
            TxOutcome::Estimate(_) => None,
        }
    }

    /// Estimated gas, or gas actually used
    pub fn gas(&self) -> u64 {
        match self {
            TxOutcome::Estimate(gas) => *gas,
            TxOutcome::Receipt(r) => r.gas_used,
        }
    }
}

/// A mutating call that passed its local pre-checks
pub struct PreparedTx<C> {
    chain: Arc<C>,
    tx: TxRequest,
    gas: GasPolicy,
    method: &'static str,
}

impl<C> std::fmt::Debug for PreparedTx<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedTx")
            .field("method", &self.method)
            .field("tx", &self.tx)
            .finish()
    }
}

impl<C: ChainClient> PreparedTx<C> {
    /// Attach native value (payable functions)
    pub fn with_value(mut self, value: U256) -> Self {
        self.tx.value = value;
        self
    }

    pub fn request(&self) -> &TxRequest {
        &self.tx
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Gas units the node expects this call to use
    pub async fn estimate(&self) -> Result<u64> {
        let gas = self.chain.estimate_gas(&self.tx).await?;
        debug!("estimate {} on {:?}: {} gas", self.method, self.tx.to, gas);
        Ok(gas)
    }

    /// Estimate, price with the gas policy, submit and wait for the receipt
    pub async fn send(self) -> Result<TxReceipt> {
        let gas_limit = self.estimate().await?;
        let reported = self.chain.gas_price().await?;
        let gas_price = self.gas.gas_price(reported);

        let mut tx = self.tx;
        tx.gas_limit = Some(gas_limit);
        tx.gas_price = Some(gas_price);

        info!(
            "📤 Sending {} to {:?} (gas {}, price {} wei)",
            self.method, tx.to, gas_limit, gas_price
        );
        let receipt = self.chain.send(tx).await?;
        info!(
            "✅ {} mined in block {:?}: {:?}",
            self.method, receipt.block_number, receipt.transaction_hash
        );
        Ok(receipt)
    }

    pub async fn execute(self, mode: TxMode) -> Result<TxOutcome> {
        match mode {
            TxMode::EstimateOnly => Ok(TxOutcome::Estimate(self.estimate().await?)),
            TxMode::Send => Ok(TxOutcome::Receipt(self.send().await?)),
        }
    }
}

// ============================================
// SHARED CHECKS
// ============================================

pub(crate) fn require_non_zero(address: Address, what: &str) -> Result<()> {
    if address == Address::ZERO {
        return Err(SdkError::invalid(format!("{what} must not be the zero address")));
    }
    Ok(())
}

pub(crate) fn require_same_length(a: usize, b: usize, what: &str) -> Result<()> {
    if a != b {
        return Err(SdkError::invalid(format!("{what} length mismatch: {a} vs {b}")));
    }
    Ok(())
}

pub(crate) fn require_role(granted: bool, role: &'static str) -> Result<()> {
    if granted {
        Ok(())
    } else {
        Err(SdkError::PermissionDenied { role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addr, test_config, ChainOp, MockChain};
    use alloy_sol_types::SolValue;

    #[tokio::test]
    async fn test_send_applies_multiplier() {
        let chain = MockChain::new(addr(1));
        let handle = ContractHandle::new(chain.clone(), addr(2), &test_config());

        let receipt = handle
            .prepare(IERC20::approveCall { spender: addr(3), amount: U256::from(5) })
            .send()
            .await
            .unwrap();
        assert!(receipt.status);

        let sent = chain.sends();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].gas_price, Some(21_000_000_000));
        assert_eq!(sent[0].gas_limit, Some(100_000));
        assert_eq!(sent[0].selector(), Some(IERC20::approveCall::SELECTOR));
    }

    #[tokio::test]
    async fn test_estimate_only_never_sends() {
        let chain = MockChain::new(addr(1));
        let handle = ContractHandle::new(chain.clone(), addr(2), &test_config());

        let outcome = handle
            .prepare(IERC20::transferCall { to: addr(3), amount: U256::from(1) })
            .execute(TxMode::EstimateOnly)
            .await
            .unwrap();

        assert_eq!(outcome, TxOutcome::Estimate(100_000));
        assert!(outcome.receipt().is_none());
        assert!(chain.sends().is_empty());
        assert!(!chain.ops().contains(&ChainOp::GasPrice));
    }

    #[tokio::test]
    async fn test_zero_decimals_default_to_18() {
        let chain = MockChain::new(addr(1));
        chain.on_call::<IERC20::decimalsCall>(addr(9), U256::from(0u8).abi_encode());
        let handle = ContractHandle::new(chain.clone(), addr(2), &test_config());

        assert_eq!(handle.token_decimals(addr(9)).await.unwrap(), 18);
        let units = handle.amount_to_units(addr(9), "2", None).await.unwrap();
        assert_eq!(units, U256::from(2_000_000_000_000_000_000u128));
        assert_eq!(handle.units_to_amount(addr(9), units, Some(6)).await.unwrap(), "2000000000000");
    }

    #[test]
    fn test_shared_checks() {
        assert!(require_non_zero(Address::ZERO, "owner").is_err());
        assert!(require_non_zero(addr(1), "owner").is_ok());
        assert!(require_same_length(2, 3, "users").is_err());
        tokio_test::assert_ok!(require_role(true, "Minter"));
        assert_eq!(
            require_role(false, "Minter").unwrap_err().to_string(),
            "caller is not Minter"
        );
    }
}
