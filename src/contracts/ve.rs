//! Vote-escrow family
//!
//! - [`VeOcean`]: lock the governance token for voting power
//! - [`VeAllocate`]: point voting power at data NFTs, in basis points
//! - [`VeFeeDistributor`] / [`VeFeeEstimate`]: fee-share claims

use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tracing::debug;

use super::abi::{IVeAllocate, IVeFeeDistributor, IVeFeeEstimate, IVeOcean};
use super::{require_same_length, ContractHandle, PreparedTx};
use crate::chain::ChainClient;
use crate::config::NetworkConfig;
use crate::error::{Result, SdkError};
use crate::units::from_wei;

/// Allocations are expressed in basis points of the caller's voting power
pub const MAX_ALLOCATION_BPS: u64 = 10_000;

/// `claim_many` takes a fixed-size receiver array
pub const MAX_CLAIM_RECEIVERS: usize = 20;

fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

// ============================================
// VE TOKEN
// ============================================

#[derive(Debug)]
pub struct VeOcean<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> VeOcean<C> {
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.ve_ocean, "veOCEAN")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    /// Lock `amount` until `unlock_time` (unix seconds)
    pub async fn lock_tokens(&self, amount: &str, unlock_time: u64) -> Result<PreparedTx<C>> {
        let value = self.locked_token_units(amount).await?;
        if unlock_time <= now() {
            return Err(SdkError::invalid(format!("unlock time {unlock_time} is not in the future")));
        }
        debug!("Locking {} until {}", amount, unlock_time);
        Ok(self.handle.prepare(IVeOcean::create_lockCall {
            value,
            unlockTime: U256::from(unlock_time),
        }))
    }

    pub async fn increase_amount(&self, amount: &str) -> Result<PreparedTx<C>> {
        let value = self.locked_token_units(amount).await?;
        Ok(self.handle.prepare(IVeOcean::increase_amountCall { value }))
    }

    /// Extend the caller's lock; must move the end forward
    pub async fn increase_unlock_time(&self, unlock_time: u64) -> Result<PreparedTx<C>> {
        let current_end = self.get_lock_end(self.handle.signer()).await?;
        if unlock_time <= current_end || unlock_time <= now() {
            return Err(SdkError::invalid(format!(
                "unlock time {unlock_time} must be after the current lock end {current_end}"
            )));
        }
        Ok(self.handle.prepare(IVeOcean::increase_unlock_timeCall {
            unlockTime: U256::from(unlock_time),
        }))
    }

    /// Withdraw an expired lock
    pub fn withdraw(&self) -> PreparedTx<C> {
        self.handle.prepare(IVeOcean::withdrawCall {})
    }

    pub async fn get_voting_power(&self, user: Address) -> Result<String> {
        Ok(from_wei(self.handle.read(IVeOcean::balanceOfCall { user }).await?))
    }

    pub async fn get_locked_amount(&self, user: Address) -> Result<String> {
        let locked = self.handle.read(IVeOcean::lockedCall { user }).await?;
        let token = self.get_token().await?;
        let amount = U256::from(locked.amount.max(0) as u128);
        self.handle.units_to_amount(token, amount, None).await
    }

    /// Lock end in unix seconds, 0 when nothing is locked
    pub async fn get_lock_end(&self, user: Address) -> Result<u64> {
        let end = self.handle.read(IVeOcean::locked__endCall { user }).await?;
        Ok(end.saturating_to())
    }

    /// Token being locked
    pub async fn get_token(&self) -> Result<Address> {
        self.handle.read(IVeOcean::tokenCall {}).await
    }

    async fn locked_token_units(&self, amount: &str) -> Result<U256> {
        let token = self.get_token().await?;
        let value = self.handle.amount_to_units(token, amount, None).await?;
        if value.is_zero() {
            return Err(SdkError::invalid("lock amount must be positive"));
        }
        Ok(value)
    }
}

// ============================================
// ALLOCATION
// ============================================

#[derive(Debug)]
pub struct VeAllocate<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> VeAllocate<C> {
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.ve_allocate, "veAllocate")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    /// Allocate `amount_bps` of the caller's voting power to `nft` on `chain_id`
    pub fn set_allocation(&self, amount_bps: u64, nft: Address, chain_id: u64) -> Result<PreparedTx<C>> {
        check_bps(amount_bps)?;
        Ok(self.handle.prepare(IVeAllocate::setAllocationCall {
            amount: U256::from(amount_bps),
            nft,
            chainId: U256::from(chain_id),
        }))
    }

    pub fn set_batch_allocation(
        &self,
        amounts_bps: &[u64],
        nfts: &[Address],
        chain_ids: &[u64],
    ) -> Result<PreparedTx<C>> {
        require_same_length(amounts_bps.len(), nfts.len(), "amounts and nfts")?;
        require_same_length(amounts_bps.len(), chain_ids.len(), "amounts and chain ids")?;
        for amount in amounts_bps {
            check_bps(*amount)?;
        }
        Ok(self.handle.prepare(IVeAllocate::setBatchAllocationCall {
            amount: amounts_bps.iter().map(|a| U256::from(*a)).collect(),
            nft: nfts.to_vec(),
            chainId: chain_ids.iter().map(|c| U256::from(*c)).collect(),
        }))
    }

    pub async fn get_ve_allocation(&self, user: Address, nft: Address, chain_id: u64) -> Result<u64> {
        let bps = self
            .handle
            .read(IVeAllocate::getveAllocationCall { user, nft, chainId: U256::from(chain_id) })
            .await?;
        Ok(bps.saturating_to())
    }

    pub async fn get_total_allocation(&self, user: Address) -> Result<u64> {
        let bps = self.handle.read(IVeAllocate::getTotalAllocationCall { user }).await?;
        Ok(bps.saturating_to())
    }
}

fn check_bps(amount: u64) -> Result<()> {
    if amount > MAX_ALLOCATION_BPS {
        return Err(SdkError::invalid(format!(
            "allocation {amount} exceeds {MAX_ALLOCATION_BPS} basis points"
        )));
    }
    Ok(())
}

// ============================================
// FEES
// ============================================

#[derive(Debug)]
pub struct VeFeeDistributor<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> VeFeeDistributor<C> {
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.ve_fee_distributor, "veFeeDistributor")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    /// Claim the caller's accrued fees
    pub fn claim(&self) -> PreparedTx<C> {
        self.handle.prepare(IVeFeeDistributor::claimCall {})
    }

    /// Claim on behalf of up to 20 receivers
    pub fn claim_many(&self, receivers: &[Address]) -> Result<PreparedTx<C>> {
        if receivers.is_empty() || receivers.len() > MAX_CLAIM_RECEIVERS {
            return Err(SdkError::invalid(format!(
                "claim_many takes 1 to {MAX_CLAIM_RECEIVERS} receivers, got {}",
                receivers.len()
            )));
        }
        let mut padded = [Address::ZERO; MAX_CLAIM_RECEIVERS];
        padded[..receivers.len()].copy_from_slice(receivers);
        Ok(self.handle.prepare(IVeFeeDistributor::claim_manyCall { receivers: padded }))
    }

    pub async fn get_token(&self) -> Result<Address> {
        self.handle.read(IVeFeeDistributor::tokenCall {}).await
    }
}

#[derive(Debug)]
pub struct VeFeeEstimate<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> VeFeeEstimate<C> {
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.ve_fee_estimate, "veFeeEstimate")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    /// Fees `user` could claim now
    pub async fn estimate_claim(&self, user: Address) -> Result<String> {
        Ok(from_wei(self.handle.read(IVeFeeEstimate::estimateClaimCall { user }).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use crate::contracts::abi::IERC20;
    use crate::testing::{addr, test_config, MockChain};
    use crate::units::to_wei;
    use alloy_sol_types::{SolCall, SolValue};

    const VE: u8 = 0x7a;
    const OCEAN: u8 = 0x0c;

    fn ve(chain: &Arc<MockChain>) -> VeOcean<MockChain> {
        chain.on_call::<IVeOcean::tokenCall>(addr(VE), addr(OCEAN).abi_encode());
        chain.on_call::<IERC20::decimalsCall>(addr(OCEAN), U256::from(18u8).abi_encode());
        VeOcean::at(chain.clone(), addr(VE), &test_config())
    }

    #[tokio::test]
    async fn test_lock_requires_positive_amount_and_future_time() {
        let chain = MockChain::new(addr(1));
        let ve = ve(&chain);
        let next_week = now() + 7 * 24 * 3600;

        assert_err!(ve.lock_tokens("0", next_week).await);
        assert_err!(ve.lock_tokens("10", now().saturating_sub(1)).await);
        assert_eq!(chain.estimates(), 0);

        let tx = ve.lock_tokens("10", next_week).await.unwrap();
        let call = IVeOcean::create_lockCall::abi_decode(&tx.request().data).unwrap();
        assert_eq!(call.value, to_wei("10").unwrap());
        assert_eq!(call.unlockTime, U256::from(next_week));
    }

    #[tokio::test]
    async fn test_locked_amount() {
        let chain = MockChain::new(addr(1));
        let ve = ve(&chain);
        chain.on_call::<IVeOcean::lockedCall>(
            addr(VE),
            (1_500_000_000_000_000_000i128, U256::from(1u64)).abi_encode_params(),
        );
        assert_eq!(ve.get_locked_amount(addr(1)).await.unwrap(), "1.5");
    }

    #[tokio::test]
    async fn test_increase_unlock_time_moves_forward() {
        let chain = MockChain::new(addr(1));
        let ve = ve(&chain);
        let end = now() + 1000;
        chain.on_call::<IVeOcean::locked__endCall>(addr(VE), U256::from(end).abi_encode());

        assert_err!(ve.increase_unlock_time(end).await);
        assert_ok!(ve.increase_unlock_time(end + 1).await);
    }

    #[test]
    fn test_allocation_bounds() {
        let chain = MockChain::new(addr(1));
        let allocate = VeAllocate::at(chain.clone(), addr(0xa0), &test_config());

        assert_ok!(allocate.set_allocation(10_000, addr(0x10), 1));
        assert_err!(allocate.set_allocation(10_001, addr(0x10), 1));
        assert_err!(allocate.set_batch_allocation(&[100, 200], &[addr(2)], &[1, 1]));
        assert_ok!(allocate.set_batch_allocation(&[100, 200], &[addr(2), addr(3)], &[1, 137]));
    }

    #[test]
    fn test_claim_many_pads_receivers() {
        let chain = MockChain::new(addr(1));
        let distributor = VeFeeDistributor::at(chain.clone(), addr(0xfd), &test_config());

        let tx = distributor.claim_many(&[addr(2), addr(3)]).unwrap();
        let call = IVeFeeDistributor::claim_manyCall::abi_decode(&tx.request().data).unwrap();
        assert_eq!(call.receivers[1], addr(3));
        assert_eq!(call.receivers[2], Address::ZERO);

        assert_err!(distributor.claim_many(&[]));
        assert!(distributor.claim_many(&[addr(2); 21]).is_err());
    }
}
