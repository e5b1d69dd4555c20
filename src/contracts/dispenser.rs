//! Dispenser: free datatokens up to a per-request and per-holder cap

use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tracing::debug;

use super::abi::{IDispenser, IERC20};
use super::{require_role, ContractHandle, PreparedTx};
use crate::chain::ChainClient;
use crate::config::NetworkConfig;
use crate::error::Result;
use crate::units::{from_wei, to_wei};

const DISPENSER_OWNER: &str = "Dispenser Owner";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispenserStatus {
    pub active: bool,
    pub owner: Address,
    pub is_minter: bool,
    pub max_tokens: U256,
    pub max_balance: U256,
    pub balance: U256,
    pub allowed_swapper: Address,
}

impl DispenserStatus {
    /// Limits and balance as human-readable amounts
    pub fn max_tokens_amount(&self) -> String {
        from_wei(self.max_tokens)
    }

    pub fn max_balance_amount(&self) -> String {
        from_wei(self.max_balance)
    }

    pub fn balance_amount(&self) -> String {
        from_wei(self.balance)
    }
}

#[derive(Debug)]
pub struct Dispenser<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> Dispenser<C> {
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.dispenser_address, "Dispenser")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    pub async fn status(&self, datatoken: Address) -> Result<DispenserStatus> {
        let s = self.handle.read(IDispenser::statusCall { datatoken }).await?;
        Ok(DispenserStatus {
            active: s.active,
            owner: s.owner,
            is_minter: s.isMinter,
            max_tokens: s.maxTokens,
            max_balance: s.maxBalance,
            balance: s.balance,
            allowed_swapper: s.allowedSwapper,
        })
    }

    pub fn create(
        &self,
        datatoken: Address,
        owner: Address,
        max_tokens: &str,
        max_balance: &str,
        allowed_swapper: Option<Address>,
    ) -> Result<PreparedTx<C>> {
        Ok(self.handle.prepare(IDispenser::createCall {
            datatoken,
            maxTokens: to_wei(max_tokens)?,
            maxBalance: to_wei(max_balance)?,
            owner,
            allowedSwapper: allowed_swapper.unwrap_or(Address::ZERO),
        }))
    }

    pub async fn activate(
        &self,
        datatoken: Address,
        max_tokens: &str,
        max_balance: &str,
    ) -> Result<PreparedTx<C>> {
        self.check_owner(datatoken).await?;
        Ok(self.handle.prepare(IDispenser::activateCall {
            datatoken,
            maxTokens: to_wei(max_tokens)?,
            maxBalance: to_wei(max_balance)?,
        }))
    }

    pub async fn deactivate(&self, datatoken: Address) -> Result<PreparedTx<C>> {
        self.check_owner(datatoken).await?;
        Ok(self.handle.prepare(IDispenser::deactivateCall { datatoken }))
    }

    pub async fn set_allowed_swapper(
        &self,
        datatoken: Address,
        swapper: Option<Address>,
    ) -> Result<PreparedTx<C>> {
        self.check_owner(datatoken).await?;
        Ok(self.handle.prepare(IDispenser::setAllowedSwapperCall {
            datatoken,
            newAllowedSwapper: swapper.unwrap_or(Address::ZERO),
        }))
    }

    pub fn dispense(&self, datatoken: Address, amount: &str, destination: Address) -> Result<PreparedTx<C>> {
        Ok(self.handle.prepare(IDispenser::dispenseCall {
            datatoken,
            amount: to_wei(amount)?,
            destination,
        }))
    }

    /// Withdraw the dispenser's datatoken balance back to its owner
    pub async fn owner_withdraw(&self, datatoken: Address) -> Result<PreparedTx<C>> {
        self.check_owner(datatoken).await?;
        Ok(self.handle.prepare(IDispenser::ownerWithdrawCall { datatoken }))
    }

    /// Whether `user` could receive `amount` right now
    pub async fn is_dispensable(&self, datatoken: Address, user: Address, amount: &str) -> Result<bool> {
        let status = self.status(datatoken).await?;
        if !status.active {
            debug!("Dispenser for {:?} is inactive", datatoken);
            return Ok(false);
        }

        let amount = to_wei(amount)?;
        let user_balance = self
            .handle
            .read_at(datatoken, IERC20::balanceOfCall { account: user })
            .await?;
        if user_balance >= status.max_balance || amount > status.max_tokens {
            return Ok(false);
        }

        if !status.is_minter {
            let stock = self
                .handle
                .read_at(datatoken, IERC20::balanceOfCall { account: self.address() })
                .await?;
            if stock < amount {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn check_owner(&self, datatoken: Address) -> Result<()> {
        let status = self.status(datatoken).await?;
        require_role(status.owner == self.handle.signer(), DISPENSER_OWNER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addr, test_config, MockChain};
    use alloy_sol_types::SolValue;

    const DISPENSER: u8 = 0xd1;
    const DT: u8 = 0x20;

    fn dispenser(chain: &Arc<MockChain>, owner: Address, active: bool, is_minter: bool) -> Dispenser<MockChain> {
        chain.on_call::<IDispenser::statusCall>(
            addr(DISPENSER),
            (
                active,
                owner,
                is_minter,
                to_wei("2").unwrap(),
                to_wei("5").unwrap(),
                U256::ZERO,
                Address::ZERO,
            )
                .abi_encode_params(),
        );
        Dispenser::at(chain.clone(), addr(DISPENSER), &test_config())
    }

    #[tokio::test]
    async fn test_status_amounts() {
        let chain = MockChain::new(addr(1));
        let status = dispenser(&chain, addr(1), true, true).status(addr(DT)).await.unwrap();
        assert_eq!(status.max_tokens_amount(), "2");
        assert_eq!(status.max_balance_amount(), "5");
    }

    #[tokio::test]
    async fn test_is_dispensable() {
        let chain = MockChain::new(addr(1));
        let d = dispenser(&chain, addr(1), true, true);
        chain.on_call::<IERC20::balanceOfCall>(addr(DT), to_wei("1").unwrap().abi_encode());

        assert!(d.is_dispensable(addr(DT), addr(1), "1").await.unwrap());
        assert!(!d.is_dispensable(addr(DT), addr(1), "3").await.unwrap());

        // balance already at the cap
        chain.on_call::<IERC20::balanceOfCall>(addr(DT), to_wei("5").unwrap().abi_encode());
        assert!(!d.is_dispensable(addr(DT), addr(1), "1").await.unwrap());

        let inactive = dispenser(&chain, addr(1), false, true);
        assert!(!inactive.is_dispensable(addr(DT), addr(1), "1").await.unwrap());
    }

    #[tokio::test]
    async fn test_owner_operations_checked() {
        let chain = MockChain::new(addr(1));
        let d = dispenser(&chain, addr(2), true, true);
        let err = d.deactivate(addr(DT)).await.unwrap_err();
        assert_eq!(err.to_string(), "caller is not Dispenser Owner");
        assert!(d.owner_withdraw(addr(DT)).await.is_err());
        assert!(chain.only_reads());

        let tx = d.dispense(addr(DT), "1", addr(1)).unwrap().send().await.unwrap();
        assert!(tx.status);
    }
}
