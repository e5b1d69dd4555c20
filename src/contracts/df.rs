//! Data-farming rewards and the strategy contract that claims them in bulk

use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use std::sync::Arc;

use super::abi::{IDfRewards, IDfStrategyV1};
use super::{require_non_zero, ContractHandle, PreparedTx};
use crate::chain::ChainClient;
use crate::config::NetworkConfig;
use crate::error::{Result, SdkError};

#[derive(Debug)]
pub struct DfRewards<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> DfRewards<C> {
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.df_rewards, "DFRewards")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    /// Rewards in `token` that `user` can claim
    pub async fn get_available_rewards(&self, user: Address, token: Address) -> Result<String> {
        let units = self
            .handle
            .read(IDfRewards::claimableCall { to: user, tokenAddress: token })
            .await?;
        self.handle.units_to_amount(token, units, None).await
    }

    /// Claim `user`'s rewards in `token`; anyone may trigger it
    pub fn claim_rewards(&self, user: Address, token: Address) -> Result<PreparedTx<C>> {
        require_non_zero(user, "reward recipient")?;
        Ok(self.handle.prepare(IDfRewards::claimForCall { to: user, tokenAddress: token }))
    }
}

#[derive(Debug)]
pub struct DfStrategy<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> DfStrategy<C> {
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.df_strategy_v1, "DFStrategyV1")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    /// Claimable amounts for each of `tokens`, in the same order
    pub async fn get_multiple_available_rewards(
        &self,
        user: Address,
        tokens: &[Address],
    ) -> Result<Vec<String>> {
        let claimables = self
            .handle
            .read(IDfStrategyV1::claimablesCall { to: user, tokenAddresses: tokens.to_vec() })
            .await?;
        if claimables.len() != tokens.len() {
            return Err(SdkError::ContractCall {
                method: IDfStrategyV1::claimablesCall::SIGNATURE,
                reason: format!("expected {} amounts, got {}", tokens.len(), claimables.len()),
            });
        }

        let mut amounts = Vec::with_capacity(tokens.len());
        for (token, units) in tokens.iter().zip(claimables) {
            amounts.push(self.handle.units_to_amount(*token, units, None).await?);
        }
        Ok(amounts)
    }

    pub fn claim_multiple_rewards(&self, user: Address, tokens: &[Address]) -> Result<PreparedTx<C>> {
        require_non_zero(user, "reward recipient")?;
        if tokens.is_empty() {
            return Err(SdkError::invalid("no reward tokens given"));
        }
        Ok(self.handle.prepare(IDfStrategyV1::claimMultipleCall {
            to: user,
            tokenAddresses: tokens.to_vec(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use crate::contracts::abi::IERC20;
    use crate::testing::{addr, test_config, MockChain};
    use crate::units::to_wei;
    use alloy_primitives::U256;
    use alloy_sol_types::SolValue;

    const OCEAN: u8 = 0x0c;
    const USDC: u8 = 0x06;

    #[tokio::test]
    async fn test_available_rewards() {
        let chain = MockChain::new(addr(1));
        chain.on_call::<IERC20::decimalsCall>(addr(OCEAN), U256::from(18u8).abi_encode());
        chain.on_call::<IDfRewards::claimableCall>(addr(0xdf), to_wei("12.5").unwrap().abi_encode());

        let rewards = DfRewards::at(chain.clone(), addr(0xdf), &test_config());
        assert_eq!(rewards.get_available_rewards(addr(1), addr(OCEAN)).await.unwrap(), "12.5");
        assert_err!(rewards.claim_rewards(Address::ZERO, addr(OCEAN)));
        assert!(chain.only_reads());
    }

    #[tokio::test]
    async fn test_multiple_rewards_use_each_token_decimals() {
        let chain = MockChain::new(addr(1));
        chain.on_call::<IERC20::decimalsCall>(addr(OCEAN), U256::from(18u8).abi_encode());
        chain.on_call::<IERC20::decimalsCall>(addr(USDC), U256::from(6u8).abi_encode());
        chain.on_call::<IDfStrategyV1::claimablesCall>(
            addr(0xd5),
            vec![to_wei("1").unwrap(), U256::from(2_500_000u64)].abi_encode(),
        );

        let strategy = DfStrategy::at(chain.clone(), addr(0xd5), &test_config());
        let amounts = strategy
            .get_multiple_available_rewards(addr(1), &[addr(OCEAN), addr(USDC)])
            .await
            .unwrap();
        assert_eq!(amounts, vec!["1".to_string(), "2.5".to_string()]);

        assert_err!(strategy.claim_multiple_rewards(addr(1), &[]));
        let receipt = strategy
            .claim_multiple_rewards(addr(1), &[addr(OCEAN)])
            .unwrap()
            .send()
            .await
            .unwrap();
        assert!(receipt.status);
        assert_eq!(chain.sends().len(), 1);
    }
}
