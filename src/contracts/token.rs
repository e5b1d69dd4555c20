//! ERC20 helpers shared by the pricing contracts

use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tracing::debug;

use super::abi::IERC20;
use super::{ContractHandle, PreparedTx};
use crate::chain::ChainClient;
use crate::config::NetworkConfig;
use crate::error::Result;

/// Any fungible token, addressed by human-readable amounts
#[derive(Debug)]
pub struct Erc20<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> Erc20<C> {
    pub fn new(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    pub fn from_handle(handle: ContractHandle<C>) -> Self {
        Self { handle }
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    pub async fn name(&self) -> Result<String> {
        self.handle.read(IERC20::nameCall {}).await
    }

    pub async fn symbol(&self) -> Result<String> {
        self.handle.read(IERC20::symbolCall {}).await
    }

    /// Decimals, 18 when the token reports 0
    pub async fn decimals(&self) -> Result<u8> {
        self.handle.token_decimals(self.handle.address()).await
    }

    pub async fn total_supply(&self) -> Result<String> {
        let supply = self.handle.read(IERC20::totalSupplyCall {}).await?;
        self.handle.units_to_amount(self.address(), supply, None).await
    }

    pub async fn balance(&self, account: Address) -> Result<String> {
        let balance = self.handle.read(IERC20::balanceOfCall { account }).await?;
        self.handle.units_to_amount(self.address(), balance, None).await
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<String> {
        let allowance = self.handle.read(IERC20::allowanceCall { owner, spender }).await?;
        self.handle.units_to_amount(self.address(), allowance, None).await
    }

    /// Approve `spender` for `amount`.
    ///
    /// `None` when the current allowance already covers the amount and
    /// `force` is false.
    pub async fn approve(
        &self,
        spender: Address,
        amount: &str,
        force: bool,
    ) -> Result<Option<PreparedTx<C>>> {
        let amount = self.handle.amount_to_units(self.address(), amount, None).await?;
        if !force {
            let current = self
                .handle
                .read(IERC20::allowanceCall { owner: self.handle.signer(), spender })
                .await?;
            if current >= amount {
                debug!("Allowance of {:?} on {:?} already sufficient", spender, self.address());
                return Ok(None);
            }
        }
        Ok(Some(self.approve_units(spender, amount)))
    }

    pub fn approve_units(&self, spender: Address, amount: U256) -> PreparedTx<C> {
        self.handle.prepare(IERC20::approveCall { spender, amount })
    }

    pub async fn transfer(&self, to: Address, amount: &str) -> Result<PreparedTx<C>> {
        let amount = self.handle.amount_to_units(self.address(), amount, None).await?;
        Ok(self.handle.prepare(IERC20::transferCall { to, amount }))
    }
}
