//! Payment escrow: payers deposit funds and authorize payees to lock them

use alloy_primitives::{Address, U256};
use std::sync::Arc;

use super::abi::{Authorization, EscrowLock, IEscrow};
use super::{require_non_zero, require_same_length, ContractHandle, PreparedTx};
use crate::chain::ChainClient;
use crate::config::NetworkConfig;
use crate::error::Result;
use crate::units;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowFunds {
    pub available: String,
    pub locked: String,
}

#[derive(Debug)]
pub struct Escrow<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> Escrow<C> {
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.escrow, "Escrow")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    pub async fn deposit(&self, token: Address, amount: &str) -> Result<PreparedTx<C>> {
        let amount = self.handle.amount_to_units(token, amount, None).await?;
        Ok(self.handle.prepare(IEscrow::depositCall { token, amount }))
    }

    pub async fn withdraw(&self, tokens: &[Address], amounts: &[String]) -> Result<PreparedTx<C>> {
        require_same_length(tokens.len(), amounts.len(), "tokens and amounts")?;

        let mut parsed = Vec::with_capacity(amounts.len());
        for (token, amount) in tokens.iter().zip(amounts) {
            parsed.push(self.handle.amount_to_units(*token, amount, None).await?);
        }
        Ok(self.handle.prepare(IEscrow::withdrawCall {
            tokens: tokens.to_vec(),
            amounts: parsed,
        }))
    }

    /// Let `payee` lock up to `max_locked_amount` of the caller's funds
    pub async fn authorize(
        &self,
        token: Address,
        payee: Address,
        max_locked_amount: &str,
        max_lock_seconds: u64,
        max_lock_counts: u64,
    ) -> Result<PreparedTx<C>> {
        require_non_zero(payee, "payee")?;
        let max_locked = self.handle.amount_to_units(token, max_locked_amount, None).await?;
        Ok(self.handle.prepare(IEscrow::authorizeCall {
            token,
            payee,
            maxLockedAmount: max_locked,
            maxLockSeconds: U256::from(max_lock_seconds),
            maxLockCounts: U256::from(max_lock_counts),
        }))
    }

    /// Caller's funds for `token`
    pub async fn get_funds(&self, token: Address) -> Result<EscrowFunds> {
        let f = self.handle.read(IEscrow::getFundsCall { token }).await?;
        self.funds(token, f.available, f.locked).await
    }

    pub async fn get_user_funds(&self, payer: Address, token: Address) -> Result<EscrowFunds> {
        let f = self.handle.read(IEscrow::getUserFundsCall { payer, token }).await?;
        self.funds(token, f.available, f.locked).await
    }

    pub async fn get_user_tokens(&self, payer: Address) -> Result<Vec<Address>> {
        self.handle.read(IEscrow::getUserTokensCall { payer }).await
    }

    pub async fn get_locks(&self, token: Address, payer: Address, payee: Address) -> Result<Vec<EscrowLock>> {
        self.handle.read(IEscrow::getLocksCall { token, payer, payee }).await
    }

    pub async fn get_authorizations(
        &self,
        token: Address,
        payer: Address,
        payee: Address,
    ) -> Result<Vec<Authorization>> {
        self.handle
            .read(IEscrow::getAuthorizationsCall { token, payer, payee })
            .await
    }

    async fn funds(&self, token: Address, available: U256, locked: U256) -> Result<EscrowFunds> {
        let decimals = self.handle.token_decimals(token).await?;
        Ok(EscrowFunds {
            available: units::units_to_amount(available, decimals),
            locked: units::units_to_amount(locked, decimals),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::abi::IERC20;
    use crate::testing::{addr, test_config, MockChain};
    use alloy_sol_types::{SolCall, SolValue};

    const ESCROW: u8 = 0xe5;
    const USDC: u8 = 0x06;

    fn escrow(chain: &Arc<MockChain>) -> Escrow<MockChain> {
        chain.on_call::<IERC20::decimalsCall>(addr(USDC), U256::from(6u8).abi_encode());
        Escrow::at(chain.clone(), addr(ESCROW), &test_config())
    }

    #[tokio::test]
    async fn test_deposit_uses_token_decimals() {
        let chain = MockChain::new(addr(1));
        let tx = escrow(&chain).deposit(addr(USDC), "12.5").await.unwrap();
        let call = IEscrow::depositCall::abi_decode(&tx.request().data).unwrap();
        assert_eq!(call.amount, U256::from(12_500_000u64));
    }

    #[tokio::test]
    async fn test_withdraw_length_mismatch() {
        let chain = MockChain::new(addr(1));
        let e = escrow(&chain);
        assert!(e.withdraw(&[addr(USDC)], &[]).await.is_err());
        assert!(chain.ops().is_empty());
        assert!(e.withdraw(&[addr(USDC)], &["1".into()]).await.is_ok());
    }

    #[tokio::test]
    async fn test_user_funds() {
        let chain = MockChain::new(addr(1));
        chain.on_call::<IEscrow::getUserFundsCall>(
            addr(ESCROW),
            (U256::from(3_000_000u64), U256::from(250_000u64)).abi_encode_params(),
        );
        let funds = escrow(&chain).get_user_funds(addr(1), addr(USDC)).await.unwrap();
        assert_eq!(funds, EscrowFunds { available: "3".into(), locked: "0.25".into() });
    }
}
