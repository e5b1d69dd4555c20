//! Legacy two-token weighted pools
//!
//! Pools pair a datatoken with a base token (OCEAN by default) under a
//! 10-point weight split. All pricing and join/exit accounting happens in
//! the pool contract; this module only checks arguments and marshals them.
//!
//! Pool shares, weights, fees and spot prices are 18-decimal fixed point.
//! Token amounts use each token's own decimals.

use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, info};

use crate::chain::ChainClient;
use crate::config::NetworkConfig;
use crate::contracts::abi::{IBFactory, IBPool};
use crate::contracts::token::Erc20;
use crate::contracts::{require_role, require_same_length, ContractHandle, PreparedTx};
use crate::error::{Result, SdkError};
use crate::units::{from_wei, to_wei};

/// Weights of the two sides always add up to this
pub const TOTAL_WEIGHT: u64 = 10;
pub const MIN_DT_WEIGHT: u64 = 1;
pub const MAX_DT_WEIGHT: u64 = 9;

const POOL_CONTROLLER: &str = "Pool Controller";

// 1e-6 and 10%, in 18-decimal fixed point
const MIN_SWAP_FEE: u128 = 1_000_000_000_000;
const MAX_SWAP_FEE: u128 = 100_000_000_000_000_000;

// ============================================
// PAIRING ARITHMETIC
// ============================================

/// Base-token side of a new pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolPairing {
    pub amount: String,
    pub weight: String,
}

/// Base-token amount and weight matching `amount` datatokens at `weight`.
///
/// The paired weight is `10 - weight` and the paired amount
/// `amount * (10 - weight) / weight`, truncated at 18 decimals.
pub fn dt_pool_pairing(amount: &str, weight: &str) -> Result<PoolPairing> {
    let weight_fp = to_wei(weight)?;
    let one = to_wei("1")?;
    if weight_fp < one * U256::from(MIN_DT_WEIGHT) || weight_fp > one * U256::from(MAX_DT_WEIGHT) {
        return Err(SdkError::invalid(format!(
            "datatoken weight {weight} outside [{MIN_DT_WEIGHT}, {MAX_DT_WEIGHT}]"
        )));
    }

    let amount_fp = to_wei(amount)?;
    if amount_fp.is_zero() {
        return Err(SdkError::invalid("datatoken amount must be positive"));
    }

    let paired_weight = one * U256::from(TOTAL_WEIGHT) - weight_fp;
    let paired_amount = amount_fp
        .checked_mul(paired_weight)
        .map(|scaled| scaled / weight_fp)
        .ok_or_else(|| SdkError::invalid(format!("datatoken amount {amount} too large to pair")))?;

    Ok(PoolPairing {
        amount: from_wei(paired_amount),
        weight: from_wei(paired_weight),
    })
}

fn check_swap_fee(fee: U256) -> Result<()> {
    if fee < U256::from(MIN_SWAP_FEE) || fee > U256::from(MAX_SWAP_FEE) {
        return Err(SdkError::invalid(format!(
            "swap fee {} outside [0.000001, 0.1]",
            from_wei(fee)
        )));
    }
    Ok(())
}

// ============================================
// POOL FACTORY
// ============================================

/// Creates datatoken/base-token pools through the pool factory
#[derive(Debug)]
pub struct OceanPool<C> {
    factory: ContractHandle<C>,
    base_token: Address,
}

impl<C: ChainClient> OceanPool<C> {
    /// Pools paired against the network's OCEAN token
    pub fn new(chain: Arc<C>, factory: Address, config: &NetworkConfig) -> Result<Self> {
        let ocean = config.require(config.ocean_token_address, "Ocean")?;
        Ok(Self::at(chain, factory, ocean, config))
    }

    pub fn at(chain: Arc<C>, factory: Address, base_token: Address, config: &NetworkConfig) -> Self {
        Self {
            factory: ContractHandle::new(chain, factory, config),
            base_token,
        }
    }

    pub fn base_token(&self) -> Address {
        self.base_token
    }

    /// Handle on an existing pool
    pub fn pool(&self, address: Address) -> WeightedPool<C> {
        WeightedPool { handle: self.factory.at(address) }
    }

    /// Deploy a pool, approve both sides and seed it with `amount` datatokens
    /// at `weight`, the base token filling the rest of the weight.
    ///
    /// Sends up to four transactions: pool creation, two approvals (skipped
    /// when the allowance already covers the amount) and setup.
    pub async fn create_dt_pool(
        &self,
        datatoken: Address,
        amount: &str,
        weight: &str,
        swap_fee: &str,
    ) -> Result<WeightedPool<C>> {
        let pairing = dt_pool_pairing(amount, weight)?;
        let fee = to_wei(swap_fee)?;
        check_swap_fee(fee)?;

        let dt_amount = self.factory.amount_to_units(datatoken, amount, None).await?;
        let base_amount = self
            .factory
            .amount_to_units(self.base_token, &pairing.amount, None)
            .await?;

        let receipt = self.factory.prepare(IBFactory::newBPoolCall {}).send().await?;
        let pool_address = receipt.require_event::<IBFactory::BPoolRegistered>()?.bpoolAddress;
        info!("🏊 Pool {:?} registered for datatoken {:?}", pool_address, datatoken);

        for (token, token_amount) in [(datatoken, amount), (self.base_token, pairing.amount.as_str())] {
            let erc20 = Erc20::from_handle(self.factory.at(token));
            if let Some(approval) = erc20.approve(pool_address, token_amount, false).await? {
                approval.send().await?;
            }
        }

        let pool = self.pool(pool_address);
        pool.handle
            .prepare(IBPool::setupCall {
                dataTokenAaddress: datatoken,
                dataTokenAmount: dt_amount,
                dataTokenWeight: to_wei(weight)?,
                baseTokenAddress: self.base_token,
                baseTokenAmount: base_amount,
                baseTokenWeight: to_wei(&pairing.weight)?,
                swapFee: fee,
            })
            .send()
            .await?;

        debug!(
            "Pool {:?} seeded: {} DT @ {} / {} base @ {}",
            pool_address, amount, weight, pairing.amount, pairing.weight
        );
        Ok(pool)
    }
}

// ============================================
// POOL
// ============================================

#[derive(Debug)]
pub struct WeightedPool<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> WeightedPool<C> {
    pub fn new(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    // ========== Readers ==========

    pub async fn get_controller(&self) -> Result<Address> {
        self.handle.read(IBPool::getControllerCall {}).await
    }

    pub async fn is_finalized(&self) -> Result<bool> {
        self.handle.read(IBPool::isFinalizedCall {}).await
    }

    pub async fn is_bound(&self, token: Address) -> Result<bool> {
        self.handle.read(IBPool::isBoundCall { token }).await
    }

    pub async fn get_current_tokens(&self) -> Result<Vec<Address>> {
        self.handle.read(IBPool::getCurrentTokensCall {}).await
    }

    pub async fn get_final_tokens(&self) -> Result<Vec<Address>> {
        self.handle.read(IBPool::getFinalTokensCall {}).await
    }

    pub async fn get_balance(&self, token: Address) -> Result<String> {
        let balance = self.handle.read(IBPool::getBalanceCall { token }).await?;
        self.handle.units_to_amount(token, balance, None).await
    }

    pub async fn get_denormalized_weight(&self, token: Address) -> Result<String> {
        Ok(from_wei(self.handle.read(IBPool::getDenormalizedWeightCall { token }).await?))
    }

    /// Share of the total weight, as a fraction
    pub async fn get_normalized_weight(&self, token: Address) -> Result<String> {
        Ok(from_wei(self.handle.read(IBPool::getNormalizedWeightCall { token }).await?))
    }

    pub async fn get_swap_fee(&self) -> Result<String> {
        Ok(from_wei(self.handle.read(IBPool::getSwapFeeCall {}).await?))
    }

    /// Outstanding pool shares
    pub async fn total_supply(&self) -> Result<String> {
        Ok(from_wei(self.handle.read(IBPool::totalSupplyCall {}).await?))
    }

    /// Price of `token_out` in `token_in`, swap fee included
    pub async fn get_spot_price(&self, token_in: Address, token_out: Address) -> Result<String> {
        let price = self
            .handle
            .read(IBPool::getSpotPriceCall { tokenIn: token_in, tokenOut: token_out })
            .await?;
        Ok(from_wei(price))
    }

    pub async fn get_spot_price_sans_fee(&self, token_in: Address, token_out: Address) -> Result<String> {
        let price = self
            .handle
            .read(IBPool::getSpotPriceSansFeeCall { tokenIn: token_in, tokenOut: token_out })
            .await?;
        Ok(from_wei(price))
    }

    // ========== Controller ==========

    pub async fn bind(&self, token: Address, balance: &str, weight: &str) -> Result<PreparedTx<C>> {
        self.check_controller().await?;
        let balance = self.handle.amount_to_units(token, balance, None).await?;
        Ok(self.handle.prepare(IBPool::bindCall {
            token,
            balance,
            denorm: to_wei(weight)?,
        }))
    }

    pub async fn set_swap_fee(&self, fee: &str) -> Result<PreparedTx<C>> {
        self.check_controller().await?;
        let fee = to_wei(fee)?;
        check_swap_fee(fee)?;
        Ok(self.handle.prepare(IBPool::setSwapFeeCall { swapFee: fee }))
    }

    /// Open the pool to public swaps and joins
    pub async fn finalize(&self) -> Result<PreparedTx<C>> {
        self.check_controller().await?;
        if self.is_finalized().await? {
            return Err(SdkError::invalid(format!("pool {:?} is already finalized", self.address())));
        }
        Ok(self.handle.prepare(IBPool::finalizeCall {}))
    }

    // ========== Swaps ==========

    /// Sell exactly `amount_in` of `token_in`. `max_price` of `None` means
    /// no price limit.
    pub async fn swap_exact_amount_in(
        &self,
        token_in: Address,
        amount_in: &str,
        token_out: Address,
        min_amount_out: &str,
        max_price: Option<&str>,
    ) -> Result<PreparedTx<C>> {
        Ok(self.handle.prepare(IBPool::swapExactAmountInCall {
            tokenIn: token_in,
            tokenAmountIn: self.handle.amount_to_units(token_in, amount_in, None).await?,
            tokenOut: token_out,
            minAmountOut: self.handle.amount_to_units(token_out, min_amount_out, None).await?,
            maxPrice: price_limit(max_price)?,
        }))
    }

    /// Buy exactly `amount_out` of `token_out`
    pub async fn swap_exact_amount_out(
        &self,
        token_in: Address,
        max_amount_in: &str,
        token_out: Address,
        amount_out: &str,
        max_price: Option<&str>,
    ) -> Result<PreparedTx<C>> {
        Ok(self.handle.prepare(IBPool::swapExactAmountOutCall {
            tokenIn: token_in,
            maxAmountIn: self.handle.amount_to_units(token_in, max_amount_in, None).await?,
            tokenOut: token_out,
            tokenAmountOut: self.handle.amount_to_units(token_out, amount_out, None).await?,
            maxPrice: price_limit(max_price)?,
        }))
    }

    // ========== Liquidity ==========

    /// Mint `pool_amount_out` shares, paying at most `max_amounts_in` of
    /// each final token (in `get_final_tokens` order)
    pub async fn join_pool(&self, pool_amount_out: &str, max_amounts_in: &[String]) -> Result<PreparedTx<C>> {
        let limits = self.per_token_units(max_amounts_in).await?;
        Ok(self.handle.prepare(IBPool::joinPoolCall {
            poolAmountOut: to_wei(pool_amount_out)?,
            maxAmountsIn: limits,
        }))
    }

    /// Burn `pool_amount_in` shares, receiving at least `min_amounts_out`
    pub async fn exit_pool(&self, pool_amount_in: &str, min_amounts_out: &[String]) -> Result<PreparedTx<C>> {
        let limits = self.per_token_units(min_amounts_out).await?;
        Ok(self.handle.prepare(IBPool::exitPoolCall {
            poolAmountIn: to_wei(pool_amount_in)?,
            minAmountsOut: limits,
        }))
    }

    /// Single-sided join paying exactly `amount_in`
    pub async fn join_swap_extern_amount_in(
        &self,
        token_in: Address,
        amount_in: &str,
        min_pool_amount_out: &str,
    ) -> Result<PreparedTx<C>> {
        Ok(self.handle.prepare(IBPool::joinswapExternAmountInCall {
            tokenIn: token_in,
            tokenAmountIn: self.handle.amount_to_units(token_in, amount_in, None).await?,
            minPoolAmountOut: to_wei(min_pool_amount_out)?,
        }))
    }

    /// Single-sided join receiving exactly `pool_amount_out` shares
    pub async fn join_swap_pool_amount_out(
        &self,
        token_in: Address,
        pool_amount_out: &str,
        max_amount_in: &str,
    ) -> Result<PreparedTx<C>> {
        Ok(self.handle.prepare(IBPool::joinswapPoolAmountOutCall {
            tokenIn: token_in,
            poolAmountOut: to_wei(pool_amount_out)?,
            maxAmountIn: self.handle.amount_to_units(token_in, max_amount_in, None).await?,
        }))
    }

    pub async fn exit_swap_pool_amount_in(
        &self,
        token_out: Address,
        pool_amount_in: &str,
        min_amount_out: &str,
    ) -> Result<PreparedTx<C>> {
        Ok(self.handle.prepare(IBPool::exitswapPoolAmountInCall {
            tokenOut: token_out,
            poolAmountIn: to_wei(pool_amount_in)?,
            minAmountOut: self.handle.amount_to_units(token_out, min_amount_out, None).await?,
        }))
    }

    pub async fn exit_swap_extern_amount_out(
        &self,
        token_out: Address,
        amount_out: &str,
        max_pool_amount_in: &str,
    ) -> Result<PreparedTx<C>> {
        Ok(self.handle.prepare(IBPool::exitswapExternAmountOutCall {
            tokenOut: token_out,
            tokenAmountOut: self.handle.amount_to_units(token_out, amount_out, None).await?,
            maxPoolAmountIn: to_wei(max_pool_amount_in)?,
        }))
    }

    async fn per_token_units(&self, amounts: &[String]) -> Result<Vec<U256>> {
        let tokens = self.get_final_tokens().await?;
        require_same_length(tokens.len(), amounts.len(), "pool tokens and amounts")?;

        let mut units = Vec::with_capacity(tokens.len());
        for (token, amount) in tokens.iter().zip(amounts) {
            units.push(self.handle.amount_to_units(*token, amount, None).await?);
        }
        Ok(units)
    }

    async fn check_controller(&self) -> Result<()> {
        require_role(self.get_controller().await? == self.handle.signer(), POOL_CONTROLLER)
    }
}

fn price_limit(max_price: Option<&str>) -> Result<U256> {
    match max_price {
        Some(p) => to_wei(p),
        None => Ok(U256::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use crate::contracts::abi::IERC20;
    use crate::testing::{addr, test_config, MockChain};
    use alloy_sol_types::{SolCall, SolValue};

    const FACTORY: u8 = 0xbf;
    const POOL: u8 = 0xb0;
    const DT: u8 = 0x20;
    const OCEAN: u8 = 0x0c;

    #[test]
    fn test_pairing_45_at_9() {
        let pairing = dt_pool_pairing("45", "9").unwrap();
        assert_eq!(pairing, PoolPairing { amount: "5".into(), weight: "1".into() });
    }

    #[test]
    fn test_pairing_other_splits() {
        assert_eq!(
            dt_pool_pairing("10", "5").unwrap(),
            PoolPairing { amount: "10".into(), weight: "5".into() }
        );
        assert_eq!(
            dt_pool_pairing("3", "1.5").unwrap(),
            PoolPairing { amount: "17".into(), weight: "8.5".into() }
        );
        // truncated, not rounded
        assert_eq!(dt_pool_pairing("1", "3").unwrap().amount, "2.333333333333333333");
    }

    #[test]
    fn test_pairing_rejects_bad_input() {
        for weight in ["0", "0.5", "9.5", "10"] {
            let err = dt_pool_pairing("45", weight).unwrap_err();
            assert!(matches!(err, SdkError::InvalidParameter(_)), "weight {weight}");
        }
        assert_err!(dt_pool_pairing("0", "5"));
        assert_err!(dt_pool_pairing("abc", "5"));
    }

    #[test]
    fn test_pairing_overflow_is_an_error() {
        let huge = format!("1{}", "0".repeat(55));
        let err = dt_pool_pairing(&huge, "1").unwrap_err();
        assert!(matches!(err, SdkError::InvalidParameter(_)));

        // large amounts that still fit pair exactly
        let big = format!("1{}", "0".repeat(40));
        let pairing = dt_pool_pairing(&big, "1").unwrap();
        assert_eq!(pairing.amount, format!("9{}", "0".repeat(40)));
    }

    fn seeded_chain() -> Arc<MockChain> {
        let chain = MockChain::new(addr(1));
        for token in [DT, OCEAN] {
            chain.on_call::<IERC20::decimalsCall>(addr(token), U256::from(18u8).abi_encode());
            chain.on_call::<IERC20::allowanceCall>(addr(token), U256::ZERO.abi_encode());
        }
        chain
    }

    #[tokio::test]
    async fn test_create_dt_pool_sends_setup_with_pairing() {
        let chain = seeded_chain();
        chain.emit(addr(FACTORY), &IBFactory::BPoolRegistered {
            bpoolAddress: addr(POOL),
            registeredBy: addr(1),
        });
        let factory = OceanPool::at(chain.clone(), addr(FACTORY), addr(OCEAN), &test_config());

        let pool = factory.create_dt_pool(addr(DT), "45", "9", "0.001").await.unwrap();
        assert_eq!(pool.address(), addr(POOL));

        let sends = chain.sends();
        assert_eq!(sends.len(), 4);
        assert_eq!(sends[0].to, addr(FACTORY));
        assert_eq!(sends[1].to, addr(DT));
        assert_eq!(sends[2].to, addr(OCEAN));

        let setup = IBPool::setupCall::abi_decode(&sends[3].data).unwrap();
        assert_eq!(sends[3].to, addr(POOL));
        assert_eq!(setup.dataTokenAmount, to_wei("45").unwrap());
        assert_eq!(setup.dataTokenWeight, to_wei("9").unwrap());
        assert_eq!(setup.baseTokenAmount, to_wei("5").unwrap());
        assert_eq!(setup.baseTokenWeight, to_wei("1").unwrap());
        assert_eq!(setup.swapFee, to_wei("0.001").unwrap());
    }

    #[tokio::test]
    async fn test_create_dt_pool_validates_before_sending() {
        let chain = seeded_chain();
        let factory = OceanPool::at(chain.clone(), addr(FACTORY), addr(OCEAN), &test_config());

        assert_err!(factory.create_dt_pool(addr(DT), "45", "10", "0.001").await);
        assert_err!(factory.create_dt_pool(addr(DT), "45", "9", "0.5").await);
        assert!(chain.ops().is_empty());
    }

    #[tokio::test]
    async fn test_controller_gates_admin() {
        let chain = seeded_chain();
        chain.on_call::<IBPool::getControllerCall>(addr(POOL), addr(2).abi_encode());
        let pool = WeightedPool::new(chain.clone(), addr(POOL), &test_config());

        let err = pool.finalize().await.unwrap_err();
        assert_eq!(err.to_string(), "caller is not Pool Controller");
        assert_err!(pool.bind(addr(DT), "1", "5").await);
        assert_err!(pool.set_swap_fee("0.01").await);
        assert!(chain.only_reads());
        assert_eq!(chain.estimates(), 0);
    }

    #[tokio::test]
    async fn test_finalize_once() {
        let chain = seeded_chain();
        chain.on_call::<IBPool::getControllerCall>(addr(POOL), addr(1).abi_encode());
        chain.on_call::<IBPool::isFinalizedCall>(addr(POOL), true.abi_encode());
        let pool = WeightedPool::new(chain.clone(), addr(POOL), &test_config());
        assert_err!(pool.finalize().await);

        chain.on_call::<IBPool::isFinalizedCall>(addr(POOL), false.abi_encode());
        assert_ok!(pool.finalize().await);
    }

    #[tokio::test]
    async fn test_swap_without_price_limit() {
        let chain = seeded_chain();
        let pool = WeightedPool::new(chain.clone(), addr(POOL), &test_config());

        let tx = pool
            .swap_exact_amount_in(addr(OCEAN), "1", addr(DT), "0.5", None)
            .await
            .unwrap();
        let call = IBPool::swapExactAmountInCall::abi_decode(&tx.request().data).unwrap();
        assert_eq!(call.maxPrice, U256::MAX);
        assert_eq!(call.minAmountOut, to_wei("0.5").unwrap());
    }

    #[tokio::test]
    async fn test_join_pool_matches_final_tokens() {
        let chain = seeded_chain();
        chain.on_call::<IBPool::getFinalTokensCall>(addr(POOL), vec![addr(DT), addr(OCEAN)].abi_encode());
        let pool = WeightedPool::new(chain.clone(), addr(POOL), &test_config());

        assert_err!(pool.join_pool("1", &["10".into()]).await);
        let tx = pool.join_pool("1", &["10".into(), "2".into()]).await.unwrap();
        let call = IBPool::joinPoolCall::abi_decode(&tx.request().data).unwrap();
        assert_eq!(call.maxAmountsIn, vec![to_wei("10").unwrap(), to_wei("2").unwrap()]);
    }

    #[tokio::test]
    async fn test_spot_price_readers() {
        let chain = seeded_chain();
        chain.on_call::<IBPool::getSpotPriceCall>(addr(POOL), to_wei("0.1111").unwrap().abi_encode());
        let pool = WeightedPool::new(chain.clone(), addr(POOL), &test_config());
        assert_eq!(pool.get_spot_price(addr(OCEAN), addr(DT)).await.unwrap(), "0.1111");
    }
}
