//! Fixed-rate exchange
//!
//! Swaps a base token for datatokens at an owner-set rate. Amounts are
//! converted with the datatoken/base-token decimals recorded on the
//! exchange itself; rates and fee fractions are 18-decimal.

use alloy_primitives::{Address, B256, U256};
use std::sync::Arc;

use super::abi::IFixedRateExchange;
use super::{require_role, ContractHandle, PreparedTx};
use crate::chain::ChainClient;
use crate::config::NetworkConfig;
use crate::error::{Result, SdkError};
use crate::units::{self, from_wei, to_wei};

const EXCHANGE_OWNER: &str = "Exchange Owner";
const MARKET_FEE_COLLECTOR: &str = "Market Fee Collector";

/// Exchange state with amounts converted to human-readable strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPriceExchange {
    pub exchange_id: B256,
    pub exchange_owner: Address,
    pub datatoken: Address,
    pub dt_decimals: u8,
    pub base_token: Address,
    pub bt_decimals: u8,
    pub fixed_rate: String,
    pub active: bool,
    pub dt_supply: String,
    pub bt_supply: String,
    pub dt_balance: String,
    pub bt_balance: String,
    pub with_mint: bool,
    pub allowed_swapper: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeesInfo {
    pub market_fee: String,
    pub market_fee_collector: Address,
    pub opc_fee: String,
    pub market_fee_available: String,
    pub ocean_fee_available: String,
}

/// Base-token cost of a swap and the fees inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceAndFees {
    pub base_token_amount: String,
    pub ocean_fee_amount: String,
    pub publish_market_fee_amount: String,
    pub consume_market_fee_amount: String,
}

#[derive(Debug)]
pub struct FixedRateExchange<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> FixedRateExchange<C> {
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.fixed_rate_exchange_address, "FixedPrice")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    // ============================================
    // SWAPS
    // ============================================

    /// Buy `datatoken_amount` paying at most `max_base_token_amount`
    pub async fn buy_datatokens(
        &self,
        exchange_id: B256,
        datatoken_amount: &str,
        max_base_token_amount: &str,
        consume_market_address: Option<Address>,
        consume_market_fee: &str,
    ) -> Result<PreparedTx<C>> {
        let exchange = self.get_exchange(exchange_id).await?;
        Ok(self.handle.prepare(IFixedRateExchange::buyDTCall {
            exchangeId: exchange_id,
            datatokenAmount: units::amount_to_units(datatoken_amount, exchange.dt_decimals)?,
            maxBaseTokenAmount: units::amount_to_units(max_base_token_amount, exchange.bt_decimals)?,
            consumeMarketAddress: consume_market_address.unwrap_or(Address::ZERO),
            consumeMarketSwapFeeAmount: to_wei(consume_market_fee)?,
        }))
    }

    /// Sell `datatoken_amount` receiving at least `min_base_token_amount`
    pub async fn sell_datatokens(
        &self,
        exchange_id: B256,
        datatoken_amount: &str,
        min_base_token_amount: &str,
        consume_market_address: Option<Address>,
        consume_market_fee: &str,
    ) -> Result<PreparedTx<C>> {
        let exchange = self.get_exchange(exchange_id).await?;
        Ok(self.handle.prepare(IFixedRateExchange::sellDTCall {
            exchangeId: exchange_id,
            datatokenAmount: units::amount_to_units(datatoken_amount, exchange.dt_decimals)?,
            minBaseTokenAmount: units::amount_to_units(min_base_token_amount, exchange.bt_decimals)?,
            consumeMarketAddress: consume_market_address.unwrap_or(Address::ZERO),
            consumeMarketSwapFeeAmount: to_wei(consume_market_fee)?,
        }))
    }

    // ============================================
    // OWNER OPERATIONS
    // ============================================

    pub async fn set_rate(&self, exchange_id: B256, new_rate: &str) -> Result<PreparedTx<C>> {
        self.check_owner(exchange_id).await?;
        Ok(self.handle.prepare(IFixedRateExchange::setRateCall {
            exchangeId: exchange_id,
            newRate: to_wei(new_rate)?,
        }))
    }

    pub async fn set_allowed_swapper(
        &self,
        exchange_id: B256,
        swapper: Option<Address>,
    ) -> Result<PreparedTx<C>> {
        self.check_owner(exchange_id).await?;
        Ok(self.handle.prepare(IFixedRateExchange::setAllowedSwapperCall {
            exchangeId: exchange_id,
            newAllowedSwapper: swapper.unwrap_or(Address::ZERO),
        }))
    }

    pub async fn activate(&self, exchange_id: B256) -> Result<PreparedTx<C>> {
        let exchange = self.check_owner(exchange_id).await?;
        if exchange.active {
            return Err(SdkError::invalid("exchange is already active"));
        }
        Ok(self.handle.prepare(IFixedRateExchange::toggleExchangeStateCall { exchangeId: exchange_id }))
    }

    pub async fn deactivate(&self, exchange_id: B256) -> Result<PreparedTx<C>> {
        let exchange = self.check_owner(exchange_id).await?;
        if !exchange.active {
            return Err(SdkError::invalid("exchange is already inactive"));
        }
        Ok(self.handle.prepare(IFixedRateExchange::toggleExchangeStateCall { exchangeId: exchange_id }))
    }

    pub async fn activate_mint(&self, exchange_id: B256) -> Result<PreparedTx<C>> {
        let exchange = self.check_owner(exchange_id).await?;
        if exchange.with_mint {
            return Err(SdkError::invalid("exchange already mints on demand"));
        }
        Ok(self.handle.prepare(IFixedRateExchange::toggleMintStateCall {
            exchangeId: exchange_id,
            withMint: true,
        }))
    }

    pub async fn deactivate_mint(&self, exchange_id: B256) -> Result<PreparedTx<C>> {
        let exchange = self.check_owner(exchange_id).await?;
        if !exchange.with_mint {
            return Err(SdkError::invalid("exchange does not mint on demand"));
        }
        Ok(self.handle.prepare(IFixedRateExchange::toggleMintStateCall {
            exchangeId: exchange_id,
            withMint: false,
        }))
    }

    /// Move collected base tokens to the exchange owner
    pub async fn collect_base_token(&self, exchange_id: B256, amount: &str) -> Result<PreparedTx<C>> {
        let exchange = self.get_exchange(exchange_id).await?;
        Ok(self.handle.prepare(IFixedRateExchange::collectBTCall {
            exchangeId: exchange_id,
            amount: units::amount_to_units(amount, exchange.bt_decimals)?,
        }))
    }

    pub async fn collect_datatokens(&self, exchange_id: B256, amount: &str) -> Result<PreparedTx<C>> {
        let exchange = self.get_exchange(exchange_id).await?;
        Ok(self.handle.prepare(IFixedRateExchange::collectDTCall {
            exchangeId: exchange_id,
            amount: units::amount_to_units(amount, exchange.dt_decimals)?,
        }))
    }

    pub fn collect_market_fee(&self, exchange_id: B256) -> PreparedTx<C> {
        self.handle.prepare(IFixedRateExchange::collectMarketFeeCall { exchangeId: exchange_id })
    }

    pub fn collect_ocean_fee(&self, exchange_id: B256) -> PreparedTx<C> {
        self.handle.prepare(IFixedRateExchange::collectOceanFeeCall { exchangeId: exchange_id })
    }

    pub async fn update_market_fee(&self, exchange_id: B256, new_fee: &str) -> Result<PreparedTx<C>> {
        self.check_fee_collector(exchange_id).await?;
        Ok(self.handle.prepare(IFixedRateExchange::updateMarketFeeCall {
            exchangeId: exchange_id,
            newMarketFee: to_wei(new_fee)?,
        }))
    }

    pub async fn update_market_fee_collector(
        &self,
        exchange_id: B256,
        new_collector: Address,
    ) -> Result<PreparedTx<C>> {
        self.check_fee_collector(exchange_id).await?;
        Ok(self.handle.prepare(IFixedRateExchange::updateMarketFeeCollectorCall {
            exchangeId: exchange_id,
            newMarketCollector: new_collector,
        }))
    }

    // ============================================
    // READERS
    // ============================================

    pub async fn get_number_of_exchanges(&self) -> Result<u64> {
        let n = self.handle.read(IFixedRateExchange::getNumberOfExchangesCall {}).await?;
        Ok(n.saturating_to())
    }

    /// Base tokens per datatoken
    pub async fn get_rate(&self, exchange_id: B256) -> Result<String> {
        let rate = self
            .handle
            .read(IFixedRateExchange::getRateCall { exchangeId: exchange_id })
            .await?;
        Ok(from_wei(rate))
    }

    pub async fn get_datatoken_supply(&self, exchange_id: B256) -> Result<String> {
        let exchange = self.get_exchange(exchange_id).await?;
        let supply = self
            .handle
            .read(IFixedRateExchange::getDTSupplyCall { exchangeId: exchange_id })
            .await?;
        Ok(units::units_to_amount(supply, exchange.dt_decimals))
    }

    pub async fn get_base_token_supply(&self, exchange_id: B256) -> Result<String> {
        let exchange = self.get_exchange(exchange_id).await?;
        let supply = self
            .handle
            .read(IFixedRateExchange::getBTSupplyCall { exchangeId: exchange_id })
            .await?;
        Ok(units::units_to_amount(supply, exchange.bt_decimals))
    }

    pub async fn get_allowed_swapper(&self, exchange_id: B256) -> Result<Address> {
        self.handle
            .read(IFixedRateExchange::getAllowedSwapperCall { exchangeId: exchange_id })
            .await
    }

    /// Base tokens needed to buy `datatoken_amount`, fees included
    pub async fn calc_base_in_given_datatokens_out(
        &self,
        exchange_id: B256,
        datatoken_amount: &str,
        consume_market_fee: &str,
    ) -> Result<PriceAndFees> {
        let exchange = self.get_exchange(exchange_id).await?;
        let r = self
            .handle
            .read(IFixedRateExchange::calcBaseInGivenOutDTCall {
                exchangeId: exchange_id,
                datatokenAmount: units::amount_to_units(datatoken_amount, exchange.dt_decimals)?,
                consumeMarketSwapFeeAmount: to_wei(consume_market_fee)?,
            })
            .await?;

        let bt = |v: U256| units::units_to_amount(v, exchange.bt_decimals);
        Ok(PriceAndFees {
            base_token_amount: bt(r.baseTokenAmount),
            ocean_fee_amount: bt(r.oceanFeeAmount),
            publish_market_fee_amount: bt(r.publishMarketFeeAmount),
            consume_market_fee_amount: bt(r.consumeMarketFeeAmount),
        })
    }

    /// Base tokens received for selling `datatoken_amount`
    pub async fn get_amount_base_out(
        &self,
        exchange_id: B256,
        datatoken_amount: &str,
        consume_market_fee: &str,
    ) -> Result<String> {
        let exchange = self.get_exchange(exchange_id).await?;
        let r = self
            .handle
            .read(IFixedRateExchange::calcBaseOutGivenInDTCall {
                exchangeId: exchange_id,
                datatokenAmount: units::amount_to_units(datatoken_amount, exchange.dt_decimals)?,
                consumeMarketSwapFeeAmount: to_wei(consume_market_fee)?,
            })
            .await?;
        Ok(units::units_to_amount(r.baseTokenAmount, exchange.bt_decimals))
    }

    pub async fn get_exchange(&self, exchange_id: B256) -> Result<FixedPriceExchange> {
        let e = self
            .handle
            .read(IFixedRateExchange::getExchangeCall { exchangeId: exchange_id })
            .await?;

        let dt_decimals: u8 = e.dtDecimals.saturating_to();
        let bt_decimals: u8 = e.btDecimals.saturating_to();
        Ok(FixedPriceExchange {
            exchange_id,
            exchange_owner: e.exchangeOwner,
            datatoken: e.datatoken,
            dt_decimals,
            base_token: e.baseToken,
            bt_decimals,
            fixed_rate: from_wei(e.fixedRate),
            active: e.active,
            dt_supply: units::units_to_amount(e.dtSupply, dt_decimals),
            bt_supply: units::units_to_amount(e.btSupply, bt_decimals),
            dt_balance: units::units_to_amount(e.dtBalance, dt_decimals),
            bt_balance: units::units_to_amount(e.btBalance, bt_decimals),
            with_mint: e.withMint,
            allowed_swapper: e.allowedSwapper,
        })
    }

    pub async fn get_fees_info(&self, exchange_id: B256) -> Result<FeesInfo> {
        let exchange = self.get_exchange(exchange_id).await?;
        let f = self
            .handle
            .read(IFixedRateExchange::getFeesInfoCall { exchangeId: exchange_id })
            .await?;
        Ok(FeesInfo {
            market_fee: from_wei(f.marketFee),
            market_fee_collector: f.marketFeeCollector,
            opc_fee: from_wei(f.opcFee),
            market_fee_available: units::units_to_amount(f.marketFeeAvailable, exchange.bt_decimals),
            ocean_fee_available: units::units_to_amount(f.oceanFeeAvailable, exchange.bt_decimals),
        })
    }

    pub async fn get_exchanges(&self) -> Result<Vec<B256>> {
        self.handle.read(IFixedRateExchange::getExchangesCall {}).await
    }

    pub async fn is_active(&self, exchange_id: B256) -> Result<bool> {
        self.handle
            .read(IFixedRateExchange::isActiveCall { exchangeId: exchange_id })
            .await
    }

    pub async fn get_router(&self) -> Result<Address> {
        self.handle.read(IFixedRateExchange::getRouterCall {}).await
    }

    pub async fn generate_exchange_id(&self, base_token: Address, datatoken: Address) -> Result<B256> {
        self.handle
            .read(IFixedRateExchange::generateExchangeIdCall { baseToken: base_token, datatoken })
            .await
    }

    // ============================================
    // CHECKS
    // ============================================

    async fn check_owner(&self, exchange_id: B256) -> Result<FixedPriceExchange> {
        let exchange = self.get_exchange(exchange_id).await?;
        require_role(exchange.exchange_owner == self.handle.signer(), EXCHANGE_OWNER)?;
        Ok(exchange)
    }

    async fn check_fee_collector(&self, exchange_id: B256) -> Result<()> {
        let fees = self
            .handle
            .read(IFixedRateExchange::getFeesInfoCall { exchangeId: exchange_id })
            .await?;
        require_role(fees.marketFeeCollector == self.handle.signer(), MARKET_FEE_COLLECTOR)
    }
}
