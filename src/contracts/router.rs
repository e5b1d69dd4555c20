//! Factory router: batched purchases and protocol-fee administration

use alloy_primitives::{Address, B256, U256};
use std::sync::Arc;

use super::abi::{IFactoryRouter, Operation};
use super::{require_non_zero, require_role, ContractHandle, PreparedTx};
use crate::chain::ChainClient;
use crate::config::NetworkConfig;
use crate::error::{Result, SdkError};
use crate::units::{from_wei, to_wei};

const ROUTER_OWNER: &str = "Router Owner";

/// How the router executes one batched purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationKind {
    SwapExactIn = 0,
    SwapExactOut = 1,
    FixedRate = 2,
    Dispenser = 3,
}

/// One purchase in a `buyDTBatch`, amounts already in base units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOperation {
    pub exchange_id: B256,
    /// Pool, exchange or dispenser contract
    pub source: Address,
    pub kind: OperationKind,
    pub token_in: Address,
    pub amount_in: U256,
    pub token_out: Address,
    pub amount_out: U256,
    pub max_price: U256,
    pub swap_market_fee: U256,
    pub market_fee_address: Address,
}

impl BatchOperation {
    pub fn to_abi(&self) -> Operation {
        Operation {
            exchangeIds: self.exchange_id,
            source: self.source,
            operation: self.kind as u8,
            tokenIn: self.token_in,
            amountsIn: self.amount_in,
            tokenOut: self.token_out,
            amountsOut: self.amount_out,
            maxPrice: self.max_price,
            swapMarketFee: self.swap_market_fee,
            marketFeeAddress: self.market_fee_address,
        }
    }
}

/// Protocol community fees, as fractions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcFees {
    pub swap_ocean_fee: String,
    pub swap_non_ocean_fee: String,
}

#[derive(Debug)]
pub struct Router<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> Router<C> {
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.router_factory_address, "Router")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    /// Buy datatokens from several sources in one transaction
    pub fn buy_datatoken_batch(&self, operations: &[BatchOperation]) -> Result<PreparedTx<C>> {
        if operations.is_empty() {
            return Err(SdkError::invalid("batch has no operations"));
        }
        Ok(self.handle.prepare(IFactoryRouter::buyDTBatchCall {
            operations: operations.iter().map(BatchOperation::to_abi).collect(),
        }))
    }

    // ============================================
    // READERS
    // ============================================

    pub async fn is_approved_token(&self, token: Address) -> Result<bool> {
        self.handle.read(IFactoryRouter::isApprovedTokenCall { token }).await
    }

    pub async fn get_owner(&self) -> Result<Address> {
        self.handle.read(IFactoryRouter::routerOwnerCall {}).await
    }

    pub async fn get_nft_factory(&self) -> Result<Address> {
        self.handle.read(IFactoryRouter::factoryCall {}).await
    }

    pub async fn is_fixed_price(&self, contract: Address) -> Result<bool> {
        self.handle
            .read(IFactoryRouter::isFixedRateContractCall { contractAddress: contract })
            .await
    }

    pub async fn is_dispenser(&self, contract: Address) -> Result<bool> {
        self.handle
            .read(IFactoryRouter::isDispenserContractCall { contractAddress: contract })
            .await
    }

    /// Swap fee charged when `base_token` is the base token
    pub async fn get_opc_fee(&self, base_token: Address) -> Result<String> {
        let fee = self.handle.read(IFactoryRouter::getOPCFeeCall { baseToken: base_token }).await?;
        Ok(from_wei(fee))
    }

    pub async fn get_opc_fees(&self) -> Result<OpcFees> {
        let fees = self.handle.read(IFactoryRouter::getOPCFeesCall {}).await?;
        Ok(OpcFees {
            swap_ocean_fee: from_wei(fees.swapOceanFee),
            swap_non_ocean_fee: from_wei(fees.swapNonOceanFee),
        })
    }

    pub async fn get_opc_consume_fee(&self) -> Result<String> {
        Ok(from_wei(self.handle.read(IFactoryRouter::getOPCConsumeFeeCall {}).await?))
    }

    pub async fn get_opc_provider_fee(&self) -> Result<String> {
        Ok(from_wei(self.handle.read(IFactoryRouter::getOPCProviderFeeCall {}).await?))
    }

    // ============================================
    // OWNER ADMINISTRATION
    // ============================================

    pub async fn add_approved_token(&self, token: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        require_non_zero(token, "token")?;
        Ok(self.handle.prepare(IFactoryRouter::addApprovedTokenCall { token }))
    }

    pub async fn remove_approved_token(&self, token: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        Ok(self.handle.prepare(IFactoryRouter::removeApprovedTokenCall { token }))
    }

    pub async fn add_fixed_rate_contract(&self, fixed_rate: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        require_non_zero(fixed_rate, "fixed-rate contract")?;
        Ok(self.handle.prepare(IFactoryRouter::addFixedRateContractCall { fixedRate: fixed_rate }))
    }

    pub async fn remove_fixed_rate_contract(&self, fixed_rate: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        Ok(self.handle.prepare(IFactoryRouter::removeFixedRateContractCall { fixedRate: fixed_rate }))
    }

    pub async fn add_dispenser_contract(&self, dispenser: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        require_non_zero(dispenser, "dispenser contract")?;
        Ok(self.handle.prepare(IFactoryRouter::addDispenserContractCall { dispenser }))
    }

    pub async fn remove_dispenser_contract(&self, dispenser: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        Ok(self.handle.prepare(IFactoryRouter::removeDispenserContractCall { dispenser }))
    }

    /// Update the protocol fees; every value is a fraction such as "0.001"
    pub async fn update_opc_fee(
        &self,
        swap_ocean_fee: &str,
        swap_non_ocean_fee: &str,
        consume_fee: &str,
        provider_fee: &str,
    ) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        Ok(self.handle.prepare(IFactoryRouter::updateOPCFeeCall {
            newSwapOceanFee: to_wei(swap_ocean_fee)?,
            newSwapNonOceanFee: to_wei(swap_non_ocean_fee)?,
            newConsumeFee: to_wei(consume_fee)?,
            newProviderFee: to_wei(provider_fee)?,
        }))
    }

    async fn check_owner(&self) -> Result<()> {
        require_role(self.get_owner().await? == self.handle.signer(), ROUTER_OWNER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addr, test_config, MockChain};
    use alloy_sol_types::{SolCall, SolValue};

    const ROUTER: u8 = 0x7e;

    fn router(chain: &Arc<MockChain>, owner: Address) -> Router<MockChain> {
        chain.on_call::<IFactoryRouter::routerOwnerCall>(addr(ROUTER), owner.abi_encode());
        Router::at(chain.clone(), addr(ROUTER), &test_config())
    }

    #[tokio::test]
    async fn test_admin_requires_owner() {
        let chain = MockChain::new(addr(1));
        let r = router(&chain, addr(2));
        let err = r.update_opc_fee("0.001", "0.002", "0.03", "0").await.unwrap_err();
        assert_eq!(err.to_string(), "caller is not Router Owner");
        assert!(chain.only_reads());
    }

    #[tokio::test]
    async fn test_opc_fee_update_marshalling() {
        let chain = MockChain::new(addr(1));
        let r = router(&chain, addr(1));
        assert!(r.add_approved_token(Address::ZERO).await.is_err());

        let tx = r.update_opc_fee("0.001", "0.002", "0.03", "0").await.unwrap();
        let call = IFactoryRouter::updateOPCFeeCall::abi_decode(&tx.request().data).unwrap();
        assert_eq!(call.newSwapOceanFee, U256::from(1_000_000_000_000_000u64));
        assert_eq!(call.newProviderFee, U256::ZERO);
    }

    #[tokio::test]
    async fn test_batch_operation_kind() {
        let chain = MockChain::new(addr(1));
        let r = router(&chain, addr(1));
        assert!(r.buy_datatoken_batch(&[]).is_err());

        let op = BatchOperation {
            exchange_id: B256::repeat_byte(1),
            source: addr(0xfe),
            kind: OperationKind::FixedRate,
            token_in: addr(0x0c),
            amount_in: U256::from(1),
            token_out: addr(0x20),
            amount_out: U256::from(1),
            max_price: U256::from(1),
            swap_market_fee: U256::ZERO,
            market_fee_address: Address::ZERO,
        };
        let tx = r.buy_datatoken_batch(&[op]).unwrap();
        let call = IFactoryRouter::buyDTBatchCall::abi_decode(&tx.request().data).unwrap();
        assert_eq!(call.operations[0].operation, 2);
    }

    #[tokio::test]
    async fn test_opc_fees_reader() {
        let chain = MockChain::new(addr(1));
        chain.on_call::<IFactoryRouter::getOPCFeesCall>(
            addr(ROUTER),
            (to_wei("0.001").unwrap(), to_wei("0.002").unwrap()).abi_encode_params(),
        );
        let fees = router(&chain, addr(1)).get_opc_fees().await.unwrap();
        assert_eq!(fees.swap_ocean_fee, "0.001");
        assert_eq!(fees.swap_non_ocean_fee, "0.002");
    }
}
