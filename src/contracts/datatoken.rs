//! Datatokens
//!
//! One wrapper for every deployed datatoken template. The template is read
//! from the contract's `getId()` and selects which extra operations are
//! available: order-and-buy in one step on the enterprise template,
//! allow/deny lists and the file object on the access-controlled one.

use alloy_primitives::{Address, Bytes, B256, U256};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::abi::{
    ConsumeMarketFee, DatatokenRoles, FixedRateInfo, FreParams, IERC20, IERC20Template,
    IERC20Template4, IERC20TemplateEnterprise, IERC721Template, OrderParams, ProviderFee,
};
use super::nft::NFT_TOKEN_ID;
use super::params::{DispenserParams, FreCreationParams, PublishingMarketFee};
use super::{require_role, ContractHandle, PreparedTx};
use crate::chain::ChainClient;
use crate::config::NetworkConfig;
use crate::error::{Result, SdkError};
use crate::units::{self, from_wei, to_wei, WEI_DECIMALS};

const MINTER: &str = "Minter";
const DATATOKEN_DEPLOYER: &str = "ERC20Deployer";
const NFT_OWNER: &str = "NFT Owner";
const FEE_MANAGER: &str = "Fee Manager, owner or ERC20 Deployer";
const MARKET_FEE_ADDRESS: &str = "the Publishing Market Fee Address";

// ============================================
// TEMPLATES
// ============================================

/// Deployed datatoken template, as reported by `getId()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatatokenTemplate {
    /// Template 1
    Standard,
    /// Template 2: buy-and-order in one transaction
    Enterprise,
    /// Template 4: allow/deny access lists
    AccessControlled,
}

impl DatatokenTemplate {
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(DatatokenTemplate::Standard),
            2 => Ok(DatatokenTemplate::Enterprise),
            4 => Ok(DatatokenTemplate::AccessControlled),
            other => Err(SdkError::invalid(format!("unknown datatoken template id {other}"))),
        }
    }

    pub fn id(self) -> u8 {
        match self {
            DatatokenTemplate::Standard => 1,
            DatatokenTemplate::Enterprise => 2,
            DatatokenTemplate::AccessControlled => 4,
        }
    }
}

impl fmt::Display for DatatokenTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatatokenTemplate::Standard => "standard",
            DatatokenTemplate::Enterprise => "enterprise",
            DatatokenTemplate::AccessControlled => "access-controlled",
        };
        write!(f, "{name} (template {})", self.id())
    }
}

// ============================================
// DATATOKEN
// ============================================

#[derive(Debug)]
pub struct Datatoken<C> {
    handle: ContractHandle<C>,
    template: DatatokenTemplate,
}

impl<C: ChainClient> Datatoken<C> {
    /// Bind to a datatoken, reading its template from the chain
    pub async fn connect(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Result<Self> {
        let handle = ContractHandle::new(chain, address, config);
        let id = handle.read(IERC20Template::getIdCall {}).await?;
        let template = DatatokenTemplate::from_id(id)?;
        debug!("Datatoken {:?} is {}", address, template);
        Ok(Self { handle, template })
    }

    /// Bind to a datatoken whose template is already known
    pub fn with_template(
        chain: Arc<C>,
        address: Address,
        config: &NetworkConfig,
        template: DatatokenTemplate,
    ) -> Self {
        Self { handle: ContractHandle::new(chain, address, config), template }
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    pub fn signer(&self) -> Address {
        self.handle.signer()
    }

    pub fn template(&self) -> DatatokenTemplate {
        self.template
    }

    // ============================================
    // READERS
    // ============================================

    pub async fn get_template_id(&self) -> Result<u8> {
        self.handle.read(IERC20Template::getIdCall {}).await
    }

    pub async fn get_decimals(&self) -> Result<u8> {
        self.handle.token_decimals(self.address()).await
    }

    pub async fn get_cap(&self) -> Result<String> {
        Ok(from_wei(self.handle.read(IERC20Template::capCall {}).await?))
    }

    pub async fn balance(&self, account: Address) -> Result<String> {
        Ok(from_wei(self.handle.read(IERC20::balanceOfCall { account }).await?))
    }

    pub async fn get_nft_address(&self) -> Result<Address> {
        self.handle.read(IERC20Template::getERC721AddressCall {}).await
    }

    pub async fn get_permissions(&self, user: Address) -> Result<DatatokenRoles> {
        self.handle.read(IERC20Template::getPermissionsCall { user }).await
    }

    pub async fn is_datatoken_deployer(&self, user: Address) -> Result<bool> {
        self.handle.read(IERC20Template::isERC20DeployerCall { user }).await
    }

    pub async fn get_payment_collector(&self) -> Result<Address> {
        self.handle.read(IERC20Template::getPaymentCollectorCall {}).await
    }

    pub async fn get_publishing_market_fee(&self) -> Result<PublishingMarketFee> {
        let fee = self.handle.read(IERC20Template::getPublishingMarketFeeCall {}).await?;
        Ok(PublishingMarketFee {
            fee_address: fee.publishMarketFeeAddress,
            fee_token: fee.publishMarketFeeToken,
            fee_amount: fee.publishMarketFeeAmount,
        })
    }

    pub async fn get_fixed_rates(&self) -> Result<Vec<FixedRateInfo>> {
        self.handle.read(IERC20Template::getFixedRatesCall {}).await
    }

    pub async fn get_dispensers(&self) -> Result<Vec<Address>> {
        self.handle.read(IERC20Template::getDispensersCall {}).await
    }

    pub async fn get_allow_list_contract(&self) -> Result<Address> {
        self.require_template(DatatokenTemplate::AccessControlled)?;
        self.handle.read(IERC20Template4::getAllowListContractCall {}).await
    }

    pub async fn get_deny_list_contract(&self) -> Result<Address> {
        self.require_template(DatatokenTemplate::AccessControlled)?;
        self.handle.read(IERC20Template4::getDenyListContractCall {}).await
    }

    // ============================================
    // PRICING SCHEMAS
    // ============================================

    pub async fn create_fixed_rate(&self, params: &FreCreationParams) -> Result<PreparedTx<C>> {
        self.check_deployer().await?;
        Ok(self.handle.prepare(IERC20Template::createFixedRateCall {
            fixedPriceAddress: params.fixed_rate_address,
            addresses: params.addresses(),
            uints: params.uints()?,
        }))
    }

    pub async fn create_dispenser(&self, params: &DispenserParams) -> Result<PreparedTx<C>> {
        self.check_deployer().await?;
        let data = params.to_abi()?;
        Ok(self.handle.prepare(IERC20Template::createDispenserCall {
            dispenser: data.dispenserAddress,
            maxTokens: data.maxTokens,
            maxBalance: data.maxBalance,
            withMint: data.withMint,
            allowedSwapper: data.allowedSwapper,
        }))
    }

    /// Store a value on the datatoken's NFT under the datatoken's key
    pub async fn set_data(&self, value: &str) -> Result<PreparedTx<C>> {
        self.check_deployer().await?;
        Ok(self.handle.prepare(IERC20Template::setDataCall {
            value: Bytes::copy_from_slice(value.as_bytes()),
        }))
    }

    // ============================================
    // SUPPLY
    // ============================================

    /// Mint `amount` datatokens to `to`; caller must be a minter and the
    /// amount must fit under the cap.
    pub async fn mint(&self, to: Address, amount: &str) -> Result<PreparedTx<C>> {
        let roles = self.get_permissions(self.signer()).await?;
        require_role(roles.minter, MINTER)?;

        let value = to_wei(amount)?;
        let cap = self.handle.read(IERC20Template::capCall {}).await?;
        if value > cap {
            return Err(SdkError::invalid(format!(
                "mint amount {amount} exceeds cap {}",
                from_wei(cap)
            )));
        }
        Ok(self.handle.prepare(IERC20Template::mintCall { account: to, value }))
    }

    pub fn transfer(&self, to: Address, amount: &str) -> Result<PreparedTx<C>> {
        Ok(self.handle.prepare(IERC20::transferCall { to, amount: to_wei(amount)? }))
    }

    pub fn approve(&self, spender: Address, amount: &str) -> Result<PreparedTx<C>> {
        Ok(self.handle.prepare(IERC20::approveCall { spender, amount: to_wei(amount)? }))
    }

    // ============================================
    // ROLES
    // ============================================

    pub async fn add_minter(&self, minter: Address) -> Result<PreparedTx<C>> {
        self.check_deployer().await?;
        Ok(self.handle.prepare(IERC20Template::addMinterCall { minter }))
    }

    pub async fn remove_minter(&self, minter: Address) -> Result<PreparedTx<C>> {
        self.check_deployer().await?;
        Ok(self.handle.prepare(IERC20Template::removeMinterCall { minter }))
    }

    pub async fn add_payment_manager(&self, manager: Address) -> Result<PreparedTx<C>> {
        self.check_deployer().await?;
        Ok(self.handle.prepare(IERC20Template::addPaymentManagerCall { paymentManager: manager }))
    }

    pub async fn remove_payment_manager(&self, manager: Address) -> Result<PreparedTx<C>> {
        self.check_deployer().await?;
        Ok(self.handle.prepare(IERC20Template::removePaymentManagerCall { paymentManager: manager }))
    }

    /// Payment managers, the NFT owner, NFT managers and datatoken deployers may set it
    pub async fn set_payment_collector(&self, collector: Address) -> Result<PreparedTx<C>> {
        let caller = self.signer();
        let mut allowed = self.get_permissions(caller).await?.paymentManager;

        if !allowed {
            let nft = self.handle.at(self.get_nft_address().await?);
            let owner = nft
                .read(IERC721Template::ownerOfCall { tokenId: U256::from(NFT_TOKEN_ID) })
                .await?;
            allowed = owner == caller;
            if !allowed {
                let roles = nft.read(IERC721Template::getPermissionsCall { user: caller }).await?;
                allowed = roles.manager || roles.deployERC20;
            }
        }
        require_role(allowed, FEE_MANAGER)?;

        Ok(self.handle.prepare(IERC20Template::setPaymentCollectorCall {
            paymentCollector: collector,
        }))
    }

    /// Drop minters, payment managers and the payment collector
    pub async fn clean_permissions(&self) -> Result<PreparedTx<C>> {
        let nft = self.handle.at(self.get_nft_address().await?);
        let owner = nft
            .read(IERC721Template::ownerOfCall { tokenId: U256::from(NFT_TOKEN_ID) })
            .await?;
        require_role(owner == self.signer(), NFT_OWNER)?;
        Ok(self.handle.prepare(IERC20Template::cleanPermissionsCall {}))
    }

    pub async fn set_publishing_market_fee(
        &self,
        fee_address: Address,
        fee_token: Address,
        fee_amount: &str,
    ) -> Result<PreparedTx<C>> {
        let current = self.get_publishing_market_fee().await?;
        require_role(current.fee_address == self.signer(), MARKET_FEE_ADDRESS)?;

        let decimals = if fee_token == Address::ZERO {
            WEI_DECIMALS
        } else {
            self.handle.token_decimals(fee_token).await?
        };
        Ok(self.handle.prepare(IERC20Template::setPublishingMarketFeeCall {
            publishMarketFeeAddress: fee_address,
            publishMarketFeeToken: fee_token,
            publishMarketFeeAmount: units::amount_to_units(fee_amount, decimals)?,
        }))
    }

    // ============================================
    // ORDERS
    // ============================================

    /// Start an order for `service_index`; no consume-market fee unless given
    pub fn start_order(
        &self,
        consumer: Address,
        service_index: u64,
        provider_fee: ProviderFee,
        consume_market_fee: Option<ConsumeMarketFee>,
    ) -> PreparedTx<C> {
        self.handle.prepare(IERC20Template::startOrderCall {
            consumer,
            serviceIndex: U256::from(service_index),
            providerFee: provider_fee,
            consumeMarketFee: consume_market_fee.unwrap_or_default(),
        })
    }

    /// Re-use a previous order with a fresh provider fee
    pub fn reuse_order(&self, order_tx_id: B256, provider_fee: ProviderFee) -> PreparedTx<C> {
        self.handle.prepare(IERC20Template::reuseOrderCall {
            orderTxId: order_tx_id,
            providerFee: provider_fee,
        })
    }

    pub fn buy_from_fre_and_order(
        &self,
        order: OrderParams,
        fre: FreParams,
    ) -> Result<PreparedTx<C>> {
        self.require_template(DatatokenTemplate::Enterprise)?;
        Ok(self.handle.prepare(IERC20TemplateEnterprise::buyFromFreAndOrderCall {
            orderParams: order,
            freParams: fre,
        }))
    }

    pub fn buy_from_dispenser_and_order(
        &self,
        order: OrderParams,
        dispenser: Address,
    ) -> Result<PreparedTx<C>> {
        self.require_template(DatatokenTemplate::Enterprise)?;
        Ok(self.handle.prepare(IERC20TemplateEnterprise::buyFromDispenserAndOrderCall {
            orderParams: order,
            dispenserContract: dispenser,
        }))
    }

    // ============================================
    // ACCESS LISTS
    // ============================================

    pub async fn set_allow_list_contract(&self, list: Address) -> Result<PreparedTx<C>> {
        self.require_template(DatatokenTemplate::AccessControlled)?;
        self.check_deployer().await?;
        Ok(self.handle.prepare(IERC20Template4::setAllowListContractCall { allowListContract: list }))
    }

    pub async fn set_deny_list_contract(&self, list: Address) -> Result<PreparedTx<C>> {
        self.require_template(DatatokenTemplate::AccessControlled)?;
        self.check_deployer().await?;
        Ok(self.handle.prepare(IERC20Template4::setDenyListContractCall { denyListContract: list }))
    }

    pub async fn set_file_object(&self, file_object: Bytes) -> Result<PreparedTx<C>> {
        self.require_template(DatatokenTemplate::AccessControlled)?;
        self.check_deployer().await?;
        Ok(self.handle.prepare(IERC20Template4::setFileObjectCall { fileObject: file_object }))
    }

    // ============================================
    // CHECKS
    // ============================================

    async fn check_deployer(&self) -> Result<()> {
        require_role(self.is_datatoken_deployer(self.signer()).await?, DATATOKEN_DEPLOYER)
    }

    fn require_template(&self, expected: DatatokenTemplate) -> Result<()> {
        if self.template != expected {
            return Err(SdkError::invalid(format!(
                "operation requires a {expected} datatoken, this one is {}",
                self.template
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addr, test_config, ChainOp, MockChain};
    use alloy_sol_types::{SolCall, SolValue};

    const DT: u8 = 0x20;
    const NFT: u8 = 0x10;

    fn datatoken(chain: &Arc<MockChain>, minter: bool, payment_manager: bool) -> Datatoken<MockChain> {
        let at = addr(DT);
        chain.on_call::<IERC20Template::getIdCall>(at, U256::from(1u8).abi_encode());
        chain.on_call::<IERC20Template::getPermissionsCall>(at, (minter, payment_manager).abi_encode_params());
        chain.on_call::<IERC20Template::capCall>(at, to_wei("1000").unwrap().abi_encode());
        chain.on_call::<IERC20Template::isERC20DeployerCall>(at, false.abi_encode());
        chain.on_call::<IERC20Template::getERC721AddressCall>(at, addr(NFT).abi_encode());
        Datatoken::with_template(chain.clone(), at, &test_config(), DatatokenTemplate::Standard)
    }

    #[test]
    fn test_template_ids() {
        assert_eq!(DatatokenTemplate::from_id(1).unwrap(), DatatokenTemplate::Standard);
        assert_eq!(DatatokenTemplate::from_id(2).unwrap(), DatatokenTemplate::Enterprise);
        assert_eq!(DatatokenTemplate::from_id(4).unwrap(), DatatokenTemplate::AccessControlled);
        assert!(DatatokenTemplate::from_id(3).is_err());
        assert_eq!(DatatokenTemplate::AccessControlled.id(), 4);
    }

    #[tokio::test]
    async fn test_connect_reads_template() {
        let chain = MockChain::new(addr(1));
        chain.on_call::<IERC20Template::getIdCall>(addr(DT), U256::from(2u8).abi_encode());
        let dt = Datatoken::connect(chain.clone(), addr(DT), &test_config()).await.unwrap();
        assert_eq!(dt.template(), DatatokenTemplate::Enterprise);

        chain.on_call::<IERC20Template::getIdCall>(addr(DT), U256::from(7u8).abi_encode());
        assert!(Datatoken::connect(chain.clone(), addr(DT), &test_config()).await.is_err());
    }

    #[tokio::test]
    async fn test_mint_as_non_minter_rejected() {
        let chain = MockChain::new(addr(1));
        let dt = datatoken(&chain, false, false);

        let err = dt.mint(addr(1), "10").await.unwrap_err();
        assert_eq!(err.to_string(), "caller is not Minter");
        assert!(err.is_local());

        // only the read-only permission check reached the chain
        assert_eq!(
            chain.ops(),
            vec![ChainOp::Call { to: addr(DT), selector: IERC20Template::getPermissionsCall::SELECTOR }]
        );
        assert_eq!(chain.estimates(), 0);
        assert!(chain.sends().is_empty());
    }

    #[tokio::test]
    async fn test_mint_sends_with_gas_multiplier() {
        let chain = MockChain::new(addr(1));
        let dt = datatoken(&chain, true, false);

        dt.mint(addr(3), "10").await.unwrap().send().await.unwrap();

        let sent = chain.sends();
        assert_eq!(sent.len(), 1);
        // 20 gwei reported * 1.05
        assert_eq!(sent[0].gas_price, Some(21_000_000_000));
        let call = IERC20Template::mintCall::abi_decode(&sent[0].data).unwrap();
        assert_eq!(call.account, addr(3));
        assert_eq!(call.value, to_wei("10").unwrap());
    }

    #[tokio::test]
    async fn test_mint_over_cap_rejected() {
        let chain = MockChain::new(addr(1));
        let dt = datatoken(&chain, true, false);
        assert!(matches!(dt.mint(addr(3), "1000.5").await, Err(SdkError::InvalidParameter(_))));
        assert!(chain.only_reads());
    }

    #[tokio::test]
    async fn test_payment_collector_falls_back_to_nft_roles() {
        let chain = MockChain::new(addr(1));
        let dt = datatoken(&chain, false, false);
        chain.on_call::<IERC721Template::ownerOfCall>(addr(NFT), addr(2).abi_encode());
        chain.on_call::<IERC721Template::getPermissionsCall>(
            addr(NFT),
            (false, true, false, false).abi_encode_params(),
        );
        assert!(dt.set_payment_collector(addr(5)).await.is_ok());

        chain.on_call::<IERC721Template::getPermissionsCall>(
            addr(NFT),
            (false, false, false, false).abi_encode_params(),
        );
        let err = dt.set_payment_collector(addr(5)).await.unwrap_err();
        assert!(matches!(err, SdkError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_deployer_gated_operations() {
        let chain = MockChain::new(addr(1));
        let dt = datatoken(&chain, true, true);
        assert!(dt.add_minter(addr(4)).await.is_err());
        assert!(dt.set_data("x").await.is_err());
        assert!(dt.create_dispenser(&DispenserParams::new(addr(9))).await.is_err());
        assert!(chain.only_reads());
    }

    #[tokio::test]
    async fn test_template_specific_operations() {
        let chain = MockChain::new(addr(1));
        let dt = datatoken(&chain, true, true);
        let order = OrderParams {
            consumer: addr(1),
            serviceIndex: U256::ZERO,
            providerFee: ProviderFee::default(),
            consumeMarketFee: ConsumeMarketFee::default(),
        };
        assert!(dt.buy_from_dispenser_and_order(order.clone(), addr(9)).is_err());
        assert!(dt.get_allow_list_contract().await.is_err());

        let enterprise = Datatoken::with_template(chain.clone(), addr(DT), &test_config(), DatatokenTemplate::Enterprise);
        let tx = enterprise.buy_from_dispenser_and_order(order, addr(9)).unwrap();
        assert_eq!(
            tx.request().selector(),
            Some(IERC20TemplateEnterprise::buyFromDispenserAndOrderCall::SELECTOR)
        );
    }

    #[tokio::test]
    async fn test_start_order_defaults_consume_fee() {
        let chain = MockChain::new(addr(1));
        let dt = datatoken(&chain, false, false);
        let tx = dt.start_order(addr(7), 0, ProviderFee::default(), None);
        let call = IERC20Template::startOrderCall::abi_decode(&tx.request().data).unwrap();
        assert_eq!(call.consumeMarketFee.consumeMarketFeeAddress, Address::ZERO);
        assert_eq!(call.consumeMarketFee.consumeMarketFeeAmount, U256::ZERO);
    }
}
