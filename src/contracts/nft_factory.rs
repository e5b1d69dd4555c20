//! NFT factory
//!
//! Deploys data NFTs (optionally with a datatoken and a pricing schema in
//! the same transaction), manages the template registries and batches
//! datatoken orders.

use alloy_primitives::{Address, B256, U256};
use std::sync::Arc;
use tracing::debug;

use super::abi::{IDispenser, IERC20Template, IERC721Factory, IERC721Template, Template};
use super::params::{
    DatatokenCreateParams, DispenserParams, FreCreationParams, NftCreateParams, TokenOrderParams,
};
use super::{require_non_zero, require_role, ContractHandle, PreparedTx};
use crate::chain::{ChainClient, TxReceipt};
use crate::config::NetworkConfig;
use crate::error::{Result, SdkError};
use crate::units::WEI_DECIMALS;

/// `startMultipleTokenOrder` rejects larger batches
pub const MAX_ORDERS_PER_BATCH: usize = 50;

const FACTORY_OWNER: &str = "Factory Owner";

/// Which template registry an index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Registry {
    Nft,
    Token,
}

#[derive(Debug)]
pub struct NftFactory<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> NftFactory<C> {
    /// The factory configured for this network
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.nft_factory_address, "ERC721Factory")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    // ============================================
    // READERS
    // ============================================

    pub async fn get_current_nft_count(&self) -> Result<u64> {
        let count = self.handle.read(IERC721Factory::getCurrentNFTCountCall {}).await?;
        Ok(count.saturating_to())
    }

    pub async fn get_current_token_count(&self) -> Result<u64> {
        let count = self.handle.read(IERC721Factory::getCurrentTokenCountCall {}).await?;
        Ok(count.saturating_to())
    }

    pub async fn get_current_nft_template_count(&self) -> Result<u64> {
        let count = self.handle.read(IERC721Factory::getCurrentNFTTemplateCountCall {}).await?;
        Ok(count.saturating_to())
    }

    pub async fn get_current_token_template_count(&self) -> Result<u64> {
        let count = self.handle.read(IERC721Factory::getCurrentTemplateCountCall {}).await?;
        Ok(count.saturating_to())
    }

    pub async fn get_owner(&self) -> Result<Address> {
        self.handle.read(IERC721Factory::ownerCall {}).await
    }

    pub async fn get_nft_template(&self, index: u64) -> Result<Template> {
        self.check_template_index(Registry::Nft, index).await?;
        self.handle
            .read(IERC721Factory::getNFTTemplateCall { index: U256::from(index) })
            .await
    }

    pub async fn get_token_template(&self, index: u64) -> Result<Template> {
        self.check_template_index(Registry::Token, index).await?;
        self.handle
            .read(IERC721Factory::getTokenTemplateCall { index: U256::from(index) })
            .await
    }

    /// True when the factory deployed this datatoken
    pub async fn check_datatoken(&self, datatoken: Address) -> Result<bool> {
        self.handle.read(IERC721Factory::erc20ListCall { datatoken }).await
    }

    /// The NFT's own address when the factory deployed it, zero otherwise
    pub async fn check_nft(&self, nft: Address) -> Result<Address> {
        self.handle.read(IERC721Factory::erc721ListCall { nft }).await
    }

    // ============================================
    // DEPLOYMENT
    // ============================================

    /// Deploy a bare data NFT
    pub async fn create_nft(&self, params: &NftCreateParams) -> Result<PreparedTx<C>> {
        self.check_active_template(Registry::Nft, params.template_index).await?;
        let (name, symbol) = params.resolved_names();
        debug!("Creating NFT {} ({}) from template {}", name, symbol, params.template_index);

        Ok(self.handle.prepare(IERC721Factory::deployERC721ContractCall {
            name,
            symbol,
            templateIndex: U256::from(params.template_index),
            additionalERC20Deployer: Address::ZERO,
            additionalMetaDataUpdater: Address::ZERO,
            tokenURI: params.token_uri.clone(),
            transferable: params.transferable,
            owner: params.owner,
        }))
    }

    pub async fn create_nft_with_datatoken(
        &self,
        nft: &NftCreateParams,
        datatoken: &DatatokenCreateParams,
    ) -> Result<PreparedTx<C>> {
        let erc = self.erc_create_data(datatoken).await?;
        Ok(self.handle.prepare(IERC721Factory::createNftWithErc20Call {
            nftCreateData: nft.to_abi(),
            ercCreateData: erc,
        }))
    }

    pub async fn create_nft_with_datatoken_with_fixed_rate(
        &self,
        nft: &NftCreateParams,
        datatoken: &DatatokenCreateParams,
        fixed_rate: &FreCreationParams,
    ) -> Result<PreparedTx<C>> {
        let erc = self.erc_create_data(datatoken).await?;
        Ok(self.handle.prepare(IERC721Factory::createNftWithErc20WithFixedRateCall {
            nftCreateData: nft.to_abi(),
            ercCreateData: erc,
            fixedData: fixed_rate.to_abi()?,
        }))
    }

    pub async fn create_nft_with_datatoken_with_dispenser(
        &self,
        nft: &NftCreateParams,
        datatoken: &DatatokenCreateParams,
        dispenser: &DispenserParams,
    ) -> Result<PreparedTx<C>> {
        let erc = self.erc_create_data(datatoken).await?;
        Ok(self.handle.prepare(IERC721Factory::createNftWithErc20WithDispenserCall {
            nftCreateData: nft.to_abi(),
            ercCreateData: erc,
            dispenserData: dispenser.to_abi()?,
        }))
    }

    /// Order several datatokens in one transaction
    pub fn start_multiple_token_order(&self, orders: &[TokenOrderParams]) -> Result<PreparedTx<C>> {
        if orders.len() > MAX_ORDERS_PER_BATCH {
            return Err(SdkError::invalid(format!(
                "too many orders: {} (max {MAX_ORDERS_PER_BATCH})",
                orders.len()
            )));
        }
        Ok(self.handle.prepare(IERC721Factory::startMultipleTokenOrderCall {
            orders: orders.iter().map(TokenOrderParams::to_abi).collect(),
        }))
    }

    // ============================================
    // TEMPLATE ADMINISTRATION
    // ============================================

    pub async fn add_nft_template(&self, template: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        require_non_zero(template, "template address")?;
        Ok(self.handle.prepare(IERC721Factory::add721TokenTemplateCall { templateAddress: template }))
    }

    pub async fn disable_nft_template(&self, index: u64) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        self.check_template_index(Registry::Nft, index).await?;
        Ok(self.handle.prepare(IERC721Factory::disable721TokenTemplateCall {
            templateIndex: U256::from(index),
        }))
    }

    pub async fn reactivate_nft_template(&self, index: u64) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        self.check_template_index(Registry::Nft, index).await?;
        Ok(self.handle.prepare(IERC721Factory::reactivate721TokenTemplateCall {
            templateIndex: U256::from(index),
        }))
    }

    pub async fn add_token_template(&self, template: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        require_non_zero(template, "template address")?;
        Ok(self.handle.prepare(IERC721Factory::addTokenTemplateCall { templateAddress: template }))
    }

    pub async fn disable_token_template(&self, index: u64) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        self.check_template_index(Registry::Token, index).await?;
        Ok(self.handle.prepare(IERC721Factory::disableTokenTemplateCall {
            templateIndex: U256::from(index),
        }))
    }

    pub async fn reactivate_token_template(&self, index: u64) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        self.check_template_index(Registry::Token, index).await?;
        Ok(self.handle.prepare(IERC721Factory::reactivateTokenTemplateCall {
            templateIndex: U256::from(index),
        }))
    }

    // ============================================
    // CHECKS
    // ============================================

    async fn check_owner(&self) -> Result<()> {
        let owner = self.get_owner().await?;
        require_role(owner == self.handle.signer(), FACTORY_OWNER)
    }

    async fn check_template_index(&self, registry: Registry, index: u64) -> Result<()> {
        if index == 0 {
            return Err(SdkError::invalid("template index cannot be zero"));
        }
        let count = match registry {
            Registry::Nft => self.get_current_nft_template_count().await?,
            Registry::Token => self.get_current_token_template_count().await?,
        };
        if index > count {
            return Err(SdkError::invalid(format!(
                "template index {index} does not exist ({count} registered)"
            )));
        }
        Ok(())
    }

    async fn check_active_template(&self, registry: Registry, index: u64) -> Result<()> {
        let template = match registry {
            Registry::Nft => self.get_nft_template(index).await?,
            Registry::Token => self.get_token_template(index).await?,
        };
        if !template.isActive {
            return Err(SdkError::invalid(format!("template {index} is not active")));
        }
        Ok(())
    }

    async fn erc_create_data(
        &self,
        params: &DatatokenCreateParams,
    ) -> Result<super::abi::ErcCreateData> {
        self.check_active_template(Registry::Token, params.template_index).await?;
        let fee_decimals = if params.fee_token == Address::ZERO {
            WEI_DECIMALS
        } else {
            self.handle.token_decimals(params.fee_token).await?
        };
        params.to_abi(fee_decimals)
    }
}

// ============================================
// RECEIPT PARSERS
// ============================================

/// Address of the NFT deployed by a factory transaction
pub fn created_nft(receipt: &TxReceipt) -> Result<Address> {
    Ok(receipt.require_event::<IERC721Factory::NFTCreated>()?.newTokenAddress)
}

/// Address of the datatoken deployed by a factory or NFT transaction
pub fn created_datatoken(receipt: &TxReceipt) -> Result<Address> {
    Ok(receipt.require_event::<IERC721Template::TokenCreated>()?.newTokenAddress)
}

/// Id of the fixed-rate exchange created alongside a datatoken
pub fn created_exchange_id(receipt: &TxReceipt) -> Result<B256> {
    Ok(receipt.require_event::<IERC20Template::NewFixedRate>()?.exchangeId)
}

/// Datatoken a dispenser was created for
pub fn created_dispenser(receipt: &TxReceipt) -> Result<Address> {
    Ok(receipt.require_event::<IDispenser::DispenserCreated>()?.datatokenAddress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addr, test_config, MockChain};
    use alloy_sol_types::{SolCall, SolValue};

    const FACTORY: u8 = 0xfa;

    fn factory(chain: &Arc<MockChain>, nft_templates: u64, active: bool) -> NftFactory<MockChain> {
        let at = addr(FACTORY);
        chain.on_call::<IERC721Factory::getCurrentNFTTemplateCountCall>(at, U256::from(nft_templates).abi_encode());
        chain.on_call::<IERC721Factory::getCurrentTemplateCountCall>(at, U256::from(2).abi_encode());
        chain.on_call::<IERC721Factory::getNFTTemplateCall>(at, (addr(0x71), active).abi_encode_params());
        chain.on_call::<IERC721Factory::getTokenTemplateCall>(at, (addr(0x72), true).abi_encode_params());
        chain.on_call::<IERC721Factory::ownerCall>(at, addr(0x0f).abi_encode());
        NftFactory::at(chain.clone(), at, &test_config())
    }

    #[tokio::test]
    async fn test_create_nft_checks_template() {
        let chain = MockChain::new(addr(1));
        let factory = factory(&chain, 1, true);

        let tx = factory.create_nft(&NftCreateParams::new(addr(1))).await.unwrap();
        assert_eq!(tx.request().selector(), Some(IERC721Factory::deployERC721ContractCall::SELECTOR));

        let mut params = NftCreateParams::new(addr(1));
        params.template_index = 0;
        assert!(factory.create_nft(&params).await.is_err());
        params.template_index = 2;
        assert!(matches!(factory.create_nft(&params).await, Err(SdkError::InvalidParameter(_))));
        assert!(chain.only_reads());
    }

    #[tokio::test]
    async fn test_inactive_template_rejected() {
        let chain = MockChain::new(addr(1));
        let factory = factory(&chain, 1, false);
        let err = factory.create_nft(&NftCreateParams::new(addr(1))).await.unwrap_err();
        assert!(err.to_string().contains("not active"));
        assert_eq!(chain.estimates(), 0);
    }

    #[tokio::test]
    async fn test_template_admin_requires_owner() {
        let chain = MockChain::new(addr(1));
        let factory = factory(&chain, 1, true);

        let err = factory.add_token_template(addr(3)).await.unwrap_err();
        assert_eq!(err.to_string(), "caller is not Factory Owner");
        assert!(chain.only_reads());

        let owner_chain = MockChain::new(addr(0x0f));
        let factory = self::factory(&owner_chain, 1, true);
        assert!(factory.add_token_template(Address::ZERO).await.is_err());
        assert!(factory.disable_token_template(3).await.is_err());
        assert!(factory.disable_token_template(2).await.is_ok());
    }

    #[tokio::test]
    async fn test_order_batch_limit() {
        let chain = MockChain::new(addr(1));
        let factory = factory(&chain, 1, true);
        let order = TokenOrderParams {
            token_address: addr(4),
            consumer: addr(1),
            service_index: 0,
            provider_fee: Default::default(),
            consume_market_fee: None,
        };

        assert!(factory.start_multiple_token_order(&vec![order.clone(); 50]).is_ok());
        assert!(factory.start_multiple_token_order(&vec![order; 51]).is_err());
    }

    #[tokio::test]
    async fn test_create_with_datatoken_and_parse_receipt() {
        let chain = MockChain::new(addr(1));
        let factory = factory(&chain, 1, true);
        chain.emit(addr(FACTORY), &IERC721Factory::NFTCreated {
            newTokenAddress: addr(0x10),
            templateAddress: addr(0x71),
            eventName: "NFT".into(),
            admin: addr(1),
            symbol: "NFT".into(),
            tokenURI: String::new(),
            transferable: true,
            creator: addr(1),
        });
        chain.emit(addr(0x10), &IERC721Template::TokenCreated {
            newTokenAddress: addr(0x20),
            templateAddress: addr(0x72),
            name: "DT".into(),
            symbol: "DT".into(),
            cap: U256::from(1),
            creator: addr(1),
        });

        let receipt = factory
            .create_nft_with_datatoken(&NftCreateParams::new(addr(1)), &DatatokenCreateParams::new(addr(1)))
            .await
            .unwrap()
            .send()
            .await
            .unwrap();

        assert_eq!(created_nft(&receipt).unwrap(), addr(0x10));
        assert_eq!(created_datatoken(&receipt).unwrap(), addr(0x20));
        assert!(matches!(created_exchange_id(&receipt), Err(SdkError::MissingEvent(_))));
    }
}
