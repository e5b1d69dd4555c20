//! Access lists: soulbound membership tokens gating datatoken use

use alloy_primitives::{Address, U256};
use std::sync::Arc;

use super::abi::{IAccessList, IAccessListFactory};
use super::{require_non_zero, require_role, require_same_length, ContractHandle, PreparedTx};
use crate::chain::{ChainClient, TxReceipt};
use crate::config::NetworkConfig;
use crate::error::Result;

const LIST_OWNER: &str = "Access List Owner";
const FACTORY_OWNER: &str = "Factory Owner";

// ============================================
// ACCESS LIST
// ============================================

#[derive(Debug)]
pub struct AccessList<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> AccessList<C> {
    pub fn new(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    pub async fn get_owner(&self) -> Result<Address> {
        self.handle.read(IAccessList::ownerCall {}).await
    }

    pub async fn get_name(&self) -> Result<String> {
        self.handle.read(IAccessList::nameCall {}).await
    }

    pub async fn get_symbol(&self) -> Result<String> {
        self.handle.read(IAccessList::symbolCall {}).await
    }

    pub async fn get_token_uri(&self, token_id: u64) -> Result<String> {
        self.handle
            .read(IAccessList::tokenURICall { tokenId: U256::from(token_id) })
            .await
    }

    /// Membership tokens held by `user`; non-zero means listed
    pub async fn balance(&self, user: Address) -> Result<u64> {
        let n = self.handle.read(IAccessList::balanceOfCall { user }).await?;
        Ok(n.saturating_to())
    }

    pub async fn mint(&self, user: Address, token_uri: &str) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        Ok(self.handle.prepare(IAccessList::mintCall {
            user,
            tokenURI: token_uri.to_string(),
        }))
    }

    pub async fn batch_mint(&self, users: &[Address], token_uris: &[String]) -> Result<PreparedTx<C>> {
        require_same_length(users.len(), token_uris.len(), "users and token URIs")?;
        self.check_owner().await?;
        Ok(self.handle.prepare(IAccessList::batchMintCall {
            user: users.to_vec(),
            tokenURI: token_uris.to_vec(),
        }))
    }

    pub fn burn(&self, token_id: u64) -> PreparedTx<C> {
        self.handle.prepare(IAccessList::burnCall { tokenId: U256::from(token_id) })
    }

    pub async fn transfer_ownership(&self, new_owner: Address) -> Result<PreparedTx<C>> {
        require_non_zero(new_owner, "new owner")?;
        self.check_owner().await?;
        Ok(self.handle.prepare(IAccessList::transferOwnershipCall { newOwner: new_owner }))
    }

    pub async fn renounce_ownership(&self) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        Ok(self.handle.prepare(IAccessList::renounceOwnershipCall {}))
    }

    async fn check_owner(&self) -> Result<()> {
        require_role(self.get_owner().await? == self.handle.signer(), LIST_OWNER)
    }
}

// ============================================
// FACTORY
// ============================================

#[derive(Debug)]
pub struct AccessListFactory<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> AccessListFactory<C> {
    pub fn new(chain: Arc<C>, config: &NetworkConfig) -> Result<Self> {
        let address = config.require(config.access_list_factory, "AccessListFactory")?;
        Ok(Self::at(chain, address, config))
    }

    pub fn at(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    /// Deploy a list with initial members
    pub fn deploy_access_list(
        &self,
        name: &str,
        symbol: &str,
        transferable: bool,
        owner: Address,
        users: &[Address],
        token_uris: &[String],
    ) -> Result<PreparedTx<C>> {
        require_same_length(users.len(), token_uris.len(), "users and token URIs")?;
        Ok(self.handle.prepare(IAccessListFactory::deployAccessListContractCall {
            name: name.to_string(),
            symbol: symbol.to_string(),
            transferable,
            owner,
            user: users.to_vec(),
            tokenURI: token_uris.to_vec(),
        }))
    }

    pub async fn is_deployed(&self, list: Address) -> Result<bool> {
        self.handle
            .read(IAccessListFactory::isDeployedCall { contractAddress: list })
            .await
    }

    pub async fn get_owner(&self) -> Result<Address> {
        self.handle.read(IAccessListFactory::ownerCall {}).await
    }

    pub async fn change_template_address(&self, template: Address) -> Result<PreparedTx<C>> {
        require_non_zero(template, "template address")?;
        require_role(self.get_owner().await? == self.handle.signer(), FACTORY_OWNER)?;
        Ok(self.handle.prepare(IAccessListFactory::changeTemplateAddressCall {
            newTemplate: template,
        }))
    }
}

/// Address of the list deployed by a factory transaction
pub fn created_access_list(receipt: &TxReceipt) -> Result<Address> {
    Ok(receipt.require_event::<IAccessListFactory::NewAccessList>()?.contractAddress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;
    use crate::testing::{addr, test_config, MockChain};
    use alloy_sol_types::SolValue;

    #[tokio::test]
    async fn test_batch_mint_lengths_and_owner() {
        let chain = MockChain::new(addr(1));
        chain.on_call::<IAccessList::ownerCall>(addr(0xa1), addr(1).abi_encode());
        let list = AccessList::new(chain.clone(), addr(0xa1), &test_config());

        let err = list.batch_mint(&[addr(2), addr(3)], &["a".into()]).await.unwrap_err();
        assert!(matches!(err, SdkError::InvalidParameter(_)));
        assert!(list.batch_mint(&[addr(2)], &["a".into()]).await.is_ok());
        assert!(list.transfer_ownership(Address::ZERO).await.is_err());

        chain.on_call::<IAccessList::ownerCall>(addr(0xa1), addr(9).abi_encode());
        assert_eq!(
            list.mint(addr(2), "uri").await.unwrap_err().to_string(),
            "caller is not Access List Owner"
        );
        assert_eq!(chain.estimates(), 0);
    }

    #[tokio::test]
    async fn test_deploy_and_parse_receipt() {
        let chain = MockChain::new(addr(1));
        chain.emit(addr(0xaf), &IAccessListFactory::NewAccessList {
            contractAddress: addr(0xa2),
            owner: addr(1),
        });
        let factory = AccessListFactory::at(chain.clone(), addr(0xaf), &test_config());

        assert!(factory
            .deploy_access_list("List", "AL", false, addr(1), &[addr(2)], &[])
            .is_err());

        let receipt = factory
            .deploy_access_list("List", "AL", false, addr(1), &[addr(2)], &["uri".into()])
            .unwrap()
            .send()
            .await
            .unwrap();
        assert_eq!(created_access_list(&receipt).unwrap(), addr(0xa2));
    }
}
