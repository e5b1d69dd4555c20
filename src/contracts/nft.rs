//! Data NFT (ERC721 template)
//!
//! Role checks mirror the template's access control: the owner manages
//! managers, managers grant the datatoken-deployer, metadata-updater and
//! store-updater roles.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use std::sync::Arc;

use super::abi::{IERC721Template, MetaDataAndTokenURI, MetaDataProof, NftRoles};
use super::params::DatatokenCreateParams;
use super::{require_role, ContractHandle, PreparedTx};
use crate::chain::ChainClient;
use crate::config::NetworkConfig;
use crate::ddo::{AssetDocument, METADATA_FLAG_PLAIN};
use crate::error::Result;
use crate::units::WEI_DECIMALS;

/// Every data NFT holds a single token with this id
pub const NFT_TOKEN_ID: u64 = 1;

const NFT_OWNER: &str = "NFT Owner";
const MANAGER: &str = "Manager";
const DATATOKEN_DEPLOYER: &str = "ERC20Deployer";
const METADATA_UPDATER: &str = "Metadata Updater";
const STORE_UPDATER: &str = "Store Updater";

/// Metadata state as stored on the NFT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftMetadata {
    pub decryptor_url: String,
    pub decryptor_address: String,
    pub state: u8,
    pub has_metadata: bool,
}

/// Arguments of `setMetaData`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub state: u8,
    pub decryptor_url: String,
    pub decryptor_address: String,
    pub flags: Bytes,
    pub data: Bytes,
    pub metadata_hash: B256,
    pub proofs: Vec<MetaDataProof>,
}

impl MetadataUpdate {
    /// Publish `doc` as plain JSON in the active state
    pub fn from_document(
        doc: &dyn AssetDocument,
        decryptor_url: impl Into<String>,
        decryptor_address: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            state: 0,
            decryptor_url: decryptor_url.into(),
            decryptor_address: decryptor_address.into(),
            flags: Bytes::from(vec![METADATA_FLAG_PLAIN]),
            data: doc.metadata_bytes()?,
            metadata_hash: doc.metadata_hash()?,
            proofs: Vec::new(),
        })
    }
}

#[derive(Debug)]
pub struct Nft<C> {
    handle: ContractHandle<C>,
}

impl<C: ChainClient> Nft<C> {
    pub fn new(chain: Arc<C>, address: Address, config: &NetworkConfig) -> Self {
        Self { handle: ContractHandle::new(chain, address, config) }
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    // ============================================
    // READERS
    // ============================================

    pub async fn get_owner(&self) -> Result<Address> {
        self.handle
            .read(IERC721Template::ownerOfCall { tokenId: U256::from(NFT_TOKEN_ID) })
            .await
    }

    pub async fn get_permissions(&self, user: Address) -> Result<NftRoles> {
        self.handle.read(IERC721Template::getPermissionsCall { user }).await
    }

    pub async fn get_metadata(&self) -> Result<NftMetadata> {
        let m = self.handle.read(IERC721Template::getMetaDataCall {}).await?;
        Ok(NftMetadata {
            decryptor_url: m.metaDataDecryptorUrl,
            decryptor_address: m.metaDataDecryptorAddress,
            state: m.metaDataState,
            has_metadata: m.hasMetaData,
        })
    }

    pub async fn is_datatoken_deployer(&self, user: Address) -> Result<bool> {
        Ok(self.get_permissions(user).await?.deployERC20)
    }

    pub async fn get_token_uri(&self, token_id: u64) -> Result<String> {
        self.handle
            .read(IERC721Template::tokenURICall { tokenId: U256::from(token_id) })
            .await
    }

    /// Datatokens deployed from this NFT
    pub async fn get_datatokens(&self) -> Result<Vec<Address>> {
        self.handle.read(IERC721Template::getTokensListCall {}).await
    }

    /// Value stored under `key` in the NFT's key-value store
    pub async fn get_data(&self, key: &str) -> Result<String> {
        let value = self
            .handle
            .read(IERC721Template::getDataCall { key: keccak256(key.as_bytes()) })
            .await?;
        Ok(String::from_utf8_lossy(&value).into_owned())
    }

    // ============================================
    // DATATOKENS
    // ============================================

    pub async fn create_datatoken(&self, params: &DatatokenCreateParams) -> Result<PreparedTx<C>> {
        require_role(self.is_datatoken_deployer(self.handle.signer()).await?, DATATOKEN_DEPLOYER)?;

        let fee_decimals = if params.fee_token == Address::ZERO {
            WEI_DECIMALS
        } else {
            self.handle.token_decimals(params.fee_token).await?
        };
        let data = params.to_abi(fee_decimals)?;

        Ok(self.handle.prepare(IERC721Template::createERC20Call {
            templateIndex: data.templateIndex,
            strings: data.strings,
            addresses: data.addresses,
            uints: data.uints,
            bytess: data.bytess,
        }))
    }

    // ============================================
    // ROLES
    // ============================================

    pub async fn add_manager(&self, manager: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        Ok(self.handle.prepare(IERC721Template::addManagerCall { manager }))
    }

    pub async fn remove_manager(&self, manager: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        Ok(self.handle.prepare(IERC721Template::removeManagerCall { manager }))
    }

    pub async fn add_datatoken_deployer(&self, user: Address) -> Result<PreparedTx<C>> {
        self.check_manager().await?;
        Ok(self.handle.prepare(IERC721Template::addToCreateERC20ListCall { user }))
    }

    /// Managers may remove anyone; deployers may remove themselves
    pub async fn remove_datatoken_deployer(&self, user: Address) -> Result<PreparedTx<C>> {
        let roles = self.get_permissions(self.handle.signer()).await?;
        let self_removal = user == self.handle.signer() && roles.deployERC20;
        require_role(roles.manager || self_removal, MANAGER)?;
        Ok(self.handle.prepare(IERC721Template::removeFromCreateERC20ListCall { user }))
    }

    pub async fn add_metadata_updater(&self, user: Address) -> Result<PreparedTx<C>> {
        self.check_manager().await?;
        Ok(self.handle.prepare(IERC721Template::addToMetadataListCall { user }))
    }

    pub async fn remove_metadata_updater(&self, user: Address) -> Result<PreparedTx<C>> {
        let roles = self.get_permissions(self.handle.signer()).await?;
        let self_removal = user == self.handle.signer() && roles.updateMetadata;
        require_role(roles.manager || self_removal, MANAGER)?;
        Ok(self.handle.prepare(IERC721Template::removeFromMetadataListCall { user }))
    }

    pub async fn add_store_updater(&self, user: Address) -> Result<PreparedTx<C>> {
        self.check_manager().await?;
        Ok(self.handle.prepare(IERC721Template::addTo725StoreListCall { user }))
    }

    pub async fn remove_store_updater(&self, user: Address) -> Result<PreparedTx<C>> {
        self.check_manager().await?;
        Ok(self.handle.prepare(IERC721Template::removeFrom725StoreListCall { user }))
    }

    /// Drop every role except the owner's
    pub async fn clean_permissions(&self) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        Ok(self.handle.prepare(IERC721Template::cleanPermissionsCall {}))
    }

    // ============================================
    // OWNERSHIP
    // ============================================

    pub async fn transfer_nft(&self, to: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        Ok(self.handle.prepare(IERC721Template::transferFromCall {
            from: self.handle.signer(),
            to,
            tokenId: U256::from(NFT_TOKEN_ID),
        }))
    }

    pub async fn safe_transfer_nft(&self, to: Address) -> Result<PreparedTx<C>> {
        self.check_owner().await?;
        Ok(self.handle.prepare(IERC721Template::safeTransferFromCall {
            from: self.handle.signer(),
            to,
            tokenId: U256::from(NFT_TOKEN_ID),
        }))
    }

    // ============================================
    // METADATA
    // ============================================

    pub async fn set_metadata(&self, update: MetadataUpdate) -> Result<PreparedTx<C>> {
        self.check_metadata_updater().await?;
        Ok(self.handle.prepare(IERC721Template::setMetaDataCall {
            metaDataState: update.state,
            metaDataDecryptorUrl: update.decryptor_url,
            metaDataDecryptorAddress: update.decryptor_address,
            flags: update.flags,
            data: update.data,
            metaDataHash: update.metadata_hash,
            metadataProofs: update.proofs,
        }))
    }

    pub async fn set_metadata_state(&self, state: u8) -> Result<PreparedTx<C>> {
        self.check_metadata_updater().await?;
        Ok(self.handle.prepare(IERC721Template::setMetaDataStateCall { metaDataState: state }))
    }

    pub async fn set_metadata_and_token_uri(
        &self,
        update: MetadataUpdate,
        token_uri: String,
    ) -> Result<PreparedTx<C>> {
        self.check_metadata_updater().await?;
        Ok(self.handle.prepare(IERC721Template::setMetaDataAndTokenURICall {
            metaDataAndTokenURI: MetaDataAndTokenURI {
                metaDataState: update.state,
                metaDataDecryptorUrl: update.decryptor_url,
                metaDataDecryptorAddress: update.decryptor_address,
                flags: update.flags,
                data: update.data,
                metaDataHash: update.metadata_hash,
                tokenId: U256::from(NFT_TOKEN_ID),
                tokenURI: token_uri,
                metadataProofs: update.proofs,
            },
        }))
    }

    pub async fn set_token_uri(&self, token_uri: String) -> Result<PreparedTx<C>> {
        self.check_metadata_updater().await?;
        Ok(self.handle.prepare(IERC721Template::setTokenURICall {
            tokenId: U256::from(NFT_TOKEN_ID),
            tokenURI: token_uri,
        }))
    }

    /// Store `value` under `keccak256(key)`
    pub async fn set_data(&self, key: &str, value: &str) -> Result<PreparedTx<C>> {
        require_role(self.get_permissions(self.handle.signer()).await?.store, STORE_UPDATER)?;
        Ok(self.handle.prepare(IERC721Template::setNewDataCall {
            key: keccak256(key.as_bytes()),
            value: Bytes::copy_from_slice(value.as_bytes()),
        }))
    }

    // ============================================
    // CHECKS
    // ============================================

    async fn check_owner(&self) -> Result<()> {
        require_role(self.get_owner().await? == self.handle.signer(), NFT_OWNER)
    }

    async fn check_manager(&self) -> Result<()> {
        require_role(self.get_permissions(self.handle.signer()).await?.manager, MANAGER)
    }

    async fn check_metadata_updater(&self) -> Result<()> {
        require_role(
            self.get_permissions(self.handle.signer()).await?.updateMetadata,
            METADATA_UPDATER,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addr, test_config, MockChain};
    use alloy_sol_types::{SolCall, SolValue};

    const NFT: u8 = 0x10;

    fn nft(chain: &Arc<MockChain>, owner: Address, roles: NftRoles) -> Nft<MockChain> {
        chain.on_call::<IERC721Template::ownerOfCall>(addr(NFT), owner.abi_encode());
        chain.on_call::<IERC721Template::getPermissionsCall>(
            addr(NFT),
            (roles.manager, roles.deployERC20, roles.updateMetadata, roles.store).abi_encode_params(),
        );
        Nft::new(chain.clone(), addr(NFT), &test_config())
    }

    fn roles(manager: bool, deploy: bool, metadata: bool, store: bool) -> NftRoles {
        NftRoles { manager, deployERC20: deploy, updateMetadata: metadata, store }
    }

    #[tokio::test]
    async fn test_owner_only_operations() {
        let chain = MockChain::new(addr(1));
        let nft = nft(&chain, addr(2), roles(true, true, true, true));

        for result in [
            nft.add_manager(addr(3)).await,
            nft.clean_permissions().await,
            nft.transfer_nft(addr(3)).await,
        ] {
            assert_eq!(result.unwrap_err().to_string(), "caller is not NFT Owner");
        }
        assert!(chain.only_reads());
    }

    #[tokio::test]
    async fn test_deployer_can_remove_itself() {
        let chain = MockChain::new(addr(1));
        let nft = nft(&chain, addr(2), roles(false, true, false, false));

        assert!(nft.remove_datatoken_deployer(addr(1)).await.is_ok());
        assert!(nft.remove_datatoken_deployer(addr(3)).await.is_err());
        assert!(nft.add_datatoken_deployer(addr(3)).await.is_err());
    }

    #[tokio::test]
    async fn test_create_datatoken_requires_deployer() {
        let chain = MockChain::new(addr(1));
        let nft = nft(&chain, addr(1), roles(true, false, false, false));
        let err = nft.create_datatoken(&DatatokenCreateParams::new(addr(1))).await.unwrap_err();
        assert_eq!(err.to_string(), "caller is not ERC20Deployer");
        assert_eq!(chain.estimates(), 0);

        let chain = MockChain::new(addr(1));
        let nft = self::nft(&chain, addr(1), roles(true, true, false, false));
        let tx = nft.create_datatoken(&DatatokenCreateParams::new(addr(1))).await.unwrap();
        assert_eq!(tx.request().selector(), Some(IERC721Template::createERC20Call::SELECTOR));
    }

    #[tokio::test]
    async fn test_set_data_hashes_key() {
        let chain = MockChain::new(addr(1));
        let nft = nft(&chain, addr(1), roles(false, false, false, true));

        let tx = nft.set_data("greeting", "hello").await.unwrap();
        let call = IERC721Template::setNewDataCall::abi_decode(&tx.request().data).unwrap();
        assert_eq!(call.key, keccak256(b"greeting"));
        assert_eq!(call.value.as_ref(), b"hello");

        assert!(nft.set_metadata_state(1).await.is_err());
    }

    #[tokio::test]
    async fn test_get_data_and_metadata() {
        let chain = MockChain::new(addr(1));
        let nft = nft(&chain, addr(1), roles(false, false, false, false));
        chain.on_call::<IERC721Template::getDataCall>(
            addr(NFT),
            Bytes::from_static(b"hello").abi_encode(),
        );
        chain.on_call::<IERC721Template::getMetaDataCall>(
            addr(NFT),
            ("http://provider".to_string(), "0xdec".to_string(), U256::ZERO, true).abi_encode_params(),
        );

        assert_eq!(nft.get_data("greeting").await.unwrap(), "hello");
        let metadata = nft.get_metadata().await.unwrap();
        assert_eq!(metadata.decryptor_url, "http://provider");
        assert!(metadata.has_metadata);
    }

    #[tokio::test]
    async fn test_publish_document_metadata() {
        use crate::ddo::DdoFactory;

        let chain = MockChain::new(addr(1));
        let nft = nft(&chain, addr(1), roles(false, false, true, false));
        let ddo = DdoFactory::create(serde_json::json!({
            "id": "did:op:00",
            "version": "4.1.0",
            "nftAddress": addr(NFT).to_string(),
            "chainId": 8996,
            "metadata": { "type": "dataset", "name": "rain" }
        }))
        .unwrap();

        let update = MetadataUpdate::from_document(ddo.as_document(), "http://provider", "0xdec").unwrap();
        assert_eq!(update.flags.as_ref(), &[0u8]);
        assert_eq!(update.metadata_hash, ddo.as_document().metadata_hash().unwrap());

        let tx = nft.set_metadata(update.clone()).await.unwrap();
        let call = IERC721Template::setMetaDataCall::abi_decode(&tx.request().data).unwrap();
        assert_eq!(call.data, update.data);
        assert_eq!(call.metaDataHash, update.metadata_hash);
    }
}
