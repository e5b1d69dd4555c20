//! DDO (asset metadata document) model
//!
//! Two non-convertible shapes exist, chosen by the exact `version` string:
//! - [`Ddo`]: flat document, versions 4.1.0, 4.3.0 and 4.5.0
//! - [`CredentialDdo`]: verifiable-credential envelope, version 5.0.0
//!
//! [`DdoFactory::create`] picks the shape; [`AssetDocument`] gives uniform
//! access to both.

mod model;
mod v4;
mod v5;

pub use model::{IndexedInfo, Metadata, Service};
pub use v4::Ddo;
pub use v5::{CredentialDdo, CredentialSubject};

use alloy_primitives::{Address, Bytes, B256};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, SdkError};

pub const DID_PREFIX: &str = "did:op:";

pub const LEGACY_VERSIONS: &[&str] = &["4.1.0", "4.3.0", "4.5.0"];
pub const CREDENTIAL_VERSIONS: &[&str] = &["5.0.0"];

/// `flags` byte for metadata stored as plain JSON
pub const METADATA_FLAG_PLAIN: u8 = 0;

// ============================================
// DID
// ============================================

/// `did:op:` + sha256 of the checksummed NFT address followed by the
/// decimal chain id
pub fn generate_did(nft_address: Address, chain_id: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(nft_address.to_checksum(None).as_bytes());
    hasher.update(chain_id.to_string().as_bytes());
    format!("{DID_PREFIX}{}", hex::encode(hasher.finalize()))
}

// ============================================
// DOCUMENT ACCESS
// ============================================

pub trait AssetDocument {
    fn did(&self) -> &str;
    fn version(&self) -> &str;
    fn nft_address_str(&self) -> &str;
    fn chain_id(&self) -> u64;
    fn metadata(&self) -> &Metadata;
    fn services(&self) -> &[Service];
    fn to_json(&self) -> Result<Value>;

    fn name(&self) -> &str {
        &self.metadata().name
    }

    fn nft_address(&self) -> Result<Address> {
        self.nft_address_str().parse().map_err(|_| {
            SdkError::invalid(format!("nftAddress {} is not an address", self.nft_address_str()))
        })
    }

    fn service(&self, id: &str) -> Option<&Service> {
        self.services().iter().find(|s| s.id == id)
    }

    /// The DID matches the one derived from the NFT address and chain id
    fn has_valid_did(&self) -> bool {
        match self.nft_address() {
            Ok(nft) => self.did() == generate_did(nft, self.chain_id()),
            Err(_) => false,
        }
    }

    /// Document bytes as stored on chain: compact UTF-8 JSON
    fn metadata_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(&self.to_json()?)?))
    }

    /// sha256 of [`AssetDocument::metadata_bytes`]
    fn metadata_hash(&self) -> Result<B256> {
        let bytes = self.metadata_bytes()?;
        Ok(B256::from_slice(&Sha256::digest(&bytes)))
    }
}

impl AssetDocument for Ddo {
    fn did(&self) -> &str {
        &self.id
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn nft_address_str(&self) -> &str {
        &self.nft_address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn services(&self) -> &[Service] {
        &self.services
    }

    fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl AssetDocument for CredentialDdo {
    fn did(&self) -> &str {
        &self.id
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn nft_address_str(&self) -> &str {
        &self.credential_subject.nft_address
    }

    fn chain_id(&self) -> u64 {
        self.credential_subject.chain_id
    }

    fn metadata(&self) -> &Metadata {
        &self.credential_subject.metadata
    }

    fn services(&self) -> &[Service] {
        &self.credential_subject.services
    }

    fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

// ============================================
// FACTORY
// ============================================

/// A document of either shape
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedDdo {
    Legacy(Ddo),
    Credential(CredentialDdo),
}

impl VersionedDdo {
    pub fn as_document(&self) -> &dyn AssetDocument {
        match self {
            VersionedDdo::Legacy(d) => d,
            VersionedDdo::Credential(d) => d,
        }
    }

    pub fn is_credential(&self) -> bool {
        matches!(self, VersionedDdo::Credential(_))
    }
}

pub struct DdoFactory;

impl DdoFactory {
    /// Build the shape matching `data["version"]`.
    ///
    /// Missing or unknown versions fail with `UnsupportedDdoVersion`.
    pub fn create(data: Value) -> Result<VersionedDdo> {
        let version = data
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| SdkError::UnsupportedDdoVersion("<missing>".to_string()))?
            .to_string();

        if LEGACY_VERSIONS.contains(&version.as_str()) {
            debug!("Parsing DDO {} as flat document", version);
            Ok(VersionedDdo::Legacy(serde_json::from_value(data)?))
        } else if CREDENTIAL_VERSIONS.contains(&version.as_str()) {
            debug!("Parsing DDO {} as credential document", version);
            Ok(VersionedDdo::Credential(serde_json::from_value(data)?))
        } else {
            Err(SdkError::UnsupportedDdoVersion(version))
        }
    }

    pub fn parse(json: &str) -> Result<VersionedDdo> {
        Self::create(serde_json::from_str(json)?)
    }
}
