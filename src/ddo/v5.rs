//! Verifiable-credential DDO shape (5.x)
//!
//! The asset description moves under `credentialSubject`; the envelope
//! carries the issuer and credential types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{IndexedInfo, Metadata, Service};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDdo {
    #[serde(rename = "@context", default)]
    pub context: Vec<String>,
    pub id: String,
    pub version: String,
    #[serde(rename = "type", default)]
    pub credential_type: Vec<String>,
    #[serde(default)]
    pub issuer: String,
    pub credential_subject: CredentialSubject,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_ddos: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    pub id: String,
    pub nft_address: String,
    pub chain_id: u64,
    pub metadata: Metadata,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Value>,
    #[serde(flatten)]
    pub indexed: IndexedInfo,
}
