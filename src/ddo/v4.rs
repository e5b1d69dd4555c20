//! Flat DDO shape (4.x)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{IndexedInfo, Metadata, Service};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ddo {
    #[serde(rename = "@context", default)]
    pub context: Vec<String>,
    pub id: String,
    pub version: String,
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
