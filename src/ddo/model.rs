//! Pieces shared by every DDO shape

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Descriptive metadata of an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// "dataset" or "algorithm"
    #[serde(rename = "type")]
    pub asset_type: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub license: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright_holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<Value>,
}

impl Metadata {
    pub fn is_algorithm(&self) -> bool {
        self.asset_type == "algorithm"
    }
}

/// One way to access the asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    /// "access" or "compute"
    #[serde(rename = "type")]
    pub service_type: String,
    /// Encrypted file object
    pub files: String,
    pub datatoken_address: String,
    pub service_endpoint: String,
    #[serde(default)]
    pub timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_parameters: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_information: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Value>,
}

impl Service {
    pub fn is_compute(&self) -> bool {
        self.service_type == "compute"
    }
}

/// Fields filled in by the indexer; kept opaque so they survive a round trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IndexedInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatokens: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purgatory: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
