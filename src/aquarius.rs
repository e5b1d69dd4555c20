//! Metadata cache (Aquarius) HTTP client
//!
//! Resolves published DDOs, validates documents before they go on chain,
//! runs search queries and waits for the indexer to pick up a transaction.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::ddo::{AssetDocument, DdoFactory, VersionedDdo};
use crate::error::{Result, SdkError};

// ============================================
// CONSTANTS
// ============================================

const API_PATH: &str = "/api/aquarius/assets";

/// Timeout for a single request
const REQUEST_TIMEOUT_SECS: u64 = 10;

const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
const DEFAULT_MAX_POLLS: u32 = 100;

// ============================================
// RESPONSE TYPES
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationProof {
    pub validator_address: String,
    pub r: Value,
    pub s: Value,
    pub v: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    /// Hash the validator signed, set when valid
    pub hash: Option<String>,
    pub proof: Option<ValidationProof>,
    /// Validator messages when invalid
    pub errors: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ValidationBody {
    hash: Option<String>,
    proof: Option<ValidationProof>,
}

/// How long to wait for the indexer
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

// ============================================
// CLIENT
// ============================================

pub struct Aquarius {
    http_client: Client,
    base_url: String,
}

impl Aquarius {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(http_client, base_url))
    }

    /// Use a preconfigured client (proxies, TLS, custom timeouts)
    pub fn with_client(http_client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http_client, base_url }
    }

    pub fn from_config(config: &NetworkConfig) -> Result<Self> {
        Self::new(config.metadata_cache_uri.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn ddo_url(&self, did: &str) -> String {
        format!("{}{}/ddo/{}", self.base_url, API_PATH, did)
    }

    fn validate_url(&self) -> String {
        format!("{}{}/ddo/validate", self.base_url, API_PATH)
    }

    fn query_url(&self) -> String {
        format!("{}{}/query", self.base_url, API_PATH)
    }

    /// Published document for `did`, `None` when the cache doesn't know it
    pub async fn resolve(&self, did: &str) -> Result<Option<VersionedDdo>> {
        let url = self.ddo_url(did);
        debug!("GET {}", url);

        let response = self.http_client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: Value = response.error_for_status()?.json().await?;
        DdoFactory::create(body).map(Some)
    }

    /// Ask the cache to validate a document before publishing it
    pub async fn validate(&self, ddo: &dyn AssetDocument) -> Result<ValidationResult> {
        let response = self
            .http_client
            .post(self.validate_url())
            .header("Content-Type", "application/octet-stream")
            .body(ddo.metadata_bytes()?.to_vec())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_validation(status, &body)
    }

    /// Run a search query and return the raw result
    pub async fn query(&self, query: &Value) -> Result<Value> {
        let response = self
            .http_client
            .post(self.query_url())
            .json(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Poll until `did` is indexed, and, when `tx` is given, until the
    /// indexed document reflects that transaction.
    ///
    /// `None` when the indexer didn't catch up within the poll budget.
    pub async fn wait_for_indexer(
        &self,
        did: &str,
        tx: Option<&str>,
        poll: PollSettings,
    ) -> Result<Option<VersionedDdo>> {
        for attempt in 1..=poll.max_polls {
            match self.fetch_raw(did).await {
                Ok(Some(body)) if indexed_tx_matches(&body, tx) => {
                    info!("📇 {} indexed after {} poll(s)", did, attempt);
                    return DdoFactory::create(body).map(Some);
                }
                Ok(_) => debug!("{} not indexed yet (poll {}/{})", did, attempt, poll.max_polls),
                Err(e) => warn!("Metadata cache poll failed: {}", e),
            }
            if attempt < poll.max_polls {
                tokio::time::sleep(poll.interval).await;
            }
        }
        warn!("{} was not indexed after {} polls", did, poll.max_polls);
        Ok(None)
    }

    async fn fetch_raw(&self, did: &str) -> Result<Option<Value>> {
        let response = self.http_client.get(self.ddo_url(did)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json().await?))
    }
}

fn parse_validation(status: StatusCode, body: &str) -> Result<ValidationResult> {
    if status.is_success() {
        let parsed: ValidationBody = serde_json::from_str(body)?;
        return Ok(ValidationResult {
            valid: true,
            hash: parsed.hash,
            proof: parsed.proof,
            errors: None,
        });
    }
    if status.is_client_error() {
        let errors = serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()));
        return Ok(ValidationResult { valid: false, hash: None, proof: None, errors: Some(errors) });
    }
    Err(SdkError::ContractCall {
        method: "validate",
        reason: format!("metadata cache returned {status}"),
    })
}

/// The indexer records the last transaction that touched an asset
fn indexed_tx_matches(body: &Value, tx: Option<&str>) -> bool {
    match tx {
        None => true,
        Some(tx) => body
            .pointer("/event/tx")
            .or_else(|| body.pointer("/credentialSubject/event/tx"))
            .and_then(Value::as_str)
            .is_some_and(|indexed| indexed.eq_ignore_ascii_case(tx)),
    }
}
