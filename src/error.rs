//! Error types for the SDK
//!
//! Every wrapper returns [`SdkError`]. Local permission pre-checks fail with
//! [`SdkError::PermissionDenied`] before any gas estimation or submission,
//! argument problems with [`SdkError::InvalidParameter`], and anything the
//! node rejects surfaces as one of the network/contract variants.

use alloy_primitives::B256;
use alloy_transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// A read-only role check failed; nothing was estimated or sent
    #[error("caller is not {role}")]
    PermissionDenied { role: &'static str },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("{0} address is not configured for this network")]
    MissingAddress(&'static str),

    #[error("unsupported DDO version: {0}")]
    UnsupportedDdoVersion(String),

    #[error("{method} failed: {reason}")]
    ContractCall { method: &'static str, reason: String },

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("transaction {0} reverted")]
    Reverted(B256),

    #[error("event {0} not found in transaction receipt")]
    MissingEvent(&'static str),

    #[error(transparent)]
    Rpc(#[from] TransportError),

    #[error(transparent)]
    Abi(#[from] alloy_sol_types::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    TomlDecode(#[from] toml::de::Error),

    #[error(transparent)]
    TomlEncode(#[from] toml::ser::Error),
}

impl SdkError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SdkError::InvalidParameter(msg.into())
    }

    /// True when the failure happened before anything touched the network
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SdkError::PermissionDenied { .. }
                | SdkError::InvalidParameter(_)
                | SdkError::UnknownNetwork(_)
                | SdkError::MissingAddress(_)
                | SdkError::UnsupportedDdoVersion(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;
