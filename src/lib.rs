//! Ocean SDK - client library for the data-exchange protocol contracts
//!
//! Resolve a [`config::NetworkConfig`], connect a [`chain::ChainClient`],
//! then drive the contracts through the wrappers in [`contracts`]:
//!
//! ```no_run
//! use std::sync::Arc;
//! use ocean_sdk::chain::AlloyChain;
//! use ocean_sdk::config::ConfigHelper;
//! use ocean_sdk::contracts::datatoken::Datatoken;
//!
//! # async fn run() -> ocean_sdk::Result<()> {
//! let config = ConfigHelper::from_env()?.get_config("development", None)?;
//! let chain = Arc::new(AlloyChain::from_env(&config.node_uri, config.chain_id)?);
//! let datatoken = Datatoken::connect(chain, "0x0000000000000000000000000000000000000001".parse().unwrap(), &config).await?;
//! let _receipt = datatoken.mint(datatoken.signer(), "10").await?.send().await?;
//! # Ok(())
//! # }
//! ```

pub mod aquarius;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod ddo;
pub mod error;
pub mod gas;
pub mod pool;
pub mod units;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, SdkError};
