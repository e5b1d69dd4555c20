//! ocean - command-line front end for the SDK
//!
//! Run with: cargo run -- <command>
//!
//! Offline commands (networks, config, units, pool-pairing, did, ddo) need no
//! node. `resolve` talks to the metadata cache, `mint` to the chain and
//! needs PRIVATE_KEY.

use alloy_primitives::{Address, U256};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocean_sdk::aquarius::Aquarius;
use ocean_sdk::chain::{AlloyChain, ChainClient};
use ocean_sdk::config::{supported_networks, ConfigHelper, NetworkConfig};
use ocean_sdk::contracts::datatoken::Datatoken;
use ocean_sdk::contracts::{TxMode, TxOutcome};
use ocean_sdk::ddo::{generate_did, AssetDocument, DdoFactory};
use ocean_sdk::gas::{estimate_fee_wei, wei_to_gwei, GasPolicy};
use ocean_sdk::pool::dt_pool_pairing;
use ocean_sdk::units;

#[derive(Parser)]
#[command(name = "ocean", version, about = "Data-exchange protocol client")]
struct Cli {
    /// Chain id or network name
    #[arg(long, short, global = true, default_value = "development")]
    network: String,

    /// Infura project id appended to infura node URLs
    #[arg(long, global = true, env = "INFURA_PROJECT_ID")]
    infura: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in networks
    Networks,
    /// Show the resolved config for --network
    Config,
    /// Convert between human amounts and base units
    Units {
        #[command(subcommand)]
        direction: UnitsCommand,
    },
    /// Base-token side of a new datatoken pool
    PoolPairing { amount: String, weight: String },
    /// Derive the DID of a data NFT
    Did {
        nft: Address,
        /// Defaults to the chain id of --network
        #[arg(long)]
        chain_id: Option<u64>,
    },
    /// Inspect a DDO file
    Ddo { path: PathBuf },
    /// Fetch a DDO from the metadata cache
    Resolve { did: String },
    /// Mint datatokens (requires the Minter role)
    Mint {
        datatoken: Address,
        amount: String,
        /// Recipient, defaults to the signer
        #[arg(long)]
        to: Option<Address>,
        /// Only estimate gas
        #[arg(long)]
        estimate_only: bool,
    },
}

#[derive(Subcommand)]
enum UnitsCommand {
    /// "1.5" -> base units
    ToUnits {
        amount: String,
        #[arg(default_value_t = units::WEI_DECIMALS)]
        decimals: u8,
    },
    /// base units -> "1.5"
    FromUnits {
        units: U256,
        #[arg(default_value_t = units::WEI_DECIMALS)]
        decimals: u8,
    },
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!("{}", style(" 🌊 OCEAN - data-exchange protocol client").cyan().bold());
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn resolve_config(cli: &Cli) -> Result<NetworkConfig> {
    let helper = ConfigHelper::from_env()?;
    let config = helper.get_config(cli.network.as_str(), cli.infura.as_deref())?;
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e.into());
    }
    Ok(config)
}

fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(120));
    Ok(bar)
}

fn native_symbol(config: &NetworkConfig) -> &'static str {
    match config.chain_id {
        137 | 80001 => "MATIC",
        56 => "BNB",
        246 => "EWT",
        1285 => "MOVR",
        23294 | 23295 => "ROSE",
        _ => "ETH",
    }
}

// ============================================
// COMMANDS
// ============================================

fn list_networks() {
    println!("{}", style(format!("{:<22} {:>10}  {}", "NETWORK", "CHAIN ID", "NODE")).bold());
    for network in supported_networks() {
        println!("{:<22} {:>10}  {}", network.network, network.chain_id, network.node_uri);
    }
}

fn inspect_ddo(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let ddo = DdoFactory::parse(&raw)?;
    let doc = ddo.as_document();

    let shape = if ddo.is_credential() { "credential" } else { "flat" };
    println!("  Version:   {} ({} shape)", doc.version(), shape);
    println!("  DID:       {}", doc.did());
    println!("  Name:      {}", doc.name());
    println!("  Chain id:  {}", doc.chain_id());
    println!("  NFT:       {}", doc.nft_address_str());
    println!("  Services:  {}", doc.services().len());
    for service in doc.services() {
        println!("    └─ {} [{}] {}", service.id, service.service_type, service.service_endpoint);
    }
    println!("  Hash:      {}", doc.metadata_hash()?);

    if doc.has_valid_did() {
        println!("  {}", style("✅ DID matches NFT address and chain id").green());
    } else {
        println!("  {}", style("❌ DID does not match NFT address and chain id").red());
    }
    Ok(())
}

async fn resolve_ddo(config: &NetworkConfig, did: &str) -> Result<()> {
    let aquarius = Aquarius::from_config(config)?;
    let bar = spinner(format!("Resolving {did} on {}", aquarius.base_url()))?;
    let ddo = aquarius.resolve(did).await;
    bar.finish_and_clear();

    match ddo? {
        Some(ddo) => {
            let doc = ddo.as_document();
            println!("{}", serde_json::to_string_pretty(&doc.to_json()?)?);
        }
        None => println!("{}", style(format!("{did} is not known to the metadata cache")).yellow()),
    }
    Ok(())
}

async fn mint(
    config: &NetworkConfig,
    datatoken: Address,
    amount: &str,
    to: Option<Address>,
    estimate_only: bool,
) -> Result<()> {
    let chain = Arc::new(AlloyChain::from_env(&config.node_uri, config.chain_id)?);
    let datatoken = Datatoken::connect(chain.clone(), datatoken, config).await?;
    let recipient = to.unwrap_or_else(|| datatoken.signer());

    let tx = datatoken.mint(recipient, amount).await?;
    let mode = if estimate_only { TxMode::EstimateOnly } else { TxMode::Send };

    let bar = spinner(format!("Minting {amount} to {recipient:?}"))?;
    let outcome = tx.execute(mode).await;
    bar.finish_and_clear();

    match outcome? {
        TxOutcome::Estimate(gas) => {
            let price = GasPolicy::for_network(config).gas_price(chain.gas_price().await?);
            let fee_gwei = wei_to_gwei(estimate_fee_wei(gas, price));
            info!("Estimated {} gas at {:.2} gwei", gas, wei_to_gwei(price));
            println!("  Gas estimate: {}", gas);
            println!("  Gas price:    {:.2} gwei", wei_to_gwei(price));
            println!("  Fee:          {:.6} {}", fee_gwei / 1e9, native_symbol(config));
        }
        TxOutcome::Receipt(receipt) => {
            println!(
                "  {} {:?} (block {:?}, gas {})",
                style("✅ Minted in").green(),
                receipt.transaction_hash,
                receipt.block_number,
                receipt.gas_used
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ocean_sdk=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Networks => list_networks(),
        Command::Config => {
            print_banner();
            resolve_config(&cli)?.print_summary();
        }
        Command::Units { direction } => match direction {
            UnitsCommand::ToUnits { amount, decimals } => {
                println!("{}", units::amount_to_units(amount, *decimals)?);
            }
            UnitsCommand::FromUnits { units: raw, decimals } => {
                println!("{}", units::units_to_amount(*raw, *decimals));
            }
        },
        Command::PoolPairing { amount, weight } => {
            let pairing = dt_pool_pairing(amount, weight)?;
            println!("  Datatoken:  {} @ weight {}", amount, weight);
            println!("  Base token: {} @ weight {}", pairing.amount, pairing.weight);
        }
        Command::Did { nft, chain_id } => {
            let chain_id = match chain_id {
                Some(id) => *id,
                None => resolve_config(&cli)?.chain_id,
            };
            println!("{}", generate_did(*nft, chain_id));
        }
        Command::Ddo { path } => inspect_ddo(path)?,
        Command::Resolve { did } => {
            let config = resolve_config(&cli)?;
            resolve_ddo(&config, did).await?;
        }
        Command::Mint { datatoken, amount, to, estimate_only } => {
            let config = resolve_config(&cli)?;
            if config.node_uri.is_empty() {
                return Err(eyre!("no node configured for {}", config.network));
            }
            mint(&config, *datatoken, amount, *to, *estimate_only).await?;
        }
    }

    Ok(())
}
