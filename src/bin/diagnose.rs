//! Diagnostic tool - Check the environment before using the CLI
//!
//! Run with: cargo run --bin diagnose [network]

use std::env;
use std::sync::Arc;

use ocean_sdk::chain::{parse_private_key, AlloyChain, ChainClient};
use ocean_sdk::config::{load_address_file, ConfigHelper};
use ocean_sdk::gas::{wei_to_gwei, GasPolicy};

fn mark(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}

fn section(title: &str) {
    println!("\n═══════════════════════════════════════════════════");
    println!("  {}", title);
    println!("═══════════════════════════════════════════════════\n");
}

#[tokio::main]
async fn main() {
    println!("🔍 OCEAN DIAGNOSTIC CHECK");

    let dotenv = dotenvy::dotenv().is_ok();
    let network = env::args().nth(1).unwrap_or_else(|| "development".to_string());

    section("ENVIRONMENT");
    println!("  .env file:      {}", mark(dotenv));
    for (key, desc) in [
        ("ADDRESS_FILE", "Deployed contract addresses"),
        ("AQUARIUS_URL", "Metadata cache override"),
        ("PROVIDER_URL", "Provider override"),
        ("INFURA_PROJECT_ID", "Infura node access"),
        ("PRIVATE_KEY", "Transaction signer"),
    ] {
        let set = env::var(key).map(|v| !v.is_empty()).unwrap_or(false);
        println!("  {:<18} {} {}", key, mark(set), if set { "" } else { "(not set)" });
        println!("    └─ {}\n", desc);
    }

    if let Ok(source) = env::var("ADDRESS_FILE") {
        match load_address_file(&source) {
            Ok(networks) => {
                let mut names: Vec<_> = networks.keys().cloned().collect();
                names.sort();
                println!("  Address file covers: {}", names.join(", "));
            }
            Err(e) => println!("  ❌ Address file unreadable: {}", e),
        }
    }

    if let Ok(key) = env::var("PRIVATE_KEY") {
        match parse_private_key(&key) {
            Ok(signer) => println!("  Signer: {:?}", signer.address()),
            Err(e) => println!("  ❌ {}", e),
        }
    }

    section(&format!("NETWORK: {}", network));
    let infura = env::var("INFURA_PROJECT_ID").ok();
    let config = match ConfigHelper::from_env()
        .and_then(|helper| helper.get_config(network.as_str(), infura.as_deref()))
    {
        Ok(config) => config,
        Err(e) => {
            println!("  ❌ {}", e);
            println!("\n❌ Diagnostic aborted\n");
            return;
        }
    };
    config.print_summary();

    section("NODE");
    let account = alloy_primitives::Address::ZERO;
    let chain = match AlloyChain::read_only(&config.node_uri, account) {
        Ok(chain) => Arc::new(chain),
        Err(e) => {
            println!("  ❌ {}", e);
            return;
        }
    };

    match chain.chain_id().await {
        Ok(id) if id == config.chain_id => println!("  Chain id:  ✅ {}", id),
        Ok(id) => println!("  Chain id:  ❌ node reports {}, config expects {}", id, config.chain_id),
        Err(e) => println!("  Chain id:  ❌ {}", e),
    }
    match chain.gas_price().await {
        Ok(reported) => {
            let submitted = GasPolicy::for_network(&config).gas_price(reported);
            println!("  Gas price: {:.2} gwei reported, {:.2} gwei submitted", wei_to_gwei(reported), wei_to_gwei(submitted));
        }
        Err(e) => println!("  Gas price: ❌ {}", e),
    }

    println!("\n✅ Diagnostic complete!\n");
}
