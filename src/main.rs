//! Chain wallet transaction relay.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐  TransactionCreated   ┌──────────────┐
//!   │  RPC node    │──────────────────────▶│   watcher    │◀──▶ cursor store (Redis)
//!   └──────────────┘                       └──────┬───────┘
//!          ▲                                      │ locators (bounded channel)
//!          │                                      ▼
//!          │                               ┌──────────────┐
//!          │                               │   resolver   │◀──▶ object gateway (HTTP)
//!          │                               └──────┬───────┘
//!          │                                      │ records (bounded channel)
//!          │                                      ▼
//!          │  simulate / submit / confirm  ┌──────────────┐
//!          └───────────────────────────────│ relay loop   │  priority queue by bid
//!                                          └──────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use chainwallet_relay::config::load_config;
use chainwallet_relay::lifecycle;
use chainwallet_relay::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "chainwallet-relay")]
#[command(about = "Relays encrypted proxy transactions announced on-chain", long_about = None)]
struct Args {
    /// TOML configuration file; environment variables override its values.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("chainwallet-relay: {}", e);
            return Err(e.into());
        }
    };

    init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        rpc_url = %config.blockchain.rpc_url,
        contract = %config.contract.address,
        "chainwallet-relay starting"
    );

    lifecycle::run(&config).await?;
    Ok(())
}
