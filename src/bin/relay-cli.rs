use clap::{Parser, Subcommand, ValueEnum};
use rand::RngCore;
use std::path::PathBuf;

use chainwallet_relay::config::ObjectStoreConfig;
use chainwallet_relay::relay::{TransactionKind, TransactionRecord};
use chainwallet_relay::resolver::payload::{IV_LEN, KEY_LEN};
use chainwallet_relay::resolver::{seal, HttpObjectStore, KeyEnvelope, LocatorResolver};
use chainwallet_relay::storage::{CursorStore, RedisCursorStore};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Operator tooling for the chain wallet transaction relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    ValueTransfer,
    ContractInteraction,
}

impl From<Kind> for TransactionKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::ValueTransfer => TransactionKind::ValueTransfer,
            Kind::ContractInteraction => TransactionKind::ContractInteraction,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and decrypt the transaction behind an announced locator
    Resolve {
        #[arg(long, env = "IPFS_GATEWAY_BASE_URL")]
        gateway: String,
        /// Locator as announced on-chain (the key envelope id)
        locator: String,
    },
    /// Encrypt a JSON transaction record into a payload object
    Seal {
        #[arg(long)]
        record: PathBuf,
        #[arg(long, value_enum)]
        kind: Kind,
        #[arg(long)]
        out: PathBuf,
    },
    /// Build the key envelope pointing at an uploaded payload object
    Envelope {
        #[arg(long)]
        key: String,
        #[arg(long)]
        iv: String,
        #[arg(long)]
        payload_id: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Show the watcher's persisted cursor
    Cursor {
        #[arg(long, env = "REDIS_URL")]
        redis_url: String,
        #[arg(long, default_value = "cw_proxy__LastBlockNumber")]
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { gateway, locator } => {
            let store = HttpObjectStore::new(&ObjectStoreConfig {
                gateway_url: gateway,
                ..ObjectStoreConfig::default()
            })?;
            let record = LocatorResolver::new(store).resolve(locator.as_bytes()).await?;
            println!(
                "kind: {}",
                record.kind().map(|k| k.as_str()).unwrap_or("unknown")
            );
            println!("bid: {}", record.bid());
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Seal { record, kind, out } => {
            let record: TransactionRecord = serde_json::from_slice(&std::fs::read(record)?)?;
            let mut key = [0u8; KEY_LEN];
            let mut iv = [0u8; IV_LEN];
            rand::thread_rng().fill_bytes(&mut key);
            rand::thread_rng().fill_bytes(&mut iv);

            let tag = TransactionKind::from(kind).type_tag();
            std::fs::write(&out, seal(&record, tag, &key, &iv)?)?;
            println!("payload: {}", out.display());
            println!("key: 0x{}", alloy::hex::encode(key));
            println!("iv: 0x{}", alloy::hex::encode(iv));
        }
        Commands::Envelope {
            key,
            iv,
            payload_id,
            out,
        } => {
            let key: [u8; KEY_LEN] = decode_fixed(&key, "key")?;
            let iv: [u8; IV_LEN] = decode_fixed(&iv, "iv")?;
            std::fs::write(&out, KeyEnvelope::encode(&key, &iv, &payload_id))?;
            println!("envelope: {}", out.display());
        }
        Commands::Cursor { redis_url, key } => {
            let store = RedisCursorStore::connect(&redis_url).await?;
            match store.get(&key).await? {
                Some(block) => println!("{}: {}", key, block),
                None => println!("{}: not set", key),
            }
        }
    }

    Ok(())
}

fn decode_fixed<const N: usize>(hex: &str, what: &str) -> Result<[u8; N], String> {
    let bytes = alloy::hex::decode(hex.trim()).map_err(|e| format!("invalid {}: {}", what, e))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| format!("{} must be {} bytes, got {}", what, N, bytes.len()))
}
