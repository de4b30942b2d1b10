//! Shared utilities for integration tests.

#![allow(dead_code)]

use alloy::primitives::{address, Bytes, TxHash, B256, U256};
use async_trait::async_trait;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use chainwallet_relay::blockchain::{BlockchainError, BlockchainResult, ConfirmationStatus};
use chainwallet_relay::relay::{RelayCall, RelayContract, TransactionKind, TransactionRecord};
use chainwallet_relay::resolver::{seal, KeyEnvelope};
use chainwallet_relay::watcher::{DiscoveredLocator, EventSource};

/// Objects served by the mock gateway, keyed by id.
pub type Objects = Arc<DashMap<String, Vec<u8>>>;

/// Start a mock content gateway answering `GET /ipfs/{id}` from `objects`.
///
/// Returns the gateway base URL.
pub async fn start_object_gateway(objects: Objects) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let objects = objects.clone();
                    tokio::spawn(async move {
                        let mut request = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => request.extend_from_slice(&buf[..n]),
                            }
                        }

                        let request = String::from_utf8_lossy(&request);
                        let path = request.split_whitespace().nth(1).unwrap_or("/");
                        let object = path
                            .strip_prefix("/ipfs/")
                            .and_then(|id| objects.get(id).map(|o| o.value().clone()));

                        let (status_text, body) = match object {
                            Some(body) => ("200 OK", body),
                            None => ("404 Not Found", b"not found".to_vec()),
                        };
                        let head = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            status_text,
                            body.len()
                        );
                        let _ = socket.write_all(head.as_bytes()).await;
                        let _ = socket.write_all(&body).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    format!("http://{}/ipfs/", addr)
}

pub const KEY: [u8; 32] = [0x11; 32];
pub const IV: [u8; 16] = [0x22; 16];

/// A record with the given gas settings.
pub fn record(gas_limit: u64, gas_price: u64, kind: TransactionKind) -> TransactionRecord {
    TransactionRecord {
        from_address: address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
        agent_address: address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
        to_address: address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
        value: U256::from(10u64).pow(U256::from(15u64)),
        nonce: U256::from(gas_price),
        gas_limit: U256::from(gas_limit),
        gas_price: U256::from(gas_price),
        data: Bytes::from_static(&[0xde, 0xad]),
        signature: Bytes::from(vec![0x1b; 65]),
        type_tag: kind.type_tag(),
    }
}

/// Publish `record` as envelope `{name}-env` and payload `{name}-payload`;
/// returns the on-chain locator.
pub fn publish(objects: &Objects, name: &str, record: &TransactionRecord) -> Bytes {
    let payload_id = format!("{name}-payload");
    let envelope_id = format!("{name}-env");
    objects.insert(
        payload_id.clone(),
        seal(record, record.type_tag, &KEY, &IV).unwrap(),
    );
    objects.insert(envelope_id.clone(), KeyEnvelope::encode(&KEY, &IV, &payload_id));
    Bytes::from(envelope_id.into_bytes())
}

/// Event source replaying a fixed list of announcements.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    pub head: Arc<AtomicU64>,
    pub events: Arc<Mutex<Vec<DiscoveredLocator>>>,
}

impl ScriptedSource {
    pub fn announce(&self, block_number: u64, locator: Bytes) {
        self.events.lock().unwrap().push(DiscoveredLocator {
            locator,
            block_number,
            tx_hash: Some(B256::repeat_byte(block_number as u8)),
        });
        self.head.fetch_max(block_number, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn latest_block(&self) -> BlockchainResult<u64> {
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn transaction_created(
        &self,
        from: u64,
        to: u64,
    ) -> BlockchainResult<Vec<DiscoveredLocator>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.block_number >= from && e.block_number <= to)
            .cloned()
            .collect())
    }
}

/// Contract stub recording every call; simulation fails for listed prices.
#[derive(Clone, Default)]
pub struct RecordingContract {
    pub simulated: Arc<Mutex<Vec<U256>>>,
    pub submitted: Arc<Mutex<Vec<U256>>>,
    pub reject_prices: Arc<Mutex<Vec<U256>>>,
}

#[async_trait]
impl RelayContract for RecordingContract {
    async fn simulate(&self, call: &RelayCall) -> BlockchainResult<u64> {
        let price = call.record.gas_price;
        self.simulated.lock().unwrap().push(price);
        if self.reject_prices.lock().unwrap().contains(&price) {
            return Err(BlockchainError::Simulation("agent not eligible".into()));
        }
        Ok(call.overrides.gas_limit)
    }

    async fn submit(&self, call: &RelayCall) -> BlockchainResult<TxHash> {
        self.submitted.lock().unwrap().push(call.record.gas_price);
        Ok(B256::from(call.record.gas_price.to_be_bytes::<32>()))
    }

    async fn confirm(&self, _tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
        Ok(ConfirmationStatus::Confirmed { block_number: 1 })
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
