//! End-to-end relay pipeline tests: announcements through the HTTP gateway
//! to contract submission.

use alloy::primitives::{Bytes, U256};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use chainwallet_relay::config::{ObjectStoreConfig, RelayLoopConfig, WatcherConfig};
use chainwallet_relay::lifecycle::Shutdown;
use chainwallet_relay::relay::{RelayLoop, TransactionKind};
use chainwallet_relay::resolver::{HttpObjectStore, LocatorResolver, ResolutionService};
use chainwallet_relay::storage::{Cursor, CursorStore, InMemoryCursorStore};
use chainwallet_relay::watcher::ChainWatcher;

mod common;

use common::{publish, record, wait_until, Objects, RecordingContract, ScriptedSource};

const CURSOR_KEY: &str = "cw_proxy__LastBlockNumber";

struct Pipeline {
    shutdown: Shutdown,
    watcher: JoinHandle<()>,
    resolution: JoinHandle<()>,
    relay: JoinHandle<()>,
}

impl Pipeline {
    fn start(
        gateway_url: String,
        source: ScriptedSource,
        store: InMemoryCursorStore,
        contract: RecordingContract,
    ) -> Self {
        let watcher_config = WatcherConfig {
            poll_interval_ms: 50,
            ..WatcherConfig::default()
        };
        let relay_config = RelayLoopConfig {
            idle_interval_ms: 20,
            channel_capacity: 4,
            max_concurrent_resolutions: 2,
        };

        let (locator_tx, locator_rx) = mpsc::channel(relay_config.channel_capacity);
        let (record_tx, record_rx) = mpsc::channel(relay_config.channel_capacity);

        let cursor = Cursor::new(store, CURSOR_KEY, 100);
        let watcher = ChainWatcher::new(source, cursor, locator_tx, &watcher_config);

        let object_store = HttpObjectStore::new(&ObjectStoreConfig {
            gateway_url,
            timeout_secs: 5,
        })
        .unwrap();
        let resolution = ResolutionService::new(
            LocatorResolver::new(object_store),
            relay_config.max_concurrent_resolutions,
        );
        let relay = RelayLoop::new(contract, record_rx, &relay_config);

        let shutdown = Shutdown::new();
        let relay_shutdown = shutdown.subscribe();
        Self {
            watcher: tokio::spawn(watcher.run(shutdown.subscribe())),
            resolution: tokio::spawn(resolution.run(locator_rx, record_tx, shutdown.subscribe())),
            relay: tokio::spawn(async move {
                relay.run(relay_shutdown).await.unwrap();
            }),
            shutdown,
        }
    }

    async fn stop(self) {
        self.shutdown.trigger();
        for handle in [self.watcher, self.resolution, self.relay] {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("task did not stop")
                .unwrap();
        }
    }
}

#[tokio::test]
async fn test_announced_transactions_are_relayed() {
    let objects = Objects::default();
    let gateway = common::start_object_gateway(objects.clone()).await;

    let source = ScriptedSource::default();
    let value = record(100_000, 7, TransactionKind::ValueTransfer);
    let call = record(250_000, 3, TransactionKind::ContractInteraction);
    source.announce(101, publish(&objects, "value", &value));
    source.announce(104, publish(&objects, "call", &call));

    let store = InMemoryCursorStore::new();
    let contract = RecordingContract::default();
    let pipeline = Pipeline::start(gateway, source, store.clone(), contract.clone());

    let submitted = contract.submitted.clone();
    assert!(wait_until(Duration::from_secs(5), || submitted.lock().unwrap().len() == 2).await);

    let mut prices = contract.submitted.lock().unwrap().clone();
    prices.sort();
    assert_eq!(prices, vec![U256::from(3), U256::from(7)]);
    assert_eq!(store.get(CURSOR_KEY).await.unwrap(), Some(104));

    pipeline.stop().await;
}

#[tokio::test]
async fn test_bad_locators_do_not_stall_the_pipeline() {
    let objects = Objects::default();
    let gateway = common::start_object_gateway(objects.clone()).await;

    let source = ScriptedSource::default();
    let good = record(21_000, 9, TransactionKind::ValueTransfer);
    let rejected = record(21_000, 4, TransactionKind::ValueTransfer);

    // missing envelope
    source.announce(101, Bytes::from_static(b"nowhere"));

    // tampered payload
    let tampered = record(21_000, 5, TransactionKind::ValueTransfer);
    let locator = publish(&objects, "tampered", &tampered);
    objects.alter("tampered-payload", |_, mut bytes| {
        let last = bytes.len() - 1;
        bytes[last] ^= 0x80;
        bytes
    });
    source.announce(102, locator);

    source.announce(103, publish(&objects, "rejected", &rejected));
    source.announce(103, publish(&objects, "good", &good));

    let store = InMemoryCursorStore::new();
    let contract = RecordingContract::default();
    contract.reject_prices.lock().unwrap().push(U256::from(4));
    let pipeline = Pipeline::start(gateway, source, store.clone(), contract.clone());

    let simulated = contract.simulated.clone();
    assert!(wait_until(Duration::from_secs(5), || simulated.lock().unwrap().len() == 2).await);
    tokio::time::sleep(Duration::from_millis(200)).await;

    // The tampered payload never reaches the contract; the failed
    // simulation is never submitted.
    let mut simulated = contract.simulated.lock().unwrap().clone();
    simulated.sort();
    assert_eq!(simulated, vec![U256::from(4), U256::from(9)]);
    assert_eq!(*contract.submitted.lock().unwrap(), vec![U256::from(9)]);
    assert_eq!(store.get(CURSOR_KEY).await.unwrap(), Some(103));

    pipeline.stop().await;
}

#[tokio::test]
async fn test_restart_resumes_after_persisted_cursor() {
    let objects = Objects::default();
    let gateway = common::start_object_gateway(objects.clone()).await;

    let source = ScriptedSource::default();
    let already_relayed = record(21_000, 1, TransactionKind::ValueTransfer);
    let fresh = record(21_000, 2, TransactionKind::ValueTransfer);
    source.announce(150, publish(&objects, "old", &already_relayed));
    source.announce(151, publish(&objects, "new", &fresh));

    let store = InMemoryCursorStore::with_value(CURSOR_KEY, 150);
    let contract = RecordingContract::default();
    let pipeline = Pipeline::start(gateway, source, store.clone(), contract.clone());

    let submitted = contract.submitted.clone();
    assert!(wait_until(Duration::from_secs(5), || !submitted.lock().unwrap().is_empty()).await);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(*contract.submitted.lock().unwrap(), vec![U256::from(2)]);
    assert_eq!(store.get(CURSOR_KEY).await.unwrap(), Some(151));

    pipeline.stop().await;
}
