//! Resolution task between the watcher and the relay loop.
//!
//! Records are forwarded in the order their resolutions complete, which
//! need not match the order their locators were announced. Equal bids are
//! therefore relayed in completion order.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::observability::metrics;
use crate::relay::types::TransactionRecord;
use crate::resolver::locator::LocatorResolver;
use crate::resolver::store::ObjectStore;
use crate::watcher::DiscoveredLocator;

/// Resolves discovered locators with bounded concurrency and forwards the
/// records to the relay loop.
pub struct ResolutionService<S> {
    resolver: Arc<LocatorResolver<S>>,
    max_concurrent: usize,
}

impl<S: ObjectStore + 'static> ResolutionService<S> {
    pub fn new(resolver: LocatorResolver<S>, max_concurrent: usize) -> Self {
        Self {
            resolver: Arc::new(resolver),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run until the locator channel closes or shutdown is signalled.
    ///
    /// On channel close, in-flight resolutions finish before returning so
    /// their records still reach the relay loop. On shutdown they are
    /// abandoned.
    pub async fn run(
        self,
        mut locators: mpsc::Receiver<DiscoveredLocator>,
        records: mpsc::Sender<TransactionRecord>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut in_flight = JoinSet::new();

        tracing::info!(max_concurrent = self.max_concurrent, "Resolution service started");

        loop {
            let discovered = tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!(in_flight = in_flight.len(), "Resolution service shutting down");
                    in_flight.shutdown().await;
                    return;
                }
                next = locators.recv() => match next {
                    Some(discovered) => discovered,
                    None => break,
                },
            };

            let permit = tokio::select! {
                _ = shutdown.recv() => {
                    in_flight.shutdown().await;
                    return;
                }
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            // Reap finished tasks so the set does not grow unbounded.
            while in_flight.try_join_next().is_some() {}

            let resolver = self.resolver.clone();
            let records = records.clone();
            in_flight.spawn(async move {
                let _permit = permit;
                resolve_and_forward(&resolver, discovered, &records).await;
            });
        }

        while in_flight.join_next().await.is_some() {}
        tracing::info!("Locator channel closed, resolution service stopped");
    }
}

async fn resolve_and_forward<S: ObjectStore>(
    resolver: &LocatorResolver<S>,
    discovered: DiscoveredLocator,
    records: &mpsc::Sender<TransactionRecord>,
) {
    let record = match resolver.resolve(&discovered.locator).await {
        Ok(record) => record,
        Err(e) => {
            metrics::record_resolution(e.label());
            tracing::warn!(
                block_number = discovered.block_number,
                tx_hash = ?discovered.tx_hash,
                error = %e,
                "Dropping unresolvable locator"
            );
            return;
        }
    };

    metrics::record_resolution("resolved");
    tracing::info!(
        block_number = discovered.block_number,
        from = %record.from_address,
        bid = %record.bid(),
        "Resolved transaction"
    );

    if records.send(record).await.is_err() {
        tracing::debug!("Relay loop gone, resolved record discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::types::tests::record;
    use crate::relay::types::TransactionKind;
    use crate::resolver::payload::{seal, KeyEnvelope};
    use crate::resolver::store::ObjectStoreError;
    use alloy::primitives::Bytes;
    use async_trait::async_trait;
    use dashmap::DashMap;

    #[derive(Clone, Default)]
    struct MapStore(Arc<DashMap<String, Vec<u8>>>);

    #[async_trait]
    impl ObjectStore for MapStore {
        async fn fetch(&self, id: &str) -> Result<Vec<u8>, ObjectStoreError> {
            self.0
                .get(id)
                .map(|e| e.value().clone())
                .ok_or(ObjectStoreError::Status { status: 404 })
        }
    }

    fn discovered(id: &str, block_number: u64) -> DiscoveredLocator {
        DiscoveredLocator {
            locator: Bytes::copy_from_slice(id.as_bytes()),
            block_number,
            tx_hash: None,
        }
    }

    #[tokio::test]
    async fn test_forwards_resolved_and_drops_failures() {
        let store = MapStore::default();
        let key = [1u8; 32];
        let iv = [2u8; 16];
        for (i, price) in [5u64, 9].into_iter().enumerate() {
            let r = record(21_000, price, TransactionKind::ValueTransfer);
            store.0.insert(format!("p{i}"), seal(&r, r.type_tag, &key, &iv).unwrap());
            store
                .0
                .insert(format!("e{i}"), KeyEnvelope::encode(&key, &iv, &format!("p{i}")));
        }

        let service = ResolutionService::new(LocatorResolver::new(store), 2);
        let (locator_tx, locator_rx) = mpsc::channel(8);
        let (record_tx, mut record_rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        locator_tx.send(discovered("e0", 10)).await.unwrap();
        locator_tx.send(discovered("missing", 11)).await.unwrap();
        locator_tx.send(discovered("e1", 12)).await.unwrap();
        drop(locator_tx);

        service.run(locator_rx, record_tx, shutdown_rx).await;

        let mut prices = Vec::new();
        while let Some(r) = record_rx.recv().await {
            prices.push(r.gas_price);
        }
        prices.sort();
        assert_eq!(prices, vec![alloy::primitives::U256::from(5), alloy::primitives::U256::from(9)]);
    }

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let service = ResolutionService::new(LocatorResolver::new(MapStore::default()), 1);
        let (_locator_tx, locator_rx) = mpsc::channel(1);
        let (record_tx, _record_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(service.run(locator_rx, record_tx, shutdown_rx));
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
