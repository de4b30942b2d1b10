//! Chain event watcher loop.

use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;

use crate::config::WatcherConfig;
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;
use crate::storage::{Cursor, CursorStore};
use crate::watcher::source::EventSource;
use crate::watcher::types::{DiscoveredLocator, PollOutcome};
use crate::watcher::WatcherError;

/// Polls for `TransactionCreated` events past the cursor and hands their
/// locators to the resolution pipeline.
pub struct ChainWatcher<E, S> {
    source: E,
    cursor: Cursor<S>,
    locators: mpsc::Sender<DiscoveredLocator>,
    poll_interval: Duration,
    confirmation_blocks: u64,
    max_error_backoff: Duration,
}

impl<E: EventSource, S: CursorStore> ChainWatcher<E, S> {
    pub fn new(
        source: E,
        cursor: Cursor<S>,
        locators: mpsc::Sender<DiscoveredLocator>,
        config: &WatcherConfig,
    ) -> Self {
        Self {
            source,
            cursor,
            locators,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            confirmation_blocks: config.confirmation_blocks,
            max_error_backoff: Duration::from_millis(config.max_error_backoff_ms),
        }
    }

    /// One poll cycle: query `[cursor + 1, head - lag]`, emit every
    /// announcement in order, then advance the cursor to the last emitted
    /// block.
    ///
    /// The cursor moves as soon as the batch is handed off, whether or not
    /// the transactions are later resolved or relayed.
    pub async fn poll_once(&self) -> Result<PollOutcome, WatcherError> {
        let cursor = self.cursor.current().await?;
        let head = self.source.latest_block().await?;
        let target = head.saturating_sub(self.confirmation_blocks);

        if target <= cursor {
            return Ok(PollOutcome::Idle);
        }

        let from = cursor + 1;
        let events: Vec<DiscoveredLocator> = self
            .source
            .transaction_created(from, target)
            .await?
            .into_iter()
            .filter(|event| event.block_number >= from)
            .collect();

        let Some(last_block) = events.last().map(|event| event.block_number) else {
            tracing::debug!(from = from, to = target, "No new announcements");
            return Ok(PollOutcome::Idle);
        };

        let emitted = events.len();
        for event in events {
            tracing::info!(
                block_number = event.block_number,
                tx_hash = ?event.tx_hash,
                "Discovered transaction locator"
            );
            self.locators
                .send(event)
                .await
                .map_err(|_| WatcherError::ChannelClosed)?;
            metrics::record_locator_discovered();
        }

        let cursor = self.cursor.advance(last_block).await?;
        Ok(PollOutcome::Advanced { emitted, cursor })
    }

    /// Poll until shutdown or until the locator channel closes.
    ///
    /// Query and store errors are logged and retried with exponential
    /// backoff; they never end the loop.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            cursor_key = self.cursor.key(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            confirmation_blocks = self.confirmation_blocks,
            "Starting chain watcher"
        );

        let mut errors = Backoff::new(self.poll_interval, self.max_error_backoff);

        loop {
            let delay = match self.poll_once().await {
                Ok(PollOutcome::Advanced { emitted, cursor }) => {
                    errors.reset();
                    tracing::debug!(emitted = emitted, cursor = cursor, "Cursor advanced");
                    Duration::ZERO
                }
                Ok(PollOutcome::Idle) => {
                    errors.reset();
                    self.poll_interval
                }
                Err(WatcherError::ChannelClosed) => {
                    tracing::info!("Locator channel closed, stopping chain watcher");
                    return;
                }
                Err(e) => {
                    let delay = errors.next_delay();
                    tracing::error!(
                        error = %e,
                        consecutive_errors = errors.attempt(),
                        retry_in_ms = delay.as_millis() as u64,
                        "Error polling for announcements"
                    );
                    delay
                }
            };

            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Chain watcher shutting down");
                    return;
                }
                _ = sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{BlockchainError, BlockchainResult};
    use crate::storage::InMemoryCursorStore;
    use alloy::primitives::Bytes;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Source that ignores the requested range, like a lagging or sloppy node.
    #[derive(Clone, Default)]
    struct StubSource {
        head: Arc<AtomicU64>,
        events: Arc<Mutex<Vec<DiscoveredLocator>>>,
        queries: Arc<Mutex<Vec<(u64, u64)>>>,
        head_calls: Arc<AtomicUsize>,
        fail: Arc<AtomicBool>,
    }

    impl StubSource {
        fn announce(&self, block_number: u64, locator: &str) {
            self.events.lock().unwrap().push(DiscoveredLocator {
                locator: Bytes::copy_from_slice(locator.as_bytes()),
                block_number,
                tx_hash: None,
            });
            self.head.fetch_max(block_number, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl EventSource for StubSource {
        async fn latest_block(&self) -> BlockchainResult<u64> {
            self.head_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(BlockchainError::Rpc("node down".into()));
            }
            Ok(self.head.load(Ordering::SeqCst))
        }

        async fn transaction_created(
            &self,
            from: u64,
            to: u64,
        ) -> BlockchainResult<Vec<DiscoveredLocator>> {
            self.queries.lock().unwrap().push((from, to));
            Ok(self.events.lock().unwrap().clone())
        }
    }

    fn config() -> WatcherConfig {
        WatcherConfig {
            poll_interval_ms: 5_000,
            confirmation_blocks: 0,
            max_error_backoff_ms: 60_000,
        }
    }

    fn watcher(
        source: StubSource,
        store: InMemoryCursorStore,
        start_block: u64,
    ) -> (ChainWatcher<StubSource, InMemoryCursorStore>, mpsc::Receiver<DiscoveredLocator>) {
        let (tx, rx) = mpsc::channel(16);
        let cursor = Cursor::new(store, "cursor", start_block);
        (ChainWatcher::new(source, cursor, tx, &config()), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<DiscoveredLocator>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(String::from_utf8(event.locator.to_vec()).unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_emits_in_order_and_advances_to_last_event() {
        let source = StubSource::default();
        source.announce(12, "a");
        source.announce(12, "b");
        source.announce(15, "c");
        source.head.store(20, Ordering::SeqCst);

        let store = InMemoryCursorStore::new();
        let (watcher, mut rx) = watcher(source.clone(), store.clone(), 10);

        let outcome = watcher.poll_once().await.unwrap();
        assert_eq!(outcome, PollOutcome::Advanced { emitted: 3, cursor: 15 });
        assert_eq!(drain(&mut rx), vec!["a", "b", "c"]);
        assert_eq!(store.get("cursor").await.unwrap(), Some(15));
        assert_eq!(source.queries.lock().unwrap().as_slice(), &[(11, 20)]);
    }

    #[tokio::test]
    async fn test_resumption_skips_blocks_at_or_below_cursor() {
        let source = StubSource::default();
        source.announce(99, "old");
        source.announce(100, "boundary");
        source.announce(101, "new");

        let store = InMemoryCursorStore::with_value("cursor", 100);
        let (watcher, mut rx) = watcher(source.clone(), store.clone(), 0);

        watcher.poll_once().await.unwrap();
        assert_eq!(drain(&mut rx), vec!["new"]);
        assert_eq!(source.queries.lock().unwrap()[0].0, 101);
        assert_eq!(store.get("cursor").await.unwrap(), Some(101));
    }

    #[tokio::test]
    async fn test_empty_batch_leaves_cursor_unchanged() {
        let source = StubSource::default();
        source.head.store(50, Ordering::SeqCst);

        let store = InMemoryCursorStore::with_value("cursor", 40);
        let (watcher, mut rx) = watcher(source, store.clone(), 0);

        assert_eq!(watcher.poll_once().await.unwrap(), PollOutcome::Idle);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(store.get("cursor").await.unwrap(), Some(40));
    }

    #[tokio::test]
    async fn test_cursor_never_decreases() {
        let source = StubSource::default();
        let store = InMemoryCursorStore::new();
        let (watcher, mut rx) = watcher(source.clone(), store.clone(), 0);

        let mut previous = 0;
        for block in [3u64, 7, 7, 20] {
            source.announce(block, "x");
            watcher.poll_once().await.unwrap();
            let stored = store.get("cursor").await.unwrap().unwrap();
            assert!(stored >= previous);
            assert_eq!(stored, previous.max(block));
            previous = stored;
        }
        drain(&mut rx);
    }

    #[tokio::test]
    async fn test_confirmation_lag_limits_range() {
        let source = StubSource::default();
        source.head.store(100, Ordering::SeqCst);
        let store = InMemoryCursorStore::with_value("cursor", 90);

        let (tx, _rx) = mpsc::channel(4);
        let cursor = Cursor::new(store, "cursor", 0);
        let watcher = ChainWatcher::new(
            source.clone(),
            cursor,
            tx,
            &WatcherConfig {
                confirmation_blocks: 12,
                ..config()
            },
        );

        assert_eq!(watcher.poll_once().await.unwrap(), PollOutcome::Idle);
        assert!(source.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_channel_is_reported() {
        let source = StubSource::default();
        source.announce(5, "a");
        let (watcher, rx) = watcher(source, InMemoryCursorStore::new(), 0);
        drop(rx);

        assert!(matches!(
            watcher.poll_once().await,
            Err(WatcherError::ChannelClosed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_poll_waits_for_interval() {
        let source = StubSource::default();
        source.head.store(10, Ordering::SeqCst);
        let (watcher, _rx) = watcher(source.clone(), InMemoryCursorStore::new(), 10);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(watcher.run(shutdown_rx));

        sleep(Duration::from_millis(4_900)).await;
        assert_eq!(source.head_calls.load(Ordering::SeqCst), 1);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(source.head_calls.load(Ordering::SeqCst), 2);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_back_off_and_recover() {
        let source = StubSource::default();
        source.fail.store(true, Ordering::SeqCst);
        let (watcher, mut rx) = watcher(source.clone(), InMemoryCursorStore::new(), 0);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(watcher.run(shutdown_rx));

        // first retry after ~5s, second after a further ~10s
        sleep(Duration::from_millis(5_600)).await;
        assert_eq!(source.head_calls.load(Ordering::SeqCst), 2);
        sleep(Duration::from_millis(9_000)).await;
        assert_eq!(source.head_calls.load(Ordering::SeqCst), 2);

        source.announce(3, "late");
        source.fail.store(false, Ordering::SeqCst);
        sleep(Duration::from_millis(30_000)).await;
        assert_eq!(drain(&mut rx), vec!["late"]);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
