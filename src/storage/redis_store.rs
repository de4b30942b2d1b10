//! Redis-backed cursor store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::fmt;
use std::time::Duration;

use crate::resilience::backoff::Backoff;
use crate::storage::{CursorStore, StoreError, StoreResult};

const CONNECT_BACKOFF_BASE: Duration = Duration::from_millis(500);
const CONNECT_BACKOFF_MAX: Duration = Duration::from_secs(10);

/// Cursor store persisting to a Redis instance.
#[derive(Clone)]
pub struct RedisCursorStore {
    client: ConnectionManager,
}

impl fmt::Debug for RedisCursorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCursorStore").finish_non_exhaustive()
    }
}

impl RedisCursorStore {
    /// Open a managed connection to `url`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url).map_err(|e| StoreError::Connection(e.to_string()))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { client: manager })
    }

    /// Connect, retrying up to `attempts` times with exponential backoff.
    pub async fn connect_with_retry(url: &str, attempts: u32) -> StoreResult<Self> {
        let mut backoff = Backoff::new(CONNECT_BACKOFF_BASE, CONNECT_BACKOFF_MAX);
        loop {
            match Self::connect(url).await {
                Ok(store) => {
                    tracing::info!(attempt = backoff.attempt() + 1, "Connected to cursor store");
                    return Ok(store);
                }
                Err(e) if backoff.attempt() + 1 >= attempts => return Err(e),
                Err(e) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        attempt = backoff.attempt(),
                        max_attempts = attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "Cursor store connection failed"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl CursorStore for RedisCursorStore {
    async fn get(&self, key: &str) -> StoreResult<Option<u64>> {
        let mut conn = self.client.clone();
        conn.get(key).await.map_err(|e| StoreError::Command {
            op: "get",
            reason: e.to_string(),
        })
    }

    async fn set(&self, key: &str, value: u64) -> StoreResult<()> {
        let mut conn = self.client.clone();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|e| StoreError::Command {
                op: "set",
                reason: e.to_string(),
            })
    }
}
