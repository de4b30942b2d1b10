//! Content-addressed object store access.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::ObjectStoreConfig;

/// Errors fetching an object by identifier.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("gateway returned status {status}")]
    Status { status: u16 },

    #[error("invalid object id {0:?}")]
    InvalidId(String),
}

/// Read-only access to objects addressed by content identifier.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Vec<u8>, ObjectStoreError>;
}

/// Object store reached through an HTTP gateway (`GET {base}{id}`).
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    http: reqwest::Client,
    base: Url,
}

impl HttpObjectStore {
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, ObjectStoreError> {
        let mut base = config.gateway_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)
            .map_err(|e| ObjectStoreError::Request(format!("invalid gateway URL: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ObjectStoreError::Request(e.to_string()))?;

        Ok(Self { http, base })
    }

    /// Resolve `id` against the gateway base.
    ///
    /// Identifiers come from untrusted announcements, so anything that could
    /// escape the gateway path is refused.
    fn object_url(&self, id: &str) -> Result<Url, ObjectStoreError> {
        let suspicious = id.is_empty()
            || id.starts_with('/')
            || id.contains("..")
            || id.chars().any(|c| matches!(c, ':' | '?' | '#' | '\\') || c.is_whitespace());
        if suspicious {
            return Err(ObjectStoreError::InvalidId(id.to_string()));
        }

        self.base
            .join(id)
            .map_err(|_| ObjectStoreError::InvalidId(id.to_string()))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn fetch(&self, id: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let url = self.object_url(id)?;
        tracing::debug!(url = %url, "Fetching object");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ObjectStoreError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ObjectStoreError::Request(e.to_string()))?;
        Ok(body.to_vec())
    }
}
