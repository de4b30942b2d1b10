//! Two-hop locator resolution.

use crate::relay::types::TransactionRecord;
use crate::resolver::payload::{KeyEnvelope, SealedPayload};
use crate::resolver::store::ObjectStore;
use crate::resolver::ResolutionError;

/// Turns announced locators into decrypted transaction records.
///
/// Nothing is retried here; a failed fetch fails the resolution.
#[derive(Debug, Clone)]
pub struct LocatorResolver<S> {
    store: S,
}

impl<S: ObjectStore> LocatorResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve an on-chain locator: the UTF-8 id of a key envelope.
    pub async fn resolve(&self, locator: &[u8]) -> Result<TransactionRecord, ResolutionError> {
        let envelope_id = std::str::from_utf8(locator)
            .map_err(|_| ResolutionError::MalformedLocator("locator is not UTF-8".into()))?;
        if envelope_id.is_empty() {
            return Err(ResolutionError::MalformedLocator("empty locator".into()));
        }

        let envelope = self.fetch(envelope_id).await?;
        self.open_envelope(&envelope).await
    }

    /// Fetch the payload an envelope points at and decrypt it with the
    /// envelope's key and IV.
    pub async fn open_envelope(&self, envelope: &[u8]) -> Result<TransactionRecord, ResolutionError> {
        let envelope = KeyEnvelope::parse(envelope)?;
        let object = self.fetch(envelope.object_id()).await?;
        let record = SealedPayload::parse(&object)?.open(&envelope)?;

        tracing::debug!(
            object_id = envelope.object_id(),
            kind = record.kind().map(|k| k.as_str()).unwrap_or("unknown"),
            "Payload decrypted"
        );
        Ok(record)
    }

    async fn fetch(&self, id: &str) -> Result<Vec<u8>, ResolutionError> {
        self.store
            .fetch(id)
            .await
            .map_err(|e| ResolutionError::Fetch {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }
}
