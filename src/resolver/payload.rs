//! Wire layout and encryption of the two objects behind a locator.
//!
//! ```text
//! key envelope:   | key (32) | iv (16) | payload object id (utf-8) |
//! payload object: | type tag (32) | auth tag (16) | ciphertext     |
//! ```
//!
//! The ciphertext is AES-256-GCM over the JSON transaction record, with a
//! 128-bit IV, no associated data and a detached 128-bit tag.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Key, Nonce, Tag};
use alloy::primitives::B256;

use crate::relay::types::TransactionRecord;
use crate::resolver::ResolutionError;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;
pub const TYPE_TAG_LEN: usize = 32;
pub const AUTH_TAG_LEN: usize = 16;

const ENVELOPE_HEADER_LEN: usize = KEY_LEN + IV_LEN;
const PAYLOAD_HEADER_LEN: usize = TYPE_TAG_LEN + AUTH_TAG_LEN;

/// AES-256-GCM with a 16-byte nonce.
type TransactionCipher = AesGcm<Aes256, U16>;

/// Decryption material and the identifier of the payload object.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyEnvelope<'a> {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
    object_id: &'a str,
}

impl<'a> KeyEnvelope<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ResolutionError> {
        if bytes.len() <= ENVELOPE_HEADER_LEN {
            return Err(ResolutionError::Malformed {
                what: "key envelope",
                len: bytes.len(),
            });
        }

        let (header, id) = bytes.split_at(ENVELOPE_HEADER_LEN);
        let object_id = std::str::from_utf8(id)
            .map_err(|_| ResolutionError::MalformedLocator("payload id is not UTF-8".into()))?;

        let mut key = [0u8; KEY_LEN];
        let mut iv = [0u8; IV_LEN];
        key.copy_from_slice(&header[..KEY_LEN]);
        iv.copy_from_slice(&header[KEY_LEN..]);

        Ok(Self { key, iv, object_id })
    }

    /// Serialize an envelope pointing at `object_id`.
    pub fn encode(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], object_id: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENVELOPE_HEADER_LEN + object_id.len());
        out.extend_from_slice(key);
        out.extend_from_slice(iv);
        out.extend_from_slice(object_id.as_bytes());
        out
    }

    pub fn object_id(&self) -> &'a str {
        self.object_id
    }
}

// Key material stays out of logs.
impl std::fmt::Debug for KeyEnvelope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEnvelope")
            .field("object_id", &self.object_id)
            .finish_non_exhaustive()
    }
}

/// The encrypted transaction and its plaintext type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload<'a> {
    pub type_tag: B256,
    auth_tag: [u8; AUTH_TAG_LEN],
    ciphertext: &'a [u8],
}

impl<'a> SealedPayload<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ResolutionError> {
        if bytes.len() < PAYLOAD_HEADER_LEN {
            return Err(ResolutionError::Malformed {
                what: "payload object",
                len: bytes.len(),
            });
        }

        let (header, ciphertext) = bytes.split_at(PAYLOAD_HEADER_LEN);
        let mut auth_tag = [0u8; AUTH_TAG_LEN];
        auth_tag.copy_from_slice(&header[TYPE_TAG_LEN..]);

        Ok(Self {
            type_tag: B256::from_slice(&header[..TYPE_TAG_LEN]),
            auth_tag,
            ciphertext,
        })
    }

    /// Authenticate and decrypt, then attach the type tag to the record.
    pub fn open(&self, envelope: &KeyEnvelope<'_>) -> Result<TransactionRecord, ResolutionError> {
        let cipher = TransactionCipher::new(Key::<TransactionCipher>::from_slice(&envelope.key));
        let mut plaintext = self.ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(&envelope.iv),
                &[],
                &mut plaintext,
                Tag::<U16>::from_slice(&self.auth_tag),
            )
            .map_err(|_| ResolutionError::Authentication)?;

        let mut record: TransactionRecord = serde_json::from_slice(&plaintext)
            .map_err(|e| ResolutionError::Parse(e.to_string()))?;
        record.type_tag = self.type_tag;
        Ok(record)
    }
}

/// Encrypt `record` into a payload object tagged with `type_tag`.
///
/// The inverse of [`SealedPayload::open`]; used by tooling that publishes
/// intents and by tests.
pub fn seal(
    record: &TransactionRecord,
    type_tag: B256,
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
) -> Result<Vec<u8>, ResolutionError> {
    let mut buffer =
        serde_json::to_vec(record).map_err(|e| ResolutionError::Parse(e.to_string()))?;

    let cipher = TransactionCipher::new(Key::<TransactionCipher>::from_slice(key));
    let auth_tag = cipher
        .encrypt_in_place_detached(Nonce::<U16>::from_slice(iv), &[], &mut buffer)
        .map_err(|_| ResolutionError::Encryption)?;

    let mut out = Vec::with_capacity(PAYLOAD_HEADER_LEN + buffer.len());
    out.extend_from_slice(type_tag.as_slice());
    out.extend_from_slice(auth_tag.as_slice());
    out.extend_from_slice(&buffer);
    Ok(out)
}
