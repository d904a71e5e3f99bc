//! Public-key encryption of secret values.
//!
//! Values are encrypted with an anonymous sealed box (X25519 +
//! XSalsa20-Poly1305, libsodium `crypto_box_seal` layout): only the holder of
//! the organization's private key can open it and the ciphertext carries no
//! sender identity. A ciphertext is only meaningful together with the id of
//! the key it was sealed for.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use crypto_box::aead::OsRng;
use tokio::sync::Mutex;
use tracing::{debug, info, trace};

use crate::core::domain::PublicKey;
use crate::core::platform::Platform;
use crate::core::types::{KeyId, OrgName};
use crate::error::{ApiError, KeyError, Result};

/// A base64 sealed-box ciphertext bound to its key id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedValue {
    pub key_id: KeyId,
    pub encrypted_value: String,
}

/// Fetch and decode an organization's current public key.
///
/// # Errors
///
/// Authentication failures pass through as `ApiError`; any other failure to
/// obtain a usable key is `KeyError::Unavailable`.
pub async fn fetch_key(platform: &dyn Platform, org: &str) -> Result<PublicKey> {
    let raw = platform.public_key(org).await.map_err(|e| match e {
        ApiError::Authentication { .. } => e.into(),
        other => crate::error::Error::from(KeyError::Unavailable {
            org: org.to_string(),
            reason: other.to_string(),
        }),
    })?;

    let key = PublicKey::decode(org, &raw.key_id, &raw.key)?;
    debug!(org, key_id = key.key_id(), "fetched public key");
    Ok(key)
}

/// Seal `plaintext` for `key`.
///
/// Non-deterministic: every call uses a fresh ephemeral keypair.
///
/// # Errors
///
/// Returns `KeyError::Seal` if encryption fails.
pub fn seal(plaintext: &str, key: &PublicKey) -> std::result::Result<SealedValue, KeyError> {
    trace!(key_id = key.key_id(), plaintext_len = plaintext.len(), "sealing value");

    let recipient = crypto_box::PublicKey::from(*key.as_bytes());
    let ciphertext = recipient
        .seal(&mut OsRng, plaintext.as_bytes())
        .map_err(|e| KeyError::Seal(e.to_string()))?;

    Ok(SealedValue {
        key_id: key.key_id().to_string(),
        encrypted_value: base64::engine::general_purpose::STANDARD.encode(ciphertext),
    })
}

/// The destination key for one run, re-fetched once it gets old.
pub struct KeyCache {
    org: OrgName,
    max_age: Duration,
    current: Mutex<Option<(Arc<PublicKey>, Instant)>>,
    fetches: AtomicUsize,
}

impl KeyCache {
    pub fn new(org: impl Into<OrgName>, max_age: Duration) -> Self {
        Self {
            org: org.into(),
            max_age,
            current: Mutex::new(None),
            fetches: AtomicUsize::new(0),
        }
    }

    /// The cached key, fetched first if missing or older than `max_age`.
    ///
    /// Concurrent callers wait for a single fetch.
    pub async fn current(&self, platform: &dyn Platform) -> Result<Arc<PublicKey>> {
        let mut current = self.current.lock().await;

        if let Some((key, fetched_at)) = current.as_ref() {
            if fetched_at.elapsed() < self.max_age {
                return Ok(Arc::clone(key));
            }
            info!(org = %self.org, key_id = key.key_id(), "public key expired, fetching again");
        }

        let key = Arc::new(fetch_key(platform, &self.org).await?);
        self.fetches.fetch_add(1, Ordering::Relaxed);
        *current = Some((Arc::clone(&key), Instant::now()));
        Ok(key)
    }

    /// Number of remote key fetches so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}
