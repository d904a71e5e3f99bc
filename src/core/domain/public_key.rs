//! Public key type.

use base64::Engine;

use crate::core::constants::PUBLIC_KEY_LEN;
use crate::core::types::KeyId;
use crate::error::KeyError;

/// An organization's secret-encryption public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    key_id: KeyId,
    bytes: [u8; PUBLIC_KEY_LEN],
}

impl PublicKey {
    pub fn from_bytes(key_id: impl Into<KeyId>, bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self {
            key_id: key_id.into(),
            bytes,
        }
    }

    /// Decode the base64 transport form served by the public-key endpoint.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Unavailable` if the key id is empty, the key is not
    /// valid base64, or it does not decode to exactly 32 bytes.
    pub fn decode(org: &str, key_id: &str, encoded: &str) -> Result<Self, KeyError> {
        let unavailable = |reason: String| KeyError::Unavailable {
            org: org.to_string(),
            reason,
        };

        if key_id.trim().is_empty() {
            return Err(unavailable("empty key id".to_string()));
        }

        let raw = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| unavailable(format!("invalid base64: {}", e)))?;

        let bytes: [u8; PUBLIC_KEY_LEN] = raw.as_slice().try_into().map_err(|_| {
            unavailable(format!(
                "expected {} key bytes, got {}",
                PUBLIC_KEY_LEN,
                raw.len()
            ))
        })?;

        Ok(Self::from_bytes(key_id, bytes))
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.bytes
    }
}
