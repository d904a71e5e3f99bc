//! Test fixtures and constants.

use base64::Engine;
use crypto_box::aead::OsRng;
use crypto_box::SecretKey;

use secret_migrator::core::domain::PublicKey;

/// Source organization used across tests.
pub const SOURCE: &str = "old-org";

/// Destination organization used across tests.
pub const DEST: &str = "new-org";

/// Values supplied for migration tests.
pub const STANDARD_VALUES: &[(&str, &str)] = &[
    ("NPM_TOKEN", "npm_abc123"),
    ("DEPLOY_KEY", "-----BEGIN KEY-----\nabc\n-----END KEY-----"),
    ("SLACK_WEBHOOK", "https://hooks.slack.test/T000/B000"),
];

/// A destination keypair; tests keep the private half to open ciphertexts.
pub fn keypair(key_id: &str) -> (SecretKey, PublicKey) {
    let secret = SecretKey::generate(&mut OsRng);
    let public = PublicKey::from_bytes(key_id, *secret.public_key().as_bytes());
    (secret, public)
}

/// Base64 form of a public key as served by the platform.
pub fn encoded(public: &PublicKey) -> String {
    base64::engine::general_purpose::STANDARD.encode(public.as_bytes())
}

/// Open a base64 sealed box with `secret`.
pub fn open(secret: &SecretKey, encrypted_value: &str) -> String {
    let ciphertext = base64::engine::general_purpose::STANDARD
        .decode(encrypted_value)
        .expect("ciphertext is not base64");
    let plaintext = secret.unseal(&ciphertext).expect("failed to open sealed box");
    String::from_utf8(plaintext).expect("plaintext is not utf-8")
}
