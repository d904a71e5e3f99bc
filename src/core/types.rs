//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// An organization login (e.g., `acme-corp`).
pub type OrgName = String;

/// A repository name without its owner (e.g., `billing-api`).
pub type RepoName = String;

/// Numeric repository identifier assigned by the platform.
///
/// The same repository name has a different id in each organization.
pub type RepositoryId = u64;

/// Identifier of the public key a ciphertext was sealed for.
pub type KeyId = String;

/// A secret name (e.g., `NPM_TOKEN`). Case-insensitive on the platform.
pub type SecretName = String;
