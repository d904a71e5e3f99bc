//! Hosting platform access.
//!
//! The migration engine talks to the platform only through the [`Platform`]
//! trait, so the orchestrator can be driven by the real REST client or by an
//! in-memory stand-in.
//!
//! ## Adding a New Platform
//!
//! 1. Implement the `Platform` trait
//! 2. Add the implementation in a new file (e.g., `gitea.rs`)
//! 3. Re-export from this module

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::PAGE_SIZE;
use crate::core::domain::{Repository, Secret, UpsertStatus, Visibility};
use crate::core::types::{KeyId, RepositoryId};
use crate::error::ApiError;

mod endpoint;
mod github;
pub mod retry;

pub use endpoint::Endpoint;
pub use github::GitHub;
pub use retry::RetryPolicy;

/// Which family of organization secrets a run works on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SecretKind {
    /// GitHub Actions secrets
    #[default]
    Actions,
    /// Dependabot secrets
    Dependabot,
}

impl SecretKind {
    /// Path segment under `/orgs/{org}/`.
    pub fn segment(&self) -> &'static str {
        match self {
            Self::Actions => "actions",
            Self::Dependabot => "dependabot",
        }
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub total_count: usize,
    pub items: Vec<T>,
}

/// Public key as served by the platform (base64 key material).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawPublicKey {
    pub key_id: KeyId,
    pub key: String,
}

/// Body of the create-or-update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertRequest {
    pub encrypted_value: String,
    pub key_id: KeyId,
    pub visibility: Visibility,
    /// Present only for `selected` visibility, possibly empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_repository_ids: Option<Vec<RepositoryId>>,
}

impl UpsertRequest {
    pub fn repository_ids(&self) -> &[RepositoryId] {
        self.selected_repository_ids.as_deref().unwrap_or(&[])
    }
}

/// Operations the migration engine needs from the hosting platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Items requested per page.
    fn page_size(&self) -> u32 {
        PAGE_SIZE
    }

    /// One page of an organization's secrets (pages start at 1).
    async fn secrets_page(&self, org: &str, page: u32) -> Result<Page<Secret>, ApiError>;

    /// One page of the repositories a `selected` secret applies to.
    async fn selected_repositories_page(
        &self,
        org: &str,
        secret: &str,
        page: u32,
    ) -> Result<Page<Repository>, ApiError>;

    /// Look up `owner/name`. `Ok(None)` means the repository does not exist.
    async fn repository(&self, owner: &str, name: &str) -> Result<Option<Repository>, ApiError>;

    /// The organization's current secret-encryption key.
    async fn public_key(&self, org: &str) -> Result<RawPublicKey, ApiError>;

    /// Create or overwrite a secret.
    async fn put_secret(
        &self,
        org: &str,
        name: &str,
        request: &UpsertRequest,
    ) -> Result<UpsertStatus, ApiError>;
}

/// Fetch every page of a listing.
///
/// Stops on an empty or short page, or once `total_count` items arrived.
///
/// # Errors
///
/// Propagates the first page error. Returns `ApiError::IncompleteListing`
/// if fewer items than the advertised `total_count` were received.
pub async fn drain<T, F, Fut>(listing: &str, per_page: u32, mut fetch: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let mut items = Vec::new();
    let mut expected = 0;

    for page in 1u32.. {
        let batch = fetch(page).await?;
        let received = batch.items.len();
        expected = batch.total_count;
        items.extend(batch.items);

        debug!(listing, page, received, total = expected, "fetched page");

        if received == 0 || received < per_page as usize || items.len() >= expected {
            break;
        }
    }

    if items.len() < expected {
        return Err(ApiError::IncompleteListing {
            endpoint: listing.to_string(),
            expected,
            received: items.len(),
        });
    }

    Ok(items)
}

/// All secrets of an organization.
pub async fn list_secrets(platform: &dyn Platform, org: &str) -> Result<Vec<Secret>, ApiError> {
    let listing = format!("secrets of {}", org);
    drain(&listing, platform.page_size(), |page| {
        platform.secrets_page(org, page)
    })
    .await
}
