//! Repository name resolution across organizations.
//!
//! The same repository name has a different id in every organization, so a
//! selected-repository list from the source must be looked up again in the
//! destination. Lookups are memoized for the lifetime of the resolver (one
//! run): every `(org, name)` pair is queried at most once, whether it was
//! found or confirmed absent. Failed lookups are not cached.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::core::platform::Platform;
use crate::core::types::RepositoryId;
use crate::error::ApiError;

/// Outcome of resolving a repository name in an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found(RepositoryId),
    /// The repository does not exist there. Not an error.
    NotFound,
}

impl From<Option<RepositoryId>> for Resolution {
    fn from(id: Option<RepositoryId>) -> Self {
        id.map_or(Self::NotFound, Self::Found)
    }
}

type CacheKey = (String, String);

/// Run-scoped, concurrency-safe repository resolver.
///
/// Each key owns a `OnceCell`: the first caller performs the lookup while
/// concurrent callers for the same key wait for its result.
pub struct Resolver<'a> {
    platform: &'a dyn Platform,
    cache: DashMap<CacheKey, Arc<OnceCell<Option<RepositoryId>>>>,
    lookups: AtomicUsize,
}

impl<'a> Resolver<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self {
            platform,
            cache: DashMap::new(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn platform(&self) -> &'a dyn Platform {
        self.platform
    }

    /// Id of `org/name`, or `NotFound`.
    ///
    /// # Errors
    ///
    /// Propagates any lookup failure other than "not found"; the pair is
    /// then queried again on the next call.
    pub async fn resolve(&self, org: &str, name: &str) -> Result<Resolution, ApiError> {
        if org.is_empty() || name.is_empty() {
            return Err(ApiError::Client(format!(
                "cannot resolve repository '{}' in organization '{}'",
                name, org
            )));
        }

        let key = (org.to_ascii_lowercase(), name.to_ascii_lowercase());
        let cell = Arc::clone(self.cache.entry(key).or_default().value());

        if let Some(cached) = cell.get() {
            debug!(org, repo = name, "repository cache hit");
            return Ok((*cached).into());
        }

        let id = cell
            .get_or_try_init(|| async {
                self.lookups.fetch_add(1, Ordering::Relaxed);
                debug!(org, repo = name, "resolving repository");
                let found = self.platform.repository(org, name).await?;
                Ok::<_, ApiError>(found.map(|r| r.id))
            })
            .await?;

        Ok((*id).into())
    }

    /// Remote lookups issued so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Distinct `(org, name)` pairs with a settled answer.
    pub fn cached(&self) -> usize {
        self.cache
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }
}
