//! Visibility scope translation.
//!
//! Converts a `selected` secret's source repository list into destination
//! repository ids. Repositories missing from the destination are dropped and
//! reported; the source order is kept.

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::core::domain::Repository;
use crate::core::platform::{drain, Platform};
use crate::core::resolver::{Resolution, Resolver};
use crate::core::types::{RepoName, RepositoryId};
use crate::error::ApiError;

/// Typed reference to the repository list of a `selected` secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedRepositoriesRef<'a> {
    pub org: &'a str,
    pub secret: &'a str,
}

/// Destination ids for a secret's scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeTranslation {
    /// Destination ids in source order.
    pub repository_ids: Vec<RepositoryId>,
    /// Source repositories absent from the destination.
    pub dropped: Vec<RepoName>,
}

/// Every repository on the source side of `reference`.
pub async fn source_repositories(
    platform: &dyn Platform,
    reference: SelectedRepositoriesRef<'_>,
) -> Result<Vec<Repository>, ApiError> {
    let listing = format!("repositories of {}/{}", reference.org, reference.secret);
    drain(&listing, platform.page_size(), |page| {
        platform.selected_repositories_page(reference.org, reference.secret, page)
    })
    .await
}

/// Translate `reference` into ids within `destination`.
///
/// Up to `concurrency` lookups run at once; results keep the source order.
///
/// # Errors
///
/// Any failure other than a repository being absent aborts the translation.
pub async fn translate(
    resolver: &Resolver<'_>,
    reference: SelectedRepositoriesRef<'_>,
    destination: &str,
    concurrency: usize,
) -> Result<ScopeTranslation, ApiError> {
    let repositories = source_repositories(resolver.platform(), reference).await?;
    info!(
        secret = reference.secret,
        repositories = repositories.len(),
        "secret applies to repositories"
    );

    let resolved: Vec<(RepoName, Resolution)> = stream::iter(repositories)
        .map(|repo| async move {
            let resolution = resolver.resolve(destination, &repo.name).await?;
            Ok::<_, ApiError>((repo.name, resolution))
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let mut translation = ScopeTranslation::default();
    for (name, resolution) in resolved {
        match resolution {
            Resolution::Found(id) => translation.repository_ids.push(id),
            Resolution::NotFound => {
                warn!(
                    secret = reference.secret,
                    repo = %name,
                    destination,
                    "repository not found in destination, dropping from scope"
                );
                translation.dropped.push(name);
            }
        }
    }

    Ok(translation)
}
