//! Repository type.

use serde::{Deserialize, Serialize};

use crate::core::types::{RepoName, RepositoryId};

/// A repository as seen from one organization.
///
/// `id` is only meaningful within the organization it was fetched from;
/// the Resolver maps names across organizations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    pub name: RepoName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl Repository {
    pub fn new(id: RepositoryId, name: impl Into<RepoName>) -> Self {
        Self {
            id,
            name: name.into(),
            full_name: None,
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.full_name {
            Some(full) => write!(f, "{}", full),
            None => write!(f, "{}", self.name),
        }
    }
}
