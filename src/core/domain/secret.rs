//! Secret type.
//!
//! The one canonical secret shape shared by export and migration. The
//! platform never returns a secret's value, so none is carried here.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Repository;
use crate::core::types::SecretName;

/// Which repositories an organization secret applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    All,
    Private,
    Selected,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Private => "private",
            Self::Selected => "selected",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An organization secret's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    name: SecretName,
    visibility: Visibility,
    #[serde(skip)]
    selected_repositories: Vec<Repository>,
}

impl Secret {
    pub fn new(name: impl Into<SecretName>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            selected_repositories: Vec::new(),
        }
    }

    /// Secret name as listed by the source
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_selected(&self) -> bool {
        self.visibility == Visibility::Selected
    }

    /// Source-side repositories for a `selected` secret; empty otherwise.
    pub fn selected_repositories(&self) -> &[Repository] {
        &self.selected_repositories
    }

    /// Attach the source-side repository list.
    ///
    /// Ignored unless the visibility is `selected`, so the list can never be
    /// populated for `all` or `private` secrets.
    pub fn set_selected_repositories(&mut self, repositories: Vec<Repository>) {
        if !self.is_selected() {
            warn!(
                secret = %self.name,
                visibility = %self.visibility,
                "ignoring repository list for non-selected secret"
            );
            return;
        }
        self.selected_repositories = repositories;
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
