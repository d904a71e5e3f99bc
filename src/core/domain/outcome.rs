//! Per-secret migration outcomes and the run report.

use serde::Serialize;

use super::Visibility;
use crate::core::types::{OrgName, RepositoryId, SecretName};

/// Per-secret progress: `Discovered → ScopeResolved → Encrypted → Upserted`,
/// or `Failed` from any step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    Discovered,
    ScopeResolved,
    Encrypted,
    Upserted,
    Failed,
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Discovered => "discovered",
            Self::ScopeResolved => "scope resolved",
            Self::Encrypted => "encrypted",
            Self::Upserted => "upserted",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why a single secret did not reach its final state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureCause {
    ScopeResolution(String),
    ValueUnavailable,
    Encryption(String),
    Upsert(String),
    Cancelled,
    /// This secret hit the run-level failure that stopped the run.
    Aborted(String),
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScopeResolution(e) => write!(f, "scope resolution failed: {}", e),
            Self::ValueUnavailable => write!(f, "no value supplied (the source never exposes it)"),
            Self::Encryption(e) => write!(f, "encryption failed: {}", e),
            Self::Upsert(e) => write!(f, "upsert failed: {}", e),
            Self::Cancelled => write!(f, "cancelled before start"),
            Self::Aborted(e) => write!(f, "run aborted: {}", e),
        }
    }
}

/// Result of the destination's create-or-update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertStatus {
    Created,
    Updated,
}

/// Final record for one secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretOutcome {
    pub name: SecretName,
    pub visibility: Visibility,
    pub state: MigrationState,
    /// Last state reached before failing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<MigrationState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<FailureCause>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repository_ids: Vec<RepositoryId>,
    /// Source repositories with no counterpart in the destination.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_repositories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<UpsertStatus>,
}

impl SecretOutcome {
    pub(crate) fn discovered(name: impl Into<SecretName>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            state: MigrationState::Discovered,
            failed_at: None,
            cause: None,
            repository_ids: Vec::new(),
            dropped_repositories: Vec::new(),
            upsert: None,
        }
    }

    pub(crate) fn advance(&mut self, state: MigrationState) {
        self.state = state;
    }

    pub(crate) fn fail(mut self, cause: FailureCause) -> Self {
        self.failed_at = Some(self.state);
        self.state = MigrationState::Failed;
        self.cause = Some(cause);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.state == MigrationState::Failed
    }
}

/// Everything a migration run did, in source listing order.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub source: OrgName,
    pub destination: OrgName,
    pub dry_run: bool,
    pub started_at: String,
    pub outcomes: Vec<SecretOutcome>,
}

impl MigrationReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_failed()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SecretOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn dropped_repositories(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| o.dropped_repositories.len())
            .sum()
    }

    /// No secret failed.
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}
