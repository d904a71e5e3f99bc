//! Secret migration orchestration.
//!
//! Drives every source secret through
//! `Discovered → ScopeResolved → Encrypted → Upserted`, isolating per-secret
//! failures. Only run-level failures (listing the source, authentication,
//! an unusable destination key) abort the run.
//!
//! A run-level failure met while secrets are in flight stops new secrets from
//! starting, lets the in-flight ones finish, and surfaces as
//! [`Error::Aborted`] carrying the partial report.
//!
//! The platform never returns the value of an existing secret. Metadata and
//! scope come from the source; the value must come from a [`ValueSource`].
//! A secret without a supplied value fails with
//! [`FailureCause::ValueUnavailable`] and nothing is uploaded for it.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::cipher::{self, KeyCache};
use crate::core::domain::{FailureCause, MigrationReport, MigrationState, Secret, SecretOutcome};
use crate::core::platform::{self, Platform, UpsertRequest};
use crate::core::resolver::Resolver;
use crate::core::scope::{self, SelectedRepositoriesRef};
use crate::core::types::OrgName;
use crate::core::values::ValueSource;
use crate::error::{Error, Result};

/// What to migrate and how.
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub source: OrgName,
    pub destination: OrgName,
    pub concurrency: usize,
    pub key_max_age: Duration,
    /// Resolve scopes and encrypt, but do not upsert.
    pub dry_run: bool,
}

type Progress<'a> = Box<dyn Fn(&SecretOutcome) + Send + Sync + 'a>;

/// A run-level failure, with the outcome of the secret that hit it.
struct Fatal {
    outcome: SecretOutcome,
    error: Error,
}

impl Fatal {
    fn new(outcome: SecretOutcome, error: impl Into<Error>) -> Self {
        let error = error.into();
        Self {
            outcome: outcome.fail(FailureCause::Aborted(error.to_string())),
            error,
        }
    }
}

/// One migration run. Owns the run-scoped resolution cache and key.
pub struct Migrator<'a> {
    platform: &'a dyn Platform,
    resolver: Resolver<'a>,
    keys: KeyCache,
    values: &'a ValueSource,
    options: MigrateOptions,
    progress: Option<Progress<'a>>,
}

impl<'a> Migrator<'a> {
    pub fn new(platform: &'a dyn Platform, values: &'a ValueSource, options: MigrateOptions) -> Self {
        Self {
            platform,
            resolver: Resolver::new(platform),
            keys: KeyCache::new(options.destination.clone(), options.key_max_age),
            values,
            options,
            progress: None,
        }
    }

    /// Call `f` as each secret reaches its final state.
    pub fn on_progress(mut self, f: impl Fn(&SecretOutcome) + Send + Sync + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn resolver(&self) -> &Resolver<'a> {
        &self.resolver
    }

    pub fn keys(&self) -> &KeyCache {
        &self.keys
    }

    /// Migrate every secret of the source organization.
    ///
    /// Secrets not yet started when `cancel` fires are recorded as cancelled;
    /// those in flight finish.
    ///
    /// # Errors
    ///
    /// Returns an error only for run-level failures; per-secret failures are
    /// recorded in the report. A run-level failure after the first secret
    /// started is [`Error::Aborted`], holding the outcomes recorded so far.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<MigrationReport> {
        let started_at = chrono::Utc::now().to_rfc3339();
        let MigrateOptions {
            source,
            destination,
            ..
        } = &self.options;

        info!(source = %source, destination = %destination, "listing secrets");
        let secrets = platform::list_secrets(self.platform, source).await?;
        info!(count = secrets.len(), "found secrets");

        // Fail fast if the destination key is unusable.
        self.keys.current(self.platform).await?;

        let halt = cancel.child_token();
        let halt = &halt;
        let mut pending = stream::iter(secrets.iter().enumerate())
            .map(|(index, secret)| async move { (index, self.migrate_one(secret, halt).await) })
            .buffer_unordered(self.options.concurrency.max(1));

        let mut outcomes = Vec::with_capacity(secrets.len());
        let mut fatal = None;
        while let Some((index, result)) = pending.next().await {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(Fatal { outcome, error }) => {
                    if fatal.is_none() {
                        warn!(secret = %outcome.name, error = %error, "run-level failure, stopping");
                        halt.cancel();
                        fatal = Some(error);
                    }
                    outcome
                }
            };
            if let Some(progress) = &self.progress {
                progress(&outcome);
            }
            outcomes.push((index, outcome));
        }
        outcomes.sort_by_key(|(index, _)| *index);

        let report = MigrationReport {
            source: source.clone(),
            destination: destination.clone(),
            dry_run: self.options.dry_run,
            started_at,
            outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        };

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            dropped_repositories = report.dropped_repositories(),
            lookups = self.resolver.lookups(),
            "migration finished"
        );

        match fatal {
            Some(error) => Err(Error::Aborted {
                report: Box::new(report),
                source: Box::new(error),
            }),
            None => Ok(report),
        }
    }

    /// Drive one secret to its final state.
    ///
    /// `Err` is reserved for run-level failures.
    async fn migrate_one(
        &self,
        secret: &Secret,
        cancel: &CancellationToken,
    ) -> std::result::Result<SecretOutcome, Fatal> {
        let mut outcome = SecretOutcome::discovered(secret.name(), secret.visibility());
        if cancel.is_cancelled() {
            return Ok(outcome.fail(FailureCause::Cancelled));
        }
        info!(secret = %secret, visibility = %secret.visibility(), "migrating secret");

        let selected_repository_ids = if secret.is_selected() {
            let reference = SelectedRepositoriesRef {
                org: &self.options.source,
                secret: secret.name(),
            };
            let translated = scope::translate(
                &self.resolver,
                reference,
                &self.options.destination,
                self.options.concurrency,
            )
            .await;

            match translated {
                Ok(translation) => {
                    outcome.repository_ids = translation.repository_ids.clone();
                    outcome.dropped_repositories = translation.dropped;
                    Some(translation.repository_ids)
                }
                Err(e) if e.is_fatal() => return Err(Fatal::new(outcome, e)),
                Err(e) => {
                    warn!(secret = %secret, error = %e, "scope resolution failed");
                    return Ok(outcome.fail(FailureCause::ScopeResolution(e.to_string())));
                }
            }
        } else {
            None
        };
        outcome.advance(MigrationState::ScopeResolved);

        let Some(value) = self.values.get(secret.name()) else {
            warn!(secret = %secret, "no value supplied, not uploading");
            return Ok(outcome.fail(FailureCause::ValueUnavailable));
        };

        let key = match self.keys.current(self.platform).await {
            Ok(key) => key,
            Err(e) => return Err(Fatal::new(outcome, e)),
        };
        let sealed = match cipher::seal(value, &key) {
            Ok(sealed) => sealed,
            Err(e) => return Ok(outcome.fail(FailureCause::Encryption(e.to_string()))),
        };
        outcome.advance(MigrationState::Encrypted);

        if self.options.dry_run {
            info!(secret = %secret, "dry run, skipping upsert");
            return Ok(outcome);
        }

        let request = UpsertRequest {
            encrypted_value: sealed.encrypted_value,
            key_id: sealed.key_id,
            visibility: secret.visibility(),
            selected_repository_ids,
        };

        match self
            .platform
            .put_secret(&self.options.destination, secret.name(), &request)
            .await
        {
            Ok(status) => {
                info!(secret = %secret, status = ?status, "secret upserted");
                outcome.upsert = Some(status);
                outcome.advance(MigrationState::Upserted);
                Ok(outcome)
            }
            Err(e) if e.is_fatal() => Err(Fatal::new(outcome, e)),
            Err(e) => {
                warn!(secret = %secret, error = %e, "upsert failed");
                Ok(outcome.fail(FailureCause::Upsert(e.to_string())))
            }
        }
    }
}
