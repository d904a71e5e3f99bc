//! In-memory platform.
//!
//! Holds secrets, repositories and keys per organization, records every
//! write, and can be told to fail specific calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use secret_migrator::core::domain::{PublicKey, Repository, Secret, UpsertStatus, Visibility};
use secret_migrator::core::platform::{Page, Platform, RawPublicKey, UpsertRequest};
use secret_migrator::error::ApiError;

use super::fixtures::encoded;

/// A failure to inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Transient,
    Unauthorized,
    Status(u16),
}

impl Fault {
    fn error(self, endpoint: &str) -> ApiError {
        let endpoint = endpoint.to_string();
        match self {
            Fault::Transient => ApiError::Transient {
                endpoint,
                message: "connection reset".to_string(),
            },
            Fault::Unauthorized => ApiError::Authentication {
                endpoint,
                status: 401,
                message: "Bad credentials".to_string(),
            },
            Fault::Status(status) => ApiError::Status {
                endpoint,
                status,
                message: "rejected".to_string(),
            },
        }
    }
}

/// One recorded create-or-update call.
#[derive(Debug, Clone)]
pub struct Put {
    pub org: String,
    pub name: String,
    pub request: UpsertRequest,
}

#[derive(Default)]
struct State {
    secrets: HashMap<String, Vec<Secret>>,
    selected: HashMap<(String, String), Vec<Repository>>,
    repositories: HashMap<(String, String), Repository>,
    keys: HashMap<String, Vec<RawPublicKey>>,
    stored: HashMap<(String, String), UpsertRequest>,
    puts: Vec<Put>,
    lookups: HashMap<(String, String), usize>,
    secret_faults: HashMap<String, Fault>,
    scope_faults: HashMap<(String, String), Fault>,
    repository_faults: HashMap<(String, String), (Fault, usize)>,
    key_faults: HashMap<String, Fault>,
    put_faults: HashMap<String, Fault>,
}

fn key(a: &str, b: &str) -> (String, String) {
    (a.to_ascii_lowercase(), b.to_ascii_lowercase())
}

/// In-memory [`Platform`].
pub struct MockPlatform {
    state: Mutex<State>,
    page_size: u32,
    lookup_delay: Duration,
    key_fetches: AtomicUsize,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: 100,
            lookup_delay: Duration::ZERO,
            key_fetches: AtomicUsize::new(0),
        }
    }

    /// Serve listings in pages of `size`.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Delay every repository lookup.
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = delay;
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("mock state poisoned")
    }

    /// Add a secret with `all` or `private` visibility.
    pub fn secret(self, org: &str, name: &str, visibility: Visibility) -> Self {
        self.state()
            .secrets
            .entry(org.to_ascii_lowercase())
            .or_default()
            .push(Secret::new(name, visibility));
        self
    }

    /// Add a `selected` secret applying to `repos`, which are created in
    /// `org` with ids starting at 1000.
    pub fn selected_secret(self, org: &str, name: &str, repos: &[&str]) -> Self {
        let scope: Vec<Repository> = repos
            .iter()
            .map(|repo| self.ensure_repository(org, repo))
            .collect();
        {
            let mut state = self.state();
            state
                .secrets
                .entry(org.to_ascii_lowercase())
                .or_default()
                .push(Secret::new(name, Visibility::Selected));
            state.selected.insert(key(org, name), scope);
        }
        self
    }

    fn ensure_repository(&self, org: &str, name: &str) -> Repository {
        let mut state = self.state();
        let next = 1000 + state.repositories.len() as u64;
        state
            .repositories
            .entry(key(org, name))
            .or_insert_with(|| Repository::new(next, name))
            .clone()
    }

    /// Add a repository with a fixed id.
    pub fn repository(self, org: &str, name: &str, id: u64) -> Self {
        self.state()
            .repositories
            .insert(key(org, name), Repository::new(id, name));
        self
    }

    /// Serve `public` as the organization's key. Later keys are served on
    /// later fetches; the last one repeats.
    pub fn key(self, org: &str, public: &PublicKey) -> Self {
        let raw = RawPublicKey {
            key_id: public.key_id().to_string(),
            key: encoded(public),
        };
        self.raw_key(org, raw)
    }

    /// Serve a raw key payload as-is.
    pub fn raw_key(self, org: &str, raw: RawPublicKey) -> Self {
        self.state()
            .keys
            .entry(org.to_ascii_lowercase())
            .or_default()
            .push(raw);
        self
    }

    /// Mark a secret as already present in `org`.
    pub fn existing(self, org: &str, name: &str) -> Self {
        let placeholder = UpsertRequest {
            encrypted_value: String::new(),
            key_id: String::new(),
            visibility: Visibility::All,
            selected_repository_ids: None,
        };
        self.state().stored.insert(key(org, name), placeholder);
        self
    }

    pub fn fail_secrets(self, org: &str, fault: Fault) -> Self {
        self.state()
            .secret_faults
            .insert(org.to_ascii_lowercase(), fault);
        self
    }

    pub fn fail_scope(self, org: &str, secret: &str, fault: Fault) -> Self {
        self.state().scope_faults.insert(key(org, secret), fault);
        self
    }

    /// Fail the next `times` lookups of `org/name`.
    pub fn fail_repository(self, org: &str, name: &str, fault: Fault, times: usize) -> Self {
        self.state()
            .repository_faults
            .insert(key(org, name), (fault, times));
        self
    }

    pub fn fail_key(self, org: &str, fault: Fault) -> Self {
        self.state().key_faults.insert(org.to_ascii_lowercase(), fault);
        self
    }

    /// Fail every upsert of secret `name`.
    pub fn fail_put(self, name: &str, fault: Fault) -> Self {
        self.state()
            .put_faults
            .insert(name.to_ascii_uppercase(), fault);
        self
    }

    /// Every upsert call so far, in call order.
    pub fn puts(&self) -> Vec<Put> {
        self.state().puts.clone()
    }

    /// Upsert call for `name`, if any.
    pub fn put_for(&self, name: &str) -> Option<Put> {
        self.state()
            .puts
            .iter()
            .rev()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Lookups of `org/name` that reached the platform.
    pub fn lookups_of(&self, org: &str, name: &str) -> usize {
        self.state()
            .lookups
            .get(&key(org, name))
            .copied()
            .unwrap_or(0)
    }

    /// All repository lookups that reached the platform.
    pub fn total_lookups(&self) -> usize {
        self.state().lookups.values().sum()
    }

    pub fn key_fetches(&self) -> usize {
        self.key_fetches.load(Ordering::SeqCst)
    }

    fn page<T: Clone>(&self, items: &[T], page: u32) -> Page<T> {
        let size = self.page_size as usize;
        let start = (page.saturating_sub(1) as usize) * size;
        Page {
            total_count: items.len(),
            items: items.iter().skip(start).take(size).cloned().collect(),
        }
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn secrets_page(&self, org: &str, page: u32) -> Result<Page<Secret>, ApiError> {
        let state = self.state();
        if let Some(fault) = state.secret_faults.get(&org.to_ascii_lowercase()) {
            return Err(fault.error(&format!("/orgs/{}/actions/secrets", org)));
        }
        let secrets = state
            .secrets
            .get(&org.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default();
        Ok(self.page(&secrets, page))
    }

    async fn selected_repositories_page(
        &self,
        org: &str,
        secret: &str,
        page: u32,
    ) -> Result<Page<Repository>, ApiError> {
        let state = self.state();
        let endpoint = format!("/orgs/{}/actions/secrets/{}/repositories", org, secret);
        if let Some(fault) = state.scope_faults.get(&key(org, secret)) {
            return Err(fault.error(&endpoint));
        }
        let repositories = state
            .selected
            .get(&key(org, secret))
            .cloned()
            .ok_or(ApiError::NotFound { endpoint })?;
        Ok(self.page(&repositories, page))
    }

    async fn repository(&self, owner: &str, name: &str) -> Result<Option<Repository>, ApiError> {
        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }

        let mut state = self.state();
        *state.lookups.entry(key(owner, name)).or_default() += 1;

        if let Some((fault, remaining)) = state.repository_faults.get_mut(&key(owner, name)) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(fault.error(&format!("/repos/{}/{}", owner, name)));
            }
        }

        Ok(state.repositories.get(&key(owner, name)).cloned())
    }

    async fn public_key(&self, org: &str) -> Result<RawPublicKey, ApiError> {
        let fetch = self.key_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        let endpoint = format!("/orgs/{}/actions/secrets/public-key", org);
        if let Some(fault) = state.key_faults.get(&org.to_ascii_lowercase()) {
            return Err(fault.error(&endpoint));
        }
        let keys = state
            .keys
            .get(&org.to_ascii_lowercase())
            .ok_or(ApiError::NotFound {
                endpoint: endpoint.clone(),
            })?;
        keys.get(fetch.min(keys.len().saturating_sub(1)))
            .cloned()
            .ok_or(ApiError::NotFound { endpoint })
    }

    async fn put_secret(
        &self,
        org: &str,
        name: &str,
        request: &UpsertRequest,
    ) -> Result<UpsertStatus, ApiError> {
        let mut state = self.state();
        if let Some(fault) = state.put_faults.get(&name.to_ascii_uppercase()) {
            return Err(fault.error(&format!("/orgs/{}/actions/secrets/{}", org, name)));
        }

        state.puts.push(Put {
            org: org.to_string(),
            name: name.to_string(),
            request: request.clone(),
        });
        let previous = state.stored.insert(key(org, name), request.clone());
        Ok(match previous {
            Some(_) => UpsertStatus::Updated,
            None => UpsertStatus::Created,
        })
    }
}
