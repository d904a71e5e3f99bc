//! GitHub REST implementation of [`Platform`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

use super::retry::{self, retrying, RetryPolicy};
use super::{Endpoint, Page, Platform, RawPublicKey, SecretKind, UpsertRequest};
use crate::core::config::Settings;
use crate::core::constants::{self, REQUEST_TIMEOUT};
use crate::core::domain::{Repository, Secret, UpsertStatus};
use crate::error::ApiError;

/// REST client bound to one API base URL, token and secret family.
pub struct GitHub {
    http: reqwest::Client,
    base: Url,
    token: Zeroizing<String>,
    kind: SecretKind,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct SecretsResponse {
    total_count: usize,
    secrets: Vec<Secret>,
}

#[derive(Deserialize)]
struct RepositoriesResponse {
    total_count: usize,
    repositories: Vec<Repository>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GitHub {
    /// Build a client from resolved settings.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` if the HTTP client cannot be constructed.
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(constants::ACCEPT));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(constants::API_VERSION),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("secret-migrator/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base: settings.api_url.clone(),
            token: Zeroizing::new(settings.token().to_string()),
            kind: settings.kind,
            retry: settings.retry.clone(),
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(self.token.as_str())
    }

    /// Send a request, retrying transient failures, and return the
    /// successful response.
    async fn send(
        &self,
        method: Method,
        endpoint: Endpoint<'_>,
        page: Option<u32>,
        body: Option<&UpsertRequest>,
    ) -> Result<Response, ApiError> {
        let path = endpoint.path(self.kind);
        let url = endpoint.url(&self.base, self.kind, page.map(|p| (self.page_size(), p)))?;

        retrying(&self.retry, || async {
            debug!(method = %method, path = %path, "api request");
            let mut request = self.request(method.clone(), url.clone());
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => Ok(response),
                Ok(response) => Err(classify(&path, response).await),
                Err(e) if e.is_builder() => Err(ApiError::Client(e.to_string())),
                Err(e) => Err(ApiError::Transient {
                    endpoint: path.clone(),
                    message: e.to_string(),
                }),
            }
        })
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint<'_>,
        page: Option<u32>,
    ) -> Result<T, ApiError> {
        let response = self.send(Method::GET, endpoint, page, None).await?;
        response.json::<T>().await.map_err(|e| ApiError::Decode {
            endpoint: endpoint.path(self.kind),
            message: e.to_string(),
        })
    }
}

/// Map a non-success response onto the error taxonomy.
async fn classify(path: &str, response: Response) -> ApiError {
    let status = response.status();
    let retry_after = retry::retry_after(response.headers());
    let quota_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);

    let endpoint = path.to_string();
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound { endpoint },
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited {
            endpoint,
            retry_after,
        },
        StatusCode::FORBIDDEN
            if quota_exhausted
                || retry_after.is_some()
                || message.to_ascii_lowercase().contains("rate limit") =>
        {
            ApiError::RateLimited {
                endpoint,
                retry_after,
            }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Authentication {
            endpoint,
            status: status.as_u16(),
            message,
        },
        s if s.is_server_error() => ApiError::Transient {
            endpoint,
            message: format!("{}: {}", s, message),
        },
        s => ApiError::Status {
            endpoint,
            status: s.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl Platform for GitHub {
    async fn secrets_page(&self, org: &str, page: u32) -> Result<Page<Secret>, ApiError> {
        let response: SecretsResponse = self.get_json(Endpoint::Secrets { org }, Some(page)).await?;
        Ok(Page {
            total_count: response.total_count,
            items: response.secrets,
        })
    }

    async fn selected_repositories_page(
        &self,
        org: &str,
        secret: &str,
        page: u32,
    ) -> Result<Page<Repository>, ApiError> {
        let response: RepositoriesResponse = self
            .get_json(Endpoint::SecretRepositories { org, name: secret }, Some(page))
            .await?;
        Ok(Page {
            total_count: response.total_count,
            items: response.repositories,
        })
    }

    async fn repository(&self, owner: &str, name: &str) -> Result<Option<Repository>, ApiError> {
        match self.get_json(Endpoint::Repository { owner, name }, None).await {
            Ok(repository) => Ok(Some(repository)),
            Err(ApiError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn public_key(&self, org: &str) -> Result<RawPublicKey, ApiError> {
        self.get_json(Endpoint::PublicKey { org }, None).await
    }

    async fn put_secret(
        &self,
        org: &str,
        name: &str,
        request: &UpsertRequest,
    ) -> Result<UpsertStatus, ApiError> {
        let response = self
            .send(Method::PUT, Endpoint::Secret { org, name }, None, Some(request))
            .await?;

        Ok(match response.status() {
            StatusCode::CREATED => UpsertStatus::Created,
            _ => UpsertStatus::Updated,
        })
    }
}
