//! Typed REST endpoints.
//!
//! Every URL is built from path segments against the configured base URL.
//! Segments are percent-encoded by `Url`, so names are never spliced into
//! strings and no URL returned by the API is rewritten.

use reqwest::Url;

use super::SecretKind;
use crate::error::ApiError;

/// A REST resource addressed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// `GET /orgs/{org}/{kind}/secrets`
    Secrets { org: &'a str },
    /// `GET /orgs/{org}/{kind}/secrets/public-key`
    PublicKey { org: &'a str },
    /// `PUT /orgs/{org}/{kind}/secrets/{name}`
    Secret { org: &'a str, name: &'a str },
    /// `GET /orgs/{org}/{kind}/secrets/{name}/repositories`
    SecretRepositories { org: &'a str, name: &'a str },
    /// `GET /repos/{owner}/{name}`
    Repository { owner: &'a str, name: &'a str },
}

impl<'a> Endpoint<'a> {
    fn segments(&self, kind: SecretKind) -> Vec<&'a str> {
        let kind = kind.segment();
        match *self {
            Self::Secrets { org } => vec!["orgs", org, kind, "secrets"],
            Self::PublicKey { org } => vec!["orgs", org, kind, "secrets", "public-key"],
            Self::Secret { org, name } => vec!["orgs", org, kind, "secrets", name],
            Self::SecretRepositories { org, name } => {
                vec!["orgs", org, kind, "secrets", name, "repositories"]
            }
            Self::Repository { owner, name } => vec!["repos", owner, name],
        }
    }

    /// Unencoded path, for logs and error messages.
    pub fn path(&self, kind: SecretKind) -> String {
        format!("/{}", self.segments(kind).join("/"))
    }

    /// Absolute URL under `base`, with `per_page`/`page` when paginating.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Client` if `base` cannot carry a path.
    pub fn url(&self, base: &Url, kind: SecretKind, page: Option<(u32, u32)>) -> Result<Url, ApiError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Client(format!("invalid API base URL: {}", base)))?
            .pop_if_empty()
            .extend(self.segments(kind));

        if let Some((per_page, page)) = page {
            url.query_pairs_mut()
                .append_pair("per_page", &per_page.to_string())
                .append_pair("page", &page.to_string());
        }

        Ok(url)
    }
}
