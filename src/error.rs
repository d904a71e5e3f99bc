//! Error types.
//!
//! A top-level [`Error`] wraps the domain-specific enums below. Run-level
//! failures are separated from per-secret failures by [`Error::is_fatal`].

use thiserror::Error;

use crate::core::domain::MigrationReport;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("prompt failed: {0}")]
    Dialog(#[from] dialoguer::Error),

    /// A run-level failure hit after secrets were already in flight.
    /// `report` holds every outcome recorded before the run stopped.
    #[error("migration aborted: {source}")]
    Aborted {
        report: Box<MigrationReport>,
        source: Box<Error>,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error must abort the whole run.
    ///
    /// Authentication failures and an unusable public key mean no secret can
    /// ever succeed; bad configuration means the run never really started.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::Api(e) => e.is_fatal(),
            Error::Key(e) => e.is_fatal(),
            Error::Aborted { .. } => true,
            _ => false,
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no API token found")]
    MissingToken,

    #[error("could not determine the source organization: {0}")]
    NoSourceOrganization(String),

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read values file {path}: {source}")]
    ValuesFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Hosting platform API errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transient failure calling {endpoint}: {message}")]
    Transient { endpoint: String, message: String },

    #[error("rate limited calling {endpoint}")]
    RateLimited {
        endpoint: String,
        retry_after: Option<std::time::Duration>,
    },

    #[error("authentication failed ({status}) calling {endpoint}: {message}")]
    Authentication {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("not found: {endpoint}")]
    NotFound { endpoint: String },

    #[error("request to {endpoint} failed ({status}): {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("incomplete listing from {endpoint}: expected {expected} items, received {received}")]
    IncompleteListing {
        endpoint: String,
        expected: usize,
        received: usize,
    },

    #[error("http client error: {0}")]
    Client(String),
}

impl ApiError {
    /// Only authentication failures end the run; the rest stay per-secret.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Authentication { .. })
    }

    /// Whether the failure may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Transient { .. } | ApiError::RateLimited { .. }
        )
    }
}

/// Public key and sealing errors.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("public key unavailable for {org}: {reason}")]
    Unavailable { org: String, reason: String },

    #[error("encryption failed: {0}")]
    Seal(String),
}

impl KeyError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, KeyError::Unavailable { .. })
    }
}

/// Export sink errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
