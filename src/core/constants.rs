//! Constants used throughout secret-migrator.
//!
//! Centralizes magic strings and configuration values.

use std::time::Duration;

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// REST API version pinned in every request.
pub const API_VERSION: &str = "2022-11-28";

/// Media type requested from the API.
pub const ACCEPT: &str = "application/vnd.github+json";

/// Optional configuration file in the working directory.
pub const CONFIG_FILE: &str = ".secret-migrator.toml";

/// Environment variable consulted for the log filter.
pub const LOG_ENV: &str = "SECRET_MIGRATOR_LOG";

/// Environment variables holding the API token, in lookup order.
pub const TOKEN_ENV: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

/// Environment variable naming an `owner/repo` to use as the current repository.
pub const REPO_ENV: &str = "GH_REPO";

/// Largest page the API serves.
pub const PAGE_SIZE: u32 = 100;

/// Default number of secrets migrated concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default retry attempts after the first failure.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff.
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(500);

/// Upper bound for a single backoff delay.
pub const RETRY_CAP: Duration = Duration::from_secs(30);

/// Public keys older than this are fetched again before sealing.
pub const DEFAULT_KEY_MAX_AGE: Duration = Duration::from_secs(300);

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default export file.
pub const DEFAULT_EXPORT_FILE: &str = "secrets.csv";

/// Export file header. The value column is always empty.
pub const EXPORT_HEADER: [&str; 5] = [
    "organization",
    "name",
    "visibility",
    "selected repositories",
    "value",
];

/// Raw public key length in bytes (X25519).
pub const PUBLIC_KEY_LEN: usize = 32;

/// Process exit code when the run finished with per-secret failures.
pub const EXIT_PARTIAL: i32 = 2;
