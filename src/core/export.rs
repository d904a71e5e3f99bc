//! Export of secret metadata to CSV.
//!
//! One row per secret: organization, name, visibility, the space-joined
//! source repository names for `selected` secrets, and an always-empty value
//! column. Rows are written to a temporary file in the destination directory
//! which replaces the destination only once everything is flushed.

use std::path::Path;

use futures::stream::{self, StreamExt, TryStreamExt};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::core::constants::EXPORT_HEADER;
use crate::core::domain::Secret;
use crate::core::platform::{self, Platform};
use crate::core::scope::{self, SelectedRepositoriesRef};
use crate::error::{ExportError, Result};

/// List an organization's secrets with the source repositories of every
/// `selected` secret filled in.
///
/// # Errors
///
/// Any listing failure aborts the export.
pub async fn collect(platform: &dyn Platform, org: &str, concurrency: usize) -> Result<Vec<Secret>> {
    let secrets = platform::list_secrets(platform, org).await?;
    info!(org, count = secrets.len(), "found secrets");

    let secrets: Vec<Secret> = stream::iter(secrets)
        .map(|mut secret| async move {
            if secret.is_selected() {
                let reference = SelectedRepositoriesRef {
                    org,
                    secret: secret.name(),
                };
                let repositories = scope::source_repositories(platform, reference).await?;
                debug!(secret = %secret, repositories = repositories.len(), "collected scope");
                secret.set_selected_repositories(repositories);
            }
            Ok::<_, crate::error::Error>(secret)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    Ok(secrets)
}

/// CSV row for one secret.
pub fn row(org: &str, secret: &Secret) -> [String; 5] {
    let repositories = secret
        .selected_repositories()
        .iter()
        .map(|r| r.name.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    [
        org.to_string(),
        secret.name().to_string(),
        secret.visibility().to_string(),
        repositories,
        String::new(),
    ]
}

/// Write the export file, header first. Returns the number of rows.
///
/// # Errors
///
/// Returns `ExportError` if the file cannot be written or moved into place.
pub fn write_csv(path: &Path, org: &str, secrets: &[Secret]) -> Result<usize> {
    let write_error = |message: String| ExportError::Write {
        path: path.display().to_string(),
        message,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;

    {
        let mut writer = csv::Writer::from_writer(file.as_file_mut());
        writer
            .write_record(EXPORT_HEADER)
            .map_err(ExportError::from)?;
        for secret in secrets {
            writer
                .write_record(row(org, secret))
                .map_err(ExportError::from)?;
        }
        writer.flush().map_err(|e| write_error(e.to_string()))?;
    }

    file.as_file()
        .sync_all()
        .map_err(|e| write_error(e.to_string()))?;
    file.persist(path)
        .map_err(|e| write_error(e.error.to_string()))?;

    debug!(path = %path.display(), rows = secrets.len(), "export written");
    Ok(secrets.len())
}
