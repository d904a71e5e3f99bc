//! Current repository owner detection.
//!
//! When no source organization is given, the owner of the repository in the
//! working directory is used: `GH_REPO` first, then the `origin` remote.

use std::process::Command;

use tracing::debug;

use crate::core::constants::REPO_ENV;
use crate::core::types::OrgName;
use crate::error::{ConfigError, Result};

/// Owner of the current repository.
///
/// # Errors
///
/// Returns `ConfigError::NoSourceOrganization` if neither `GH_REPO` nor the
/// `origin` remote names an owner.
pub fn current_owner() -> Result<OrgName> {
    if let Ok(spec) = std::env::var(REPO_ENV) {
        if let Some(owner) = parse_repo_spec(&spec) {
            debug!(owner = %owner, "owner from {}", REPO_ENV);
            return Ok(owner);
        }
    }

    let git = which::which("git").map_err(|_| {
        ConfigError::NoSourceOrganization("git not found; pass --source-org".to_string())
    })?;

    let output = Command::new(git)
        .args(["remote", "get-url", "origin"])
        .output()?;

    if !output.status.success() {
        return Err(ConfigError::NoSourceOrganization(
            "no origin remote in the current directory; pass --source-org".to_string(),
        )
        .into());
    }

    let remote = String::from_utf8_lossy(&output.stdout);
    let owner = parse_remote_owner(remote.trim()).ok_or_else(|| {
        ConfigError::NoSourceOrganization(format!("cannot parse remote url: {}", remote.trim()))
    })?;

    debug!(owner = %owner, "owner from origin remote");
    Ok(owner)
}

/// Owner from `owner/repo` or `host/owner/repo`.
pub fn parse_repo_spec(spec: &str) -> Option<OrgName> {
    let parts: Vec<&str> = spec.trim().split('/').collect();
    match parts.as_slice() {
        [owner, repo] | [_, owner, repo] if !owner.is_empty() && !repo.is_empty() => {
            Some(owner.to_string())
        }
        _ => None,
    }
}

/// Owner from an https, ssh or scp-style remote URL.
pub fn parse_remote_owner(remote: &str) -> Option<OrgName> {
    let remote = remote.trim().trim_end_matches('/');
    let remote = remote.strip_suffix(".git").unwrap_or(remote);

    let path = match remote.split_once("://") {
        Some((_, rest)) => rest.split_once('/')?.1,
        None => remote.split_once(':')?.1,
    };

    let mut segments = path.trim_start_matches('/').split('/');
    let owner = segments.next()?;
    let repo = segments.next()?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some(owner.to_string())
}
