//! Test support utilities for secret-migrator integration tests.
//!
//! Provides an in-memory platform, key fixtures and an isolated CLI
//! environment.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
pub mod mock;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use commands::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock::*;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with an isolated working directory.
///
/// No process-global state is mutated; child processes use `.current_dir()`
/// and explicit env vars so tests can safely run in parallel.
pub struct Test {
    /// Working directory for the command
    pub dir: TempDir,
    /// API base URL passed with `--api-url`
    pub api_url: String,
}

impl Test {
    /// Create a test environment talking to `api_url`.
    pub fn new(api_url: impl Into<String>) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self {
            dir,
            api_url: api_url.into(),
        }
    }

    /// Create a test environment that never reaches a server.
    pub fn offline() -> Self {
        Self::new("http://127.0.0.1:9")
    }

    /// Path inside the working directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write a file inside the working directory.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("failed to write file");
        path
    }

    /// Read a file inside the working directory.
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).expect("failed to read file")
    }
}
