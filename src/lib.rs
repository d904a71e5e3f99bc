//! secret-migrator - move organization secrets between GitHub organizations.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── export        # Write secret metadata to CSV
//! │   ├── migrate       # Re-create secrets in another organization
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # Settings (flags > env > .secret-migrator.toml > defaults)
//!     ├── platform/     # Platform trait, typed endpoints, REST client, retry
//!     ├── resolver      # Repository name → id, cached per run
//!     ├── scope         # Selected-repository list translation
//!     ├── cipher        # Public key fetch and sealed-box encryption
//!     ├── migrate       # Per-secret state machine and run report
//!     ├── export        # CSV export sink
//!     ├── values        # Supplementary plaintext values
//!     └── domain/       # Secret, Repository, PublicKey, outcomes
//! ```
//!
//! # Values
//!
//! The platform never returns the plaintext of an existing secret. Without a
//! values file a run can read metadata and scope, but it will not upload a
//! secret it has no value for.

pub mod cli;
pub mod core;
pub mod error;
