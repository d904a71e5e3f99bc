//! Domain types.

mod outcome;
mod public_key;
mod repository;
mod secret;

pub use outcome::{FailureCause, MigrationReport, MigrationState, SecretOutcome, UpsertStatus};
pub use public_key::PublicKey;
pub use repository::Repository;
pub use secret::{Secret, Visibility};
