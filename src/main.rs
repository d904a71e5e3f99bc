//! secret-migrator - migrate organization secrets between GitHub organizations.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use secret_migrator::cli::output;
use secret_migrator::cli::{execute, Cli, RunStatus};
use secret_migrator::core::constants::{EXIT_PARTIAL, LOG_ENV};
use secret_migrator::error::{ApiError, ConfigError, Error, KeyError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("secret_migrator=debug")
        } else {
            EnvFilter::new("secret_migrator=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match execute(cli) {
        Ok(RunStatus::Clean) => {}
        Ok(RunStatus::Partial) => std::process::exit(EXIT_PARTIAL),
        Err(e) => {
            let suggestion = match &e {
                Error::Config(ConfigError::MissingToken) => {
                    Some("set GITHUB_TOKEN or GH_TOKEN to a token with admin:org scope")
                }
                Error::Config(ConfigError::NoSourceOrganization(_)) => {
                    Some("pass --source-org <ORG>")
                }
                Error::Api(ApiError::Authentication { .. }) => {
                    Some("check that the token is valid and has admin:org scope")
                }
                Error::Key(KeyError::Unavailable { .. }) => {
                    Some("check that the destination organization exists and the token can administer it")
                }
                _ => None,
            };

            output::error(&e.to_string());
            if let Some(hint) = suggestion {
                output::hint(hint);
            }
            std::process::exit(1);
        }
    }
}
