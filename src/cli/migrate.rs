//! Migrate command.
//!
//! Re-creates every secret of the source organization in the destination.

use std::io::IsTerminal;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::output;
use crate::cli::{GlobalArgs, MigrateArgs, RunStatus};
use crate::core::config::{Overrides, Settings};
use crate::core::domain::{MigrationReport, MigrationState, SecretOutcome};
use crate::core::migrate::{MigrateOptions, Migrator};
use crate::core::owner;
use crate::core::platform::GitHub;
use crate::core::values::ValueSource;
use crate::error::{Error, Result};

/// Migrate secrets between organizations.
pub fn execute(global: &GlobalArgs, args: MigrateArgs) -> Result<RunStatus> {
    let settings = Settings::load(&Overrides::from(global))?;
    let source = match args.source_org.clone() {
        Some(org) => org,
        None => owner::current_owner()?,
    };

    let values = match &args.values {
        Some(path) => ValueSource::load(path)?,
        None => ValueSource::empty(),
    };
    if values.is_empty() && !args.json {
        output::warn("no secret values supplied; every secret will fail with value unavailable");
        output::hint("pass --values <FILE> with NAME=value lines");
    }

    if needs_confirmation(&args, std::io::stdin().is_terminal()) {
        let proceed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Migrate {} secrets from {} to {}?",
                settings.kind.segment(),
                output::key(&source),
                output::key(&args.dest)
            ))
            .default(false)
            .interact()?;
        if !proceed {
            output::dimmed("aborted");
            return Ok(RunStatus::Clean);
        }
    }

    let client = GitHub::new(&settings)?;
    let options = MigrateOptions {
        source,
        destination: args.dest,
        concurrency: settings.concurrency,
        key_max_age: settings.key_max_age,
        dry_run: args.dry_run,
    };

    let json = args.json;
    let migrator = Migrator::new(&client, &values, options).on_progress(move |outcome| {
        if !json {
            print_outcome(outcome);
        }
    });

    let runtime = super::runtime()?;
    let result = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let watcher = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, finishing secrets in flight");
                watcher.cancel();
            }
        });
        migrator.run(&cancel).await
    });

    let report = match result {
        Ok(report) => report,
        Err(Error::Aborted { report, source }) => {
            emit(&report, json)?;
            return Err(*source);
        }
        Err(e) => return Err(e),
    };
    emit(&report, json)?;

    Ok(if report.is_clean() {
        RunStatus::Clean
    } else {
        RunStatus::Partial
    })
}

/// Writing runs ask first on a terminal; `--json` only changes the output.
fn needs_confirmation(args: &MigrateArgs, interactive: bool) -> bool {
    interactive && !args.yes && !args.dry_run
}

fn emit(report: &MigrationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_summary(report);
    }
    Ok(())
}

fn print_outcome(outcome: &SecretOutcome) {
    let name = output::key(&outcome.name);
    match (&outcome.cause, outcome.state) {
        (Some(cause), _) => output::failure(&format!("{}: {}", name, cause)),
        (None, MigrationState::Encrypted) => {
            output::success(&format!("{} ready (dry run)", name))
        }
        (None, _) => output::success(&format!(
            "{} {}",
            name,
            match outcome.upsert {
                Some(status) => format!("{:?}", status).to_lowercase(),
                None => outcome.state.to_string(),
            }
        )),
    }

    for repo in &outcome.dropped_repositories {
        output::warn(&format!("  {} not found in destination, dropped", repo));
    }
}

fn print_summary(report: &MigrationReport) {
    output::section(if report.dry_run {
        "Dry run summary"
    } else {
        "Migration summary"
    });
    output::kv("source     ", &report.source);
    output::kv("destination", &report.destination);
    output::kv("secrets    ", report.outcomes.len());
    output::kv("succeeded  ", report.succeeded());
    output::kv("failed     ", report.failed());
    output::kv("dropped    ", report.dropped_repositories());

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!();
        output::header("Failed secrets");
        for outcome in failures {
            let at = outcome
                .failed_at
                .map(|state| format!(" after {}", state))
                .unwrap_or_default();
            if let Some(cause) = &outcome.cause {
                output::list_item(&format!("{}{}: {}", outcome.name, at, cause));
            }
        }
    }
}
