//! Command-line interface.

pub mod completions;
pub mod export;
pub mod migrate;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::config::Overrides;
use crate::core::constants::DEFAULT_EXPORT_FILE;
use crate::core::platform::SecretKind;
use crate::error::Result;

/// secret-migrator - move organization secrets between GitHub organizations.
#[derive(Parser)]
#[command(
    name = "secret-migrator",
    about = "Migrate organization secrets from one GitHub organization to another",
    version,
    after_help = "Reads the API token from GITHUB_TOKEN or GH_TOKEN."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every command.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// REST API base URL
    #[arg(long, global = true, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// Secret family to work on
    #[arg(long, global = true, value_enum)]
    pub kind: Option<SecretKind>,

    /// Secrets processed at once
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Retries for transient API failures
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,
}

impl From<&GlobalArgs> for Overrides {
    fn from(args: &GlobalArgs) -> Self {
        Self {
            api_url: args.api_url.clone(),
            kind: args.kind,
            concurrency: args.concurrency,
            max_retries: args.max_retries,
        }
    }
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Export the definitions of secrets to a CSV file
    Export {
        /// Organization with the secrets (default: owner of the current repository)
        #[arg(short = 's', long = "source-org", alias = "sourceOrg")]
        source_org: Option<String>,

        /// File to write
        #[arg(
            short = 'o',
            long = "output-file",
            alias = "outputFile",
            default_value = DEFAULT_EXPORT_FILE
        )]
        output_file: PathBuf,
    },

    /// Re-create secrets in another organization
    Migrate(MigrateArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments of `migrate`.
#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Organization with the secrets (default: owner of the current repository)
    #[arg(short = 's', long = "source-org", visible_alias = "src")]
    pub source_org: Option<String>,

    /// Organization the secrets are migrated to
    #[arg(short = 'd', long = "dest")]
    pub dest: String,

    /// dotenv-style file with the secret values (NAME=value)
    #[arg(long)]
    pub values: Option<PathBuf>,

    /// Resolve scopes and encrypt without writing to the destination
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// How a successful invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Clean,
    /// Finished, but at least one secret failed.
    Partial,
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<RunStatus> {
    let Cli {
        command, global, ..
    } = cli;

    match command {
        Command::Export {
            source_org,
            output_file,
        } => export::execute(&global, source_org, &output_file).map(|_| RunStatus::Clean),
        Command::Migrate(args) => migrate::execute(&global, args),
        Command::Completions { shell } => completions::execute(shell).map(|_| RunStatus::Clean),
    }
}

/// Runtime for one command.
fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
