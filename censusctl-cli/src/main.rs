//! censusctl - operator CLI for the app census testing database
//!
//! Wraps the censusctl-db data-access layer for the tasks people run by hand:
//! - Ask the scheduler which app/version to test next (`next`, `claim`)
//! - Move apps through the run status cycle (`set-status`, `mark-tested`)
//! - Look up ids (`app-id`, `release-id`)
//! - Reset results before a re-test (`clear-results`)

use anyhow::{Context, Result};
use censusctl_db::{CensusConfig, CensusDb, ValueLogging};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

mod commands;
mod tracing_setup;

use commands::Output;

#[derive(Parser, Debug)]
#[command(
    name = "censusctl",
    author,
    version,
    about = "Inspect and drive the app census testing database",
    long_about = "Connection settings come from ~/.censusctl/config.toml, ./censusctl.toml and \
                  CENSUSCTL_* environment variables (including .env files); the flags below \
                  override all of them."
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct ConnectionArgs {
    /// Database server host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Database server port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Database (schema) name
    #[arg(long, global = true)]
    database: Option<String>,

    /// Database user
    #[arg(long, global = true)]
    user: Option<String>,

    /// Database password
    #[arg(long, global = true)]
    password: Option<String>,

    /// How statement values are logged (full, redacted, off)
    #[arg(long, global = true, value_name = "POLICY")]
    log_values: Option<ValueLogging>,
}

impl ConnectionArgs {
    fn apply(self, config: &mut CensusConfig) {
        let db = &mut config.database;
        if let Some(host) = self.host {
            db.host = host;
        }
        if let Some(port) = self.port {
            db.port = port;
        }
        if let Some(database) = self.database {
            db.database = database;
        }
        if let Some(user) = self.user {
            db.user = user;
        }
        if let Some(password) = self.password {
            db.password = password;
        }
        if let Some(policy) = self.log_values {
            config.logging.values = policy;
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the next app/version the scheduler would hand out (no reservation)
    Next,
    /// Pick the next app and mark it as testing in one transaction
    Claim,
    /// Set an app's run status (error, available, testing, logs-to-process or -1..2)
    SetStatus(commands::SetStatusArgs),
    /// Mark a release as tested (puts its app back to available)
    MarkTested(commands::MarkTestedArgs),
    /// Resolve a package name to its app id
    AppId(commands::AppIdArgs),
    /// Resolve a package name and version code to a release id
    ReleaseId(commands::ReleaseIdArgs),
    /// Delete permission and/or transmission results of a release
    ClearResults(commands::ClearResultsArgs),
    /// Update an app's last-checked timestamp
    CheckTime(commands::CheckTimeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    let mut config = CensusConfig::load();
    cli.connection.apply(&mut config);
    debug!(?config, "Resolved configuration");

    let db = CensusDb::connect(&config.database)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to {}:{}/{}",
                config.database.host, config.database.port, config.database.database
            )
        })?
        .with_value_logging(config.logging.values);

    let out = Output { json: cli.json };
    let result = commands::run(&db, cli.command, &out).await;

    db.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let mut config = CensusConfig::default();
        ConnectionArgs {
            host: Some("db.internal".into()),
            port: Some(3307),
            log_values: Some(ValueLogging::Full),
            ..ConnectionArgs::default()
        }
        .apply(&mut config);

        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3307);
        assert_eq!(config.database.user, "appcensus");
        assert_eq!(config.logging.values, ValueLogging::Full);
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "censusctl",
            "set-status",
            "com.example.app",
            "testing",
            "--json",
            "--host",
            "10.0.0.5",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.connection.host.as_deref(), Some("10.0.0.5"));
        assert!(matches!(cli.command, Commands::SetStatus(_)));
    }

    #[test]
    fn rejects_unknown_run_status() {
        let err = Cli::try_parse_from(["censusctl", "set-status", "com.example.app", "5"]);
        assert!(err.is_err());
    }
}
