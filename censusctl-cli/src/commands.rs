//! Subcommand implementations for censusctl

use anyhow::{bail, Context, Result};
use censusctl_db::{current_timestamp, AppToTest, CensusDb, RunStatus};
use clap::Args;
use serde::Serialize;
use serde_json::json;

use crate::Commands;

#[derive(Args, Debug)]
pub struct SetStatusArgs {
    /// Package name, e.g. com.example.app
    pub package: String,

    /// New run status: name or numeric code
    #[arg(allow_negative_numbers = true)]
    pub status: RunStatus,
}

#[derive(Args, Debug)]
pub struct MarkTestedArgs {
    /// Release id to mark
    pub release_id: i64,

    /// Clear the tested flag instead of setting it
    #[arg(long)]
    pub untested: bool,
}

#[derive(Args, Debug)]
pub struct AppIdArgs {
    /// Package name to resolve
    pub package: String,
}

#[derive(Args, Debug)]
pub struct ReleaseIdArgs {
    /// Package name to resolve
    pub package: String,

    /// Numeric version code of the release
    pub version_code: i64,
}

#[derive(Args, Debug)]
pub struct ClearResultsArgs {
    /// Release whose results are deleted
    pub release_id: i64,

    /// Only delete permission results
    #[arg(long)]
    pub permissions: bool,

    /// Only delete transmission results
    #[arg(long)]
    pub transmissions: bool,
}

impl ClearResultsArgs {
    /// (permissions, transmissions). Neither flag means both.
    fn targets(&self) -> (bool, bool) {
        if !self.permissions && !self.transmissions {
            (true, true)
        } else {
            (self.permissions, self.transmissions)
        }
    }
}

#[derive(Args, Debug)]
pub struct CheckTimeArgs {
    /// Package name to update
    pub package: String,

    /// Epoch seconds to record (defaults to now)
    #[arg(long, value_name = "EPOCH")]
    pub at: Option<i64>,
}

/// Output mode selected by the global `--json` flag
pub struct Output {
    pub json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }

    fn candidate(&self, candidate: Option<&AppToTest>, empty: &str) -> Result<()> {
        self.emit(&candidate, || match candidate {
            Some(app) => format!(
                "{} {} (priority {}, {} installs)",
                app.package_name, app.version_code, app.priority, app.install_count
            ),
            None => empty.to_string(),
        })
    }
}

pub(crate) async fn run(db: &CensusDb, command: Commands, out: &Output) -> Result<()> {
    match command {
        Commands::Next => {
            let candidate = db.scheduler().get_app_to_test().await?;
            out.candidate(candidate.as_ref(), "No apps to test")
        }
        Commands::Claim => {
            let claimed = db.scheduler().claim_app_to_test().await?;
            out.candidate(claimed.as_ref(), "No apps to claim")
        }
        Commands::SetStatus(args) => run_set_status(db, args, out).await,
        Commands::MarkTested(args) => {
            let tested = !args.untested;
            db.releases()
                .update_release_tested(args.release_id, tested)
                .await
                .with_context(|| format!("Failed to update release {}", args.release_id))?;
            out.emit(
                &json!({ "release_id": args.release_id, "tested": tested }),
                || format!("Release {} tested = {}", args.release_id, tested),
            )
        }
        Commands::AppId(args) => {
            let id = db.apps().get_app_id(&args.package).await?;
            out.emit(&id, || lookup_text(id, &args.package))
        }
        Commands::ReleaseId(args) => {
            let id = db
                .releases()
                .get_release_id(&args.package, args.version_code)
                .await?;
            out.emit(&id, || {
                lookup_text(id, &format!("{} @ {}", args.package, args.version_code))
            })
        }
        Commands::ClearResults(args) => run_clear_results(db, args, out).await,
        Commands::CheckTime(args) => {
            let timestamp = args.at.unwrap_or_else(current_timestamp);
            let app_id = db
                .apps()
                .update_app_check_time(&args.package, Some(timestamp))
                .await?;
            out.emit(
                &json!({ "app_id": app_id, "timestamp": timestamp }),
                || format!("App {} ({}) checked at {}", app_id, args.package, timestamp),
            )
        }
    }
}

async fn run_set_status(db: &CensusDb, args: SetStatusArgs, out: &Output) -> Result<()> {
    if db.apps().get_app_id(&args.package).await?.is_none() {
        bail!("Package {} is not in the database", args.package);
    }

    db.apps().set_run_status(&args.package, args.status).await?;
    out.emit(
        &json!({ "package": args.package, "run_status": args.status }),
        || format!("{} -> {}", args.package, args.status),
    )
}

async fn run_clear_results(db: &CensusDb, args: ClearResultsArgs, out: &Output) -> Result<()> {
    let (permissions, transmissions) = args.targets();
    let results = db.results();

    let mut cleared_permissions = 0;
    if permissions {
        cleared_permissions = results.clear_permission_results(args.release_id).await?;
    }
    let mut cleared_transmissions = 0;
    if transmissions {
        cleared_transmissions = results.clear_transmission_results(args.release_id).await?;
    }

    out.emit(
        &json!({
            "release_id": args.release_id,
            "permissions": cleared_permissions,
            "transmissions": cleared_transmissions,
        }),
        || {
            format!(
                "Release {}: removed {} permission and {} transmission rows",
                args.release_id, cleared_permissions, cleared_transmissions
            )
        },
    )
}

fn lookup_text(id: Option<i64>, what: &str) -> String {
    match id {
        Some(id) => id.to_string(),
        None => format!("{} not found", what),
    }
}
