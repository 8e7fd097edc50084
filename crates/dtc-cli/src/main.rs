//! `dtc` binary entry point

use anyhow::{Context, Result};
use clap::ArgMatches;
use dtc_cli::commands::{self, Workspace};
use dtc_cli::{app, init_tracing, CliSettings};
use dtc_link::test_harness::SimulatedTarget;
use dtc_link::{CancelToken, Link};
use std::path::PathBuf;
use std::process::ExitCode;

fn workspace(args: &ArgMatches) -> Result<Workspace> {
    let file = args
        .get_one::<PathBuf>("file")
        .context("missing configuration file")?;
    let with: Vec<PathBuf> = args
        .get_many::<PathBuf>("with")
        .map(|paths| paths.cloned().collect())
        .unwrap_or_default();
    Workspace::load(file, &with)
}

fn settings(args: &ArgMatches) -> Result<CliSettings> {
    CliSettings::load(args.get_one::<PathBuf>("settings").map(PathBuf::as_path))
}

async fn upload(args: &ArgMatches) -> Result<ExitCode> {
    let workspace = workspace(args)?;
    let settings = settings(args)?;

    let cancel = CancelToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("cancellation requested");
                cancel.cancel();
            }
        })
    };

    let report = if args.get_flag("dry-run") {
        let target = SimulatedTarget::powered();
        let cache = target.cache();
        let link = Link::new(target, cache, settings.link.clone());
        commands::upload(&link, &workspace, &settings.upload, &cancel).await
    } else {
        let link = Link::connect(settings.link.clone())
            .await
            .context("operation failed: cockpit link unavailable")?;
        commands::upload(&link, &workspace, &settings.upload, &cancel).await
    };
    watcher.abort();

    let report = report?;
    print!("{}", commands::render_report(&report, args.get_flag("json"))?);
    Ok(if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run(matches: &ArgMatches) -> Result<ExitCode> {
    match matches.subcommand() {
        Some(("build", args)) => {
            let workspace = workspace(args)?;
            let settings = settings(args)?;
            let plan = commands::build(&workspace, &settings.upload)?;
            print!("{}", commands::render_plan(&plan, args.get_flag("json"))?);
            Ok(ExitCode::SUCCESS)
        }
        Some(("upload", args)) => upload(args).await,
        Some(("tables", args)) => {
            let target = args
                .get_one::<String>("target")
                .context("missing target")?;
            print!("{}", commands::tables(target)?);
            Ok(ExitCode::SUCCESS)
        }
        Some(("upgrade", args)) => {
            let file = args
                .get_one::<PathBuf>("file")
                .context("missing configuration file")?;
            let found = commands::upgrade(file)?;
            println!("{}: format version {found} -> {}", file.display(), dtc_config::file::FORMAT_VERSION);
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::FAILURE),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = app::command().get_matches();
    init_tracing(matches.get_flag("verbose"), matches.get_flag("log-json"));

    match run(&matches).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = ?err, "command failed");
            eprintln!("{}", commands::operator_message(&err));
            ExitCode::FAILURE
        }
    }
}
