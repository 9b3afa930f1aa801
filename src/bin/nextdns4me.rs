mod cli;

use std::process::ExitCode;

use clap::{error::ErrorKind, Parser};
use env_logger::Builder;
use log::{error, info, trace};
use tokio::task;

use nextdns4me::job;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // Missing or invalid settings: nothing has been contacted yet, not even the notifier
            e.print().ok();
            return ExitCode::FAILURE;
        }
    };

    Builder::new().filter_level(cli.loglevel.into()).init();
    trace!("Parsed configuration: {:?}", cli);

    if cli.dry_run {
        info!("Running in dry-run mode, no changes to the rewrites will be made");
    }

    // The blocking HTTP clients must live outside of the async runtime
    trace!("Starting worker thread");
    match task::spawn_blocking(move || job::run_job(&cli.job_config())).await {
        Ok(Ok(_)) => ExitCode::SUCCESS,
        Ok(Err(_)) => {
            error!("Run completed with errors");
            ExitCode::FAILURE
        }
        Err(_) => {
            error!("Task panicked, aborting...");
            ExitCode::FAILURE
        }
    }
}
