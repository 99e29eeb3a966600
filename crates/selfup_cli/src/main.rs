mod cli;

use std::process::ExitCode;

use clap::Parser;
use eyre::Result;
use selfup_log::{
    LogArgs,
    initialize_logging,
};

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();

    let _log_guard = initialize_logging(LogArgs {
        log_level: cli.log_level(),
        log_to_stdout: true,
        log_file_path: cli.log_file.clone(),
        delete_old_log_file: false,
    })?;

    // Returning instead of exiting lets the log guard flush before the process ends.
    Ok(cli.execute())
}
