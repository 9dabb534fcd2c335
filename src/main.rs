use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use log::{error, info};
use tokio::sync::Mutex;

use splitledger::{commands::execute, config::Cli, database::sqlite::SqliteDatabase};

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::init();

    let cli = Cli::parse();

    info!("Opening database {}...", cli.database.display());
    let database = match SqliteDatabase::open(&cli.database) {
        Ok(database) => Arc::new(Mutex::new(database)),
        Err(e) => {
            error!("Cannot initialize database: {e}");
            eprintln!("Cannot open {}: {e}", cli.database.display());
            return ExitCode::FAILURE;
        }
    };

    let result = execute(cli.command, cli.json, &database).await;

    // Nobody else holds the handle once the command is done.
    if let Ok(database) = Arc::try_unwrap(database) {
        if let Err(e) = database.into_inner().close() {
            error!("Cannot close database: {e}");
        }
    }

    match result {
        Ok(output) => {
            println!("{}", output.trim_end());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Command failed: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
