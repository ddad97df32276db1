use std::{process, sync::Arc};

use clap::Parser;
use log::{error, info, LevelFilter};

use pocketnotes::{App, Cli, Config, FileStore, NotesRepository, Result};

pub fn initialize_logger(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let store = FileStore::open(&config.data_dir)?;
    let mut repository = NotesRepository::new(Arc::new(store), &config);
    repository.load().await;

    let mut app = App::new(repository, cli.verbose);
    let outcome = app.run(cli.command);

    // Pending writes are flushed even when the command failed
    let shutdown = app.shutdown().await;
    finish(outcome, shutdown)
}

// The command's own error takes precedence over a shutdown failure
fn finish(outcome: Result<()>, shutdown: Result<()>) -> Result<()> {
    match (outcome, shutdown) {
        (Err(e), Err(shutdown_err)) => {
            error!("Failed to shut down cleanly: {}", shutdown_err);
            Err(e)
        }
        (outcome, shutdown) => outcome.and(shutdown),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    info!("Application starting up");

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    info!("Application shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketnotes::NotesError;

    fn failure(message: &str) -> Result<()> {
        Err(NotesError::ApplicationError {
            message: message.to_string(),
        })
    }

    #[test]
    fn test_finish_keeps_command_error_over_shutdown_error() {
        let err = finish(failure("command"), Err(NotesError::WriterStopped)).unwrap_err();
        assert_eq!(err.to_string(), "command");
    }

    #[test]
    fn test_finish_reports_shutdown_error_after_success() {
        let err = finish(Ok(()), Err(NotesError::WriterStopped)).unwrap_err();
        assert!(matches!(err, NotesError::WriterStopped));
        assert!(finish(Ok(()), Ok(())).is_ok());
        assert_eq!(finish(failure("command"), Ok(())).unwrap_err().to_string(), "command");
    }
}
