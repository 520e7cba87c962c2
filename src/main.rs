use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use cal_overlap::storage::{Config, config::app_dir};

mod authentication;
mod cli;
use cli::{CliMode, USAGE, parse_cli_mode, run_forget, run_search, run_suggest};
mod presentation;
mod sample;

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let cli_mode = match parse_cli_mode(std::env::args().skip(1)) {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    if cli_mode == CliMode::Help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let result = match Config::load_or_create() {
        Ok(config) => match cli_mode {
            CliMode::Search(args) => run_search(args, &config).await,
            CliMode::Suggest(fragment) => run_suggest(&fragment, &config),
            CliMode::Forget(identifier) => run_forget(&identifier, &config),
            CliMode::Help => Ok(()),
        },
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging() {
    let log_dir = app_dir();

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "cal-overlap.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    std::mem::forget(guard);

    tracing::info!("cal-overlap started");
}
