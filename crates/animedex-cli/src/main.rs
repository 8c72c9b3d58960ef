mod app;
mod browse;
mod cli;
mod error;
mod render;
#[cfg(test)]
mod test_support;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tokio::io::BufReader;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use animedex_core::config::AppConfig;

use crate::app::App;
use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = init_logging(&config.logging.filter, cli.verbose);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &AppConfig) -> Result<(), CliError> {
    let app = App::open(config)?;
    match command {
        Command::Browse => {
            let stdin = BufReader::new(tokio::io::stdin());
            browse::run(&app, stdin, &mut std::io::stdout()).await
        }
        command => {
            let output = app.run(command).await?;
            println!("{output}");
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, CliError> {
    let config = match path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    Ok(config)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
///
/// Logs go to a daily rolling file unless `verbose` asks for stderr. The
/// returned guard flushes the file writer on drop.
fn init_logging(filter: &str, verbose: bool) -> Option<WorkerGuard> {
    let env_filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if !verbose {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("animedex")
            .filename_suffix("log")
            .build(AppConfig::log_dir());
        match appender {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter())
                    .with_ansi(false)
                    .with_writer(writer)
                    .init();
                return Some(guard);
            }
            Err(e) => eprintln!("warning: file logging disabled: {e}"),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
    None
}
