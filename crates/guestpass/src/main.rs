mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command};
use crate::error::{CliError, exit_code};

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_code::USAGE
            } else {
                exit_code::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli
        .global
        .config
        .clone()
        .unwrap_or_else(guestpass_config::config_path);
    let config = guestpass_config::load_config(&config_path)
        .map_err(|e| CliError::config(&config_path, &e))?;

    let _guard = logging::init(&config.log_dir(), &config.log_level, cli.global.verbose)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        command = cli.command.name(),
        "guestpass starting"
    );

    match cli.command {
        Command::Rotate => commands::rotate(&config_path, &config).await,
        Command::Run => commands::run(&config_path, &config).await,
        Command::Check => commands::check(&config_path, &config),
        Command::SetKey(args) => commands::set_key(args, &config_path, &config),
    }
}
