mod candidates;
mod cli;
mod commands;
mod context;
mod git_identity;
mod output;

use clap::Parser;
use cli::{Cli, Command};
use libbeacon_core::BeaconError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout carries the document; logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = run_command(&cli).await;

    if let Err(e) = result {
        output::output_error(&cli, &e);
        std::process::exit(e.exit_code());
    }
}

async fn run_command(cli: &Cli) -> Result<(), BeaconError> {
    match &cli.command {
        Command::Compose(args) => commands::compose::run(cli, args).await,
        Command::Validate { path } => commands::validate::run(cli, path.as_deref()),
        Command::Projects { cmd } => commands::projects::run(cli, cmd.clone()).await,
        Command::Ingest(args) => commands::ingest::run(cli, args).await,
    }
}
