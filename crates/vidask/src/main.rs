//! vidask - ask questions about the YouTube video you are watching
//!
//! Talks to a running `vidask-daemon` over HTTP.

mod cli;
mod commands;
mod output;

use clap::Parser;
use libvidask_api::ApiClient;
use libvidask_core::VidaskError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&cli).await {
        output::output_error(&cli, &e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: &Cli) -> Result<(), VidaskError> {
    let client = ApiClient::new(&cli.server)?;

    match &cli.command {
        Command::Ask { query, video, title } => {
            commands::ask::run(cli, &client, query, video, title.clone()).await
        }
        Command::Clear { video, all, strict } => {
            commands::clear::run(cli, &client, video.as_deref(), *all, *strict).await
        }
        Command::Event { cmd } => commands::event::run(cli, &client, cmd.clone()).await,
        Command::Session => commands::session::run(cli, &client).await,
    }
}
