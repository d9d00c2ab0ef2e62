mod api;
mod cli;
mod commands;
mod config;
mod document;
mod error;
mod error_ext;
mod input;
mod job;
mod providers;
mod request_builder;
mod response_handler;
mod settings;
mod ui;

use clap::Parser;
use cli::Cli;
use config::ConfigStore;
use error::Result;
use ui::UI;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    // stdout is reserved for document text
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        UI::print_error_with_hint(&e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let path = match cli.config {
        Some(path) => path,
        None => ConfigStore::default_path()?,
    };
    tracing::debug!(path = %path.display(), "Using settings file");

    let store = ConfigStore::new(path);
    cli.command.execute(&store)
}
