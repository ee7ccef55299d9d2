mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{columns, compose, render};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "papermap=warn",
        1 => "papermap=info",
        _ => "papermap=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match &cli.command {
        Commands::Render(args) => render::run(&cli, args),
        Commands::Columns(args) => columns::run(&cli, args),
        Commands::Compose(args) => compose::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
