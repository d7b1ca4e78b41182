mod cli;
mod execute;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use crate::cli::CLI;

fn init_logging(verbose: bool) {
    let default = if verbose { "goenv=debug" } else { "goenv=warn" };
    let filter = EnvFilter::try_from_env("GOENV_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let cli = CLI::parse();
    init_logging(cli.verbose);
    if let Err(err) = execute::execute(cli) {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}
