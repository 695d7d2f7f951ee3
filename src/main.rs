//! in-toto-sign CLI.

mod cli;

use clap::Parser;
use cli::Cli;
use in_toto_sign::workflow;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbose.
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let outcome = workflow::run(&cli.into_config());
    if outcome.is_success() {
        println!("{outcome}");
    } else {
        eprintln!("in-toto-sign: {outcome}");
    }
    std::process::exit(outcome.exit_code());
}
