use clap::Parser;
use kube_score::{cli::Cli, config};
use std::process;

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run() -> kube_score::Result<i32> {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    // Load configuration
    let file_config = config::load_config(cli.config.as_deref())?;

    kube_score::run_command(cli.command, file_config, cli.verbose)
}
