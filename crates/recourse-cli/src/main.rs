mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::process;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Classify {
            file,
            context,
            locale,
            json,
        } => commands::classify(file, context, locale, json),
        Commands::Taxonomy { locale } => Ok(commands::taxonomy(locale)),
        Commands::CheckConfig { file } => commands::check_config(&file),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            process::exit(1);
        }
    }
}
