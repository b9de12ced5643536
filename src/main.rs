//! cfbf-sniff - Identify documents inside OLE2 compound files
//!
//! Thin command line wrapper over the library: sniff files or directory
//! trees and list the known CLSIDs.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cfbf_sniff::cli::{self, Cli, Commands};
use cfbf_sniff::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    // Initialize logging
    let level = if cli.verbose {
        "debug"
    } else {
        config.general.log_level.as_str()
    };
    tracing_subscriber::registry()
        .with(
            cli.log_json
                .then(|| fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json)
                .then(|| fmt::layer().with_target(false).compact().with_writer(std::io::stderr)),
        )
        .with(EnvFilter::from_default_env().add_directive(format!("cfbf_sniff={level}").parse()?))
        .init();

    match cli.command {
        Commands::Sniff(args) => {
            let all_read = cli::run_sniff(&args, &config).await?;
            if !all_read {
                std::process::exit(1);
            }
        }
        Commands::List(args) => {
            cli::run_list(&args)?;
        }
    }

    Ok(())
}
