use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod output;
mod parsing;
mod stitching;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("probstitch=debug,info")
    } else {
        EnvFilter::new("probstitch=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Stitch(args) => {
            cli::stitch::run(args, cli.format)?;
        }
        cli::Commands::Snps(args) => {
            cli::snps::run(args, cli.format)?;
        }
        cli::Commands::Summary(args) => {
            cli::summary::run(args, cli.format)?;
        }
    }

    Ok(())
}
