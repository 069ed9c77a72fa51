mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use convertbox::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    convertbox::observability::init_tracing("info");

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => {
            // `Config::load` reads .env itself; an explicit path skips that step
            let _ = dotenvy::dotenv();
            Config::load_from_path(path)?
        }
        None => Config::load()?,
    };

    match cli.command {
        Commands::Server(args) => convertbox::api::run(config, args.address).await?,
        Commands::Convert(args) => commands::convert(config, args).await?,
        Commands::Config => commands::print_config(&config)?,
    }

    Ok(())
}
