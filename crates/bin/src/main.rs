use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod output;
mod provider;
mod upload;

mod commands {
    pub mod check;
    pub mod check_file;
    pub mod serve;
}

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for results
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tokenscope=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Serve(args) => commands::serve::run(args, &cli.provider).await,
        Commands::Check(args) => commands::check::run(args, &cli.provider, cli.format).await,
        Commands::CheckFile(args) => {
            commands::check_file::run(args, &cli.provider, cli.format).await
        }
    }
}
