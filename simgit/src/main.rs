use anyhow::Result;
use clap::Parser;
use simgit_core::AppConfig;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Parse CLI arguments first to get verbosity level
    let cli = Cli::parse();

    // Initialize tracing with appropriate verbosity
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(settings) = cli.settings {
        config.settings_path = Some(settings);
    }
    debug!("Configuration: {:?}", config);

    // Process commands
    match cli.command {
        Commands::List => cli::commands::repo::list(&config)?,
        Commands::Add(args) => cli::commands::repo::add(args, &config)?,
        Commands::Remove(args) => cli::commands::repo::remove(args, &config)?,
        Commands::Status(args) => cli::commands::status::execute(args, &config)?,
        Commands::Watch(args) => {
            // Create async runtime for the command
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::watch::execute(args, config))?;
        }
    }

    Ok(())
}
