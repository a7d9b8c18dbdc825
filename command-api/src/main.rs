use std::path::PathBuf;

use clap::Parser;
use command_api::prelude::*;

#[derive(Parser)]
#[command(name = "command-api")]
#[command(version, about = "REST service for command-line how-to entries", long_about = None)]
struct Cli {
    /// Configuration file; skips the default search path
    #[arg(short, long, env = "COMMAND_API_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    init_tracing(&config)?;

    match config.database.clone() {
        #[cfg(feature = "database")]
        Some(database) => {
            tracing::info!(
                url = %command_api::database::sanitize_connection_url(&database.url),
                "Using PostgreSQL command store"
            );
            let repository = PgCommandRepository::connect(&database).await?;
            serve(config, repository).await
        }
        #[cfg(not(feature = "database"))]
        Some(_) => {
            tracing::warn!(
                "A database is configured but this build lacks the `database` feature; \
                 commands are kept in memory"
            );
            serve(config, InMemoryCommandRepository::new()).await
        }
        None => {
            tracing::warn!("No database configured; commands are kept in memory");
            serve(config, InMemoryCommandRepository::new()).await
        }
    }
}

async fn serve<R: CommandRepository>(config: Config, repository: R) -> Result<()> {
    let state = AppState::new(config.clone(), repository);
    Server::new(config).serve(build_router(state)).await
}
