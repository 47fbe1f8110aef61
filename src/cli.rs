use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::{self, AppConfig, StoreBackend};
use crate::database::{self, DatabaseManager};
use crate::routes;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "healthtrack-api")]
#[command(about = "HealthTrack API - student vitals and class analytics server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overriding PORT")]
        port: Option<u16>,

        #[arg(long, help = "Use the in-memory store instead of PostgreSQL")]
        memory: bool,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None, memory: false }) {
        Commands::Serve { port, memory } => serve(port, memory).await,
        Commands::Migrate => migrate().await,
    }
}

async fn serve(port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    let mut settings: AppConfig = config::config().clone();
    if let Some(port) = port {
        settings.server.port = port;
    }
    if memory {
        settings.store = StoreBackend::Memory;
    }

    info!("Starting HealthTrack API in {:?} mode", settings.environment);

    if settings.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }
    if crate::is_production!() && settings.store == StoreBackend::Memory {
        warn!("Production is running on the in-memory store");
    }

    let store = database::open_store(&settings)
        .await
        .context("failed to open store")?;
    let app = routes::app(AppState::new(store));

    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("HealthTrack API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    let settings = config::config();
    let pool = DatabaseManager::connect(&settings.database)
        .await
        .context("failed to connect to database")?;
    DatabaseManager::migrate(&pool).await?;
    info!("Migrations complete");
    Ok(())
}
