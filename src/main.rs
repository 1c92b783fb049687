use actix_web::{web, App, HttpServer};
use anyhow::Context;
use chirpy_server::{configure_routes, AppState, MemoryStore, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new().context("failed to load configuration")?;
    info!("Configuration loaded successfully ({} environment)", config.environment);

    if config.auth.jwt_secret == "development_secret" {
        warn!("Using the default JWT secret; set APP_AUTH__JWT_SECRET outside development");
    }

    // Initialize application state
    let (state, db) = if config.database.in_memory {
        warn!("Using the in-memory store; records are lost on shutdown");
        (AppState::with_store(config.clone(), Arc::new(MemoryStore::new())), None)
    } else {
        let (state, db) = AppState::connect(config.clone())
            .await
            .context("failed to initialize the database")?;
        info!("Connected to database, migrations applied");
        (state, Some(db))
    };
    let state = web::Data::new(state);

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
        .with_context(|| format!("failed to bind {}:{}", config.server.host, config.server.port))?;
    info!("Starting server at http://{}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .context("server error")?;

    if let Some(db) = db {
        db.close().await;
    }
    info!("Server stopped");

    Ok(())
}
