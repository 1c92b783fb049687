pub mod admin;
pub mod auth;
pub mod chirps;
pub mod config;
pub mod db;
pub mod error;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::Service;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use admin::ApiMetrics;
pub use auth::{AuthenticatedUser, CredentialHasher, SessionConfig, SessionService};
pub use db::{ChirpRepository, DbOperations, MemoryStore, Store, UserRepository};

/// Readiness probe.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("OK")
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub sessions: Arc<SessionService>,
    pub users: Arc<dyn UserRepository>,
    pub chirps: Arc<dyn ChirpRepository>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    /// Wires every component to a single backing store.
    pub fn with_store<S: Store + 'static>(config: Settings, store: Arc<S>) -> Self {
        let sessions = SessionService::new(
            store.clone(),
            store.clone(),
            CredentialHasher::new(config.auth.bcrypt_cost),
            SessionConfig::from(&config.auth),
        );

        Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            users: store.clone(),
            chirps: store,
            metrics: Arc::new(ApiMetrics::new()),
        }
    }

    /// Connects to Postgres and applies pending migrations.
    pub async fn connect(config: Settings) -> Result<(Self, Arc<DbOperations>)> {
        let db = DbOperations::new_with_options(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(config.database.acquire_timeout_secs),
        )
        .await?;
        db.migrate().await?;

        let db = Arc::new(db);
        Ok((Self::with_store(config, db.clone()), db))
    }
}

/// Registers every route. Shared by the binary and the integration tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::ValidationError(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .route("/healthz", web::get().to(health_check))
            .route("/users", web::post().to(users::create_user))
            .route("/users", web::put().to(users::update_user))
            .route("/login", web::post().to(auth::handlers::login))
            .route("/refresh", web::post().to(auth::handlers::refresh))
            .route("/revoke", web::post().to(auth::handlers::revoke))
            .route("/chirps", web::post().to(chirps::create_chirp))
            .route("/chirps", web::get().to(chirps::list_chirps))
            .route("/chirps/{chirp_id}", web::get().to(chirps::get_chirp))
            .route("/chirps/{chirp_id}", web::delete().to(chirps::delete_chirp)),
    )
    .service(
        web::scope("/admin")
            .route("/metrics", web::get().to(admin::metrics))
            .route("/reset", web::post().to(admin::reset)),
    )
    .service(
        web::scope("/app")
            .wrap_fn(|req, srv| {
                if let Some(state) = req.app_data::<web::Data<AppState>>() {
                    state.metrics.record_hit();
                }
                srv.call(req)
            })
            .route("", web::get().to(admin::app_index))
            .route("/", web::get().to(admin::app_index)),
    );
}
