//! Hit counter for the `/app` pages and the dev-only reset endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use actix_web::{web, HttpResponse};
use tracing::{info, warn};

use crate::error::AppError;
use crate::AppState;

/// Request counters owned by `AppState`, so each app (and each test) gets its own.
#[derive(Debug, Default)]
pub struct ApiMetrics {
    fileserver_hits: AtomicU64,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.fileserver_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.fileserver_hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.fileserver_hits.store(0, Ordering::Relaxed);
    }
}

const APP_INDEX: &str = "<html>
  <body>
    <h1>Welcome to Chirpy</h1>
  </body>
</html>
";

pub async fn app_index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(APP_INDEX)
}

pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    let page = format!(
        "<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>
",
        state.metrics.hits()
    );
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page)
}

/// Zeroes the hit counter and deletes every user. Only allowed in development.
pub async fn reset(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    if !state.config.is_dev() {
        warn!("Reset refused in {} environment", state.config.environment);
        return Err(AppError::Forbidden("reset is only available in development".into()));
    }

    let removed = state.users.delete_all_users().await?;
    state.metrics.reset();
    info!("Reset hit counter and removed {} users", removed);

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Hits reset to 0 and database reset to initial state."))
}
