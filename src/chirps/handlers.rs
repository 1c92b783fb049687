use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::chirps::filter::{clean_body, validate_body};
use crate::db::Chirp;
use crate::error::{AppError, DatabaseError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

pub async fn create_chirp(
    caller: AuthenticatedUser,
    req: web::Json<CreateChirpRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    validate_body(&req.body)?;
    let chirp = Chirp::new(caller.0, clean_body(&req.body));
    let chirp = state.chirps.create_chirp(&chirp).await?;
    info!("User {} created chirp {}", caller.0, chirp.id);
    Ok(HttpResponse::Created().json(chirp))
}

pub async fn list_chirps(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let chirps = state.chirps.list_chirps().await?;
    Ok(HttpResponse::Ok().json(chirps))
}

pub async fn get_chirp(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let chirp = state
        .chirps
        .get_chirp(path.into_inner())
        .await?
        .ok_or(DatabaseError::NotFound)?;
    Ok(HttpResponse::Ok().json(chirp))
}

pub async fn delete_chirp(
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = path.into_inner();
    let chirp = state
        .chirps
        .get_chirp(chirp_id)
        .await?
        .ok_or(DatabaseError::NotFound)?;

    if chirp.user_id != caller.0 {
        warn!("User {} tried to delete chirp {} owned by {}", caller.0, chirp.id, chirp.user_id);
        return Err(AppError::Forbidden("chirp belongs to another user".into()));
    }

    state.chirps.delete_chirp(chirp_id).await?;
    info!("User {} deleted chirp {}", caller.0, chirp_id);
    Ok(HttpResponse::NoContent().finish())
}
