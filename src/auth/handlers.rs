use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::bearer::header_values;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::ValidationError("email and password are required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
    pub refresh_token: String,
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;
    let session = state.sessions.login(&req.email, &req.password).await?;
    info!("Login successful for user {}", session.user.id);

    Ok(HttpResponse::Ok().json(LoginResponse {
        id: session.user.id,
        email: session.user.email,
        created_at: session.user.created_at,
        updated_at: session.user.updated_at,
        token: session.access_token.token,
        refresh_token: session.refresh_token.token,
    }))
}

/// Exchanges the refresh token in `Authorization: Bearer <token>`.
pub async fn refresh(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = state.sessions.extract_refresh_token(header_values(&req).as_slice())?;
    let refreshed = state.sessions.refresh(&token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        token: refreshed.access_token.token,
        refresh_token: refreshed.refresh_token.token,
    }))
}

pub async fn revoke(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = state.sessions.extract_refresh_token(header_values(&req).as_slice())?;
    state.sessions.revoke_session(&token).await?;

    Ok(HttpResponse::NoContent().finish())
}
