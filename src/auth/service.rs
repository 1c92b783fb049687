use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::bearer::{self, Scheme};
use crate::auth::jwt::{self, AccessToken};
use crate::auth::password::CredentialHasher;
use crate::auth::refresh::RefreshTokenStore;
use crate::config::{AuthConfig, RotationPolicy};
use crate::db::models::{RefreshToken, SessionState, User};
use crate::db::repository::{RefreshTokenRepository, UserRepository};
use crate::error::{AppError, AuthError, CredentialError};
use crate::Result;

/// Tunables of the session lifecycle.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: Vec<u8>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub rotation: RotationPolicy,
}

impl From<&AuthConfig> for SessionConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.as_bytes().to_vec(),
            access_token_ttl: Duration::seconds(config.access_token_ttl_secs),
            refresh_token_ttl: Duration::days(config.refresh_token_ttl_days),
            rotation: config.rotation,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

/// Result of exchanging a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshedSession {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

/// The only component that creates, validates or revokes refresh tokens.
pub struct SessionService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: RefreshTokenStore,
    hasher: CredentialHasher,
    config: SessionConfig,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        hasher: CredentialHasher,
        config: SessionConfig,
    ) -> Self {
        Self {
            users,
            refresh_tokens: RefreshTokenStore::new(refresh_tokens, config.refresh_token_ttl),
            hasher,
            config,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<User> {
        let hashed_password = self.hash_password(password).await?;
        let user = self
            .users
            .create_user(&User::new(normalize_email(email).to_string(), hashed_password))
            .await?;
        info!("Created user {}", user.id);
        Ok(user)
    }

    pub async fn update_credentials(&self, user_id: Uuid, email: &str, password: &str) -> Result<User> {
        let hashed_password = self.hash_password(password).await?;
        let user = self
            .users
            .update_user(user_id, normalize_email(email), &hashed_password)
            .await?;
        info!("Updated credentials for user {}", user.id);
        Ok(user)
    }

    /// Unknown email, wrong password and an unusable stored hash all fail the same way.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let user = match self.users.get_user_by_email(normalize_email(email)).await? {
            Some(user) => user,
            None => {
                let hasher = self.hasher.clone();
                let password = password.to_string();
                run_blocking(move || hasher.verify_dummy(&password)).await?;
                warn!("Login rejected: no account for the given email");
                return Err(AuthError::AuthenticationFailed.into());
            }
        };

        let hasher = self.hasher.clone();
        let hash = user.hashed_password.clone();
        let candidate = password.to_string();
        match run_blocking(move || hasher.verify(&hash, &candidate)).await? {
            Ok(true) => {}
            Ok(false) => {
                warn!("Login rejected for user {}: password mismatch", user.id);
                return Err(AuthError::AuthenticationFailed.into());
            }
            Err(e) => {
                error!("Login rejected for user {}: {}", user.id, e);
                return Err(AuthError::AuthenticationFailed.into());
            }
        }

        let access_token = self.issue_access_token(user.id)?;
        let refresh_token = self.refresh_tokens.create(user.id).await.map_err(|e| {
            error!("Failed to create refresh token for user {}: {}", user.id, e);
            AppError::from(e)
        })?;

        info!("User {} logged in", user.id);
        Ok(Session {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchanges a refresh token for a new access token and a new refresh token.
    pub async fn refresh(&self, token: &str) -> Result<RefreshedSession> {
        let row = self.resolve_active(token).await?;

        if self.config.rotation == RotationPolicy::Replace {
            // Only one concurrent exchange of the same token can win this revoke.
            if !self.refresh_tokens.revoke(&row.token).await? {
                warn!("Refresh rejected for user {}: token revoked concurrently", row.user_id);
                return Err(AuthError::TokenRevoked.into());
            }
        }

        let access_token = self.issue_access_token(row.user_id)?;
        let refresh_token = self.refresh_tokens.create(row.user_id).await.map_err(|e| {
            error!("Failed to rotate refresh token for user {}: {}", row.user_id, e);
            AppError::from(e)
        })?;

        info!("Refreshed session for user {}", row.user_id);
        Ok(RefreshedSession {
            access_token,
            refresh_token,
        })
    }

    /// Idempotent; revoking an unknown or already revoked token is not an error.
    pub async fn revoke_session(&self, token: &str) -> Result<()> {
        if self.refresh_tokens.revoke(token).await? {
            info!("Revoked refresh token");
        }
        Ok(())
    }

    /// Resolves the caller of a protected request. Every failure is `Unauthorized`.
    pub fn authorize<S: AsRef<str>>(&self, header_values: &[S]) -> Result<Uuid> {
        let token = bearer::extract(header_values, Scheme::Bearer).map_err(|e| {
            warn!("Authorization rejected: {}", e);
            AuthError::Unauthorized
        })?;

        jwt::verify(&token, &self.config.secret).map_err(|e| {
            warn!("Authorization rejected: {}", e);
            AppError::from(AuthError::Unauthorized)
        })
    }

    /// Pulls a refresh token out of the `Authorization` header values.
    pub fn extract_refresh_token<S: AsRef<str>>(&self, header_values: &[S]) -> Result<String> {
        bearer::extract(header_values, Scheme::Bearer).map_err(|e| {
            warn!("Refresh token rejected: {}", e);
            AppError::from(AuthError::InvalidToken)
        })
    }

    async fn resolve_active(&self, token: &str) -> Result<RefreshToken> {
        let row = self.refresh_tokens.resolve(token).await.map_err(|e| {
            warn!("Refresh rejected: {}", e);
            AppError::from(e)
        })?;

        match row.state() {
            SessionState::Active => Ok(row),
            SessionState::Expired => {
                warn!("Refresh rejected for user {}: token expired", row.user_id);
                Err(AuthError::TokenExpired.into())
            }
            SessionState::Revoked => {
                warn!("Refresh rejected for user {}: token revoked", row.user_id);
                Err(AuthError::TokenRevoked.into())
            }
        }
    }

    fn issue_access_token(&self, user_id: Uuid) -> Result<AccessToken> {
        jwt::issue(user_id, &self.config.secret, self.config.access_token_ttl).map_err(|e| {
            error!("Failed to issue access token for user {}: {}", user_id, e);
            AppError::InternalError(e.to_string())
        })
    }

    async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        run_blocking(move || hasher.hash(&password)).await?.map_err(|e: CredentialError| {
            warn!("Password hashing failed: {}", e);
            AppError::from(e)
        })
    }
}

/// Emails are stored and looked up without surrounding whitespace.
fn normalize_email(email: &str) -> &str {
    email.trim()
}

/// bcrypt is CPU bound; keep it off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
}
