use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::models::{Chirp, RefreshToken, User};
use crate::error::DatabaseError;

/// Persistence boundary for refresh tokens. Each call is atomic and strongly consistent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Fails with `DatabaseError::Duplicate` instead of overwriting an existing token.
    async fn insert_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken, DatabaseError>;

    async fn find_refresh_token_by_value(&self, token: &str) -> Result<Option<RefreshToken>, DatabaseError>;

    /// Returns `true` only if this call moved the token from unrevoked to revoked.
    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &User) -> Result<User, DatabaseError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn update_user(&self, id: Uuid, email: &str, hashed_password: &str) -> Result<User, DatabaseError>;

    /// Removes every user together with their chirps and refresh tokens.
    async fn delete_all_users(&self) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait ChirpRepository: Send + Sync {
    async fn create_chirp(&self, chirp: &Chirp) -> Result<Chirp, DatabaseError>;

    /// Oldest first.
    async fn list_chirps(&self) -> Result<Vec<Chirp>, DatabaseError>;

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, DatabaseError>;

    async fn delete_chirp(&self, id: Uuid) -> Result<(), DatabaseError>;
}

/// A backend that can hold every record the server needs.
pub trait Store: UserRepository + ChirpRepository + RefreshTokenRepository {}

impl<T> Store for T where T: UserRepository + ChirpRepository + RefreshTokenRepository {}
