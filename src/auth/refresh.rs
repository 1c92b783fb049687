use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;
use uuid::Uuid;

use crate::db::models::RefreshToken;
use crate::db::repository::RefreshTokenRepository;
use crate::error::RefreshTokenError;

pub const REFRESH_TOKEN_BYTES: usize = 32;
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 60;

/// 32 bytes from the OS CSPRNG, hex-encoded.
pub fn generate() -> Result<String, RefreshTokenError> {
    let mut key = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut key)
        .map_err(|e| RefreshTokenError::EntropyUnavailable(e.to_string()))?;
    Ok(hex::encode(key))
}

/// Issues, resolves and revokes opaque refresh tokens on top of a repository.
#[derive(Clone)]
pub struct RefreshTokenStore {
    repo: Arc<dyn RefreshTokenRepository>,
    ttl: Duration,
}

impl RefreshTokenStore {
    pub fn new(repo: Arc<dyn RefreshTokenRepository>, ttl: Duration) -> Self {
        Self { repo, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create(&self, user_id: Uuid) -> Result<RefreshToken, RefreshTokenError> {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or(RefreshTokenError::ExpiryOutOfRange)?;
        let token = generate()?;
        let row = self.repo.insert_refresh_token(user_id, &token, expires_at).await?;
        debug!("Issued refresh token for user {} expiring at {}", user_id, row.expires_at);
        Ok(row)
    }

    pub async fn resolve(&self, token: &str) -> Result<RefreshToken, RefreshTokenError> {
        self.repo
            .find_refresh_token_by_value(token)
            .await?
            .ok_or(RefreshTokenError::NotFound)
    }

    /// Idempotent. Returns `true` if this call performed the revocation.
    pub async fn revoke(&self, token: &str) -> Result<bool, RefreshTokenError> {
        Ok(self.repo.mark_revoked(token, Utc::now()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::User;
    use crate::db::repository::{MockRefreshTokenRepository, UserRepository};
    use crate::db::MemoryStore;
    use crate::error::DatabaseError;

    async fn setup() -> (RefreshTokenStore, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .create_user(&User::new("a@example.com".into(), "hash".into()))
            .await
            .unwrap();
        (
            RefreshTokenStore::new(store, Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS)),
            user.id,
        )
    }

    #[test]
    fn test_generate_is_64_hex_chars() {
        let token = generate().unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(token, generate().unwrap());
    }

    #[tokio::test]
    async fn test_create_sets_sixty_day_horizon() {
        let (store, user_id) = setup().await;
        let before = Utc::now();
        let row = store.create(user_id).await.unwrap();

        assert_eq!(row.user_id, user_id);
        assert_eq!(row.token.len(), 64);
        assert!(row.revoked_at.is_none());
        assert!(row.expires_at >= before + Duration::days(60));
        assert!(row.expires_at <= Utc::now() + Duration::days(60));
    }

    #[tokio::test]
    async fn test_resolve() {
        let (store, user_id) = setup().await;
        let row = store.create(user_id).await.unwrap();

        let resolved = store.resolve(&row.token).await.unwrap();
        assert_eq!(resolved.user_id, user_id);

        assert!(matches!(store.resolve("missing").await, Err(RefreshTokenError::NotFound)));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (store, user_id) = setup().await;
        let row = store.create(user_id).await.unwrap();

        assert!(store.revoke(&row.token).await.unwrap());
        let revoked_at = store.resolve(&row.token).await.unwrap().revoked_at;
        assert!(revoked_at.is_some());

        assert!(!store.revoke(&row.token).await.unwrap());
        assert_eq!(store.resolve(&row.token).await.unwrap().revoked_at, revoked_at);

        assert!(!store.revoke("never-issued").await.unwrap());
    }

    #[tokio::test]
    async fn test_unrepresentable_expiry_is_an_error() {
        let (store, user_id) = setup().await;
        let store = RefreshTokenStore::new(store.repo.clone(), Duration::days(100_000_000));
        assert!(matches!(store.create(user_id).await, Err(RefreshTokenError::ExpiryOutOfRange)));
    }

    #[tokio::test]
    async fn test_persistence_failure_propagates() {
        let mut repo = MockRefreshTokenRepository::new();
        repo.expect_insert_refresh_token()
            .returning(|_, _, _| Err(DatabaseError::ConnectionError("connection refused".into())));
        let store = RefreshTokenStore::new(Arc::new(repo), Duration::days(60));

        let result = store.create(Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(RefreshTokenError::Database(DatabaseError::ConnectionError(_)))
        ));
    }
}
