use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::{Chirp, RefreshToken, User};
use crate::db::repository::{ChirpRepository, RefreshTokenRepository, UserRepository};
use crate::error::DatabaseError;

/// In-process store enforcing the same constraints as the Postgres schema:
/// unique emails, unique refresh tokens, owners must exist, and deleting a
/// user removes what it owns.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    chirps: RwLock<Vec<Chirp>>,
    refresh_tokens: RwLock<HashMap<String, RefreshToken>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) || users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Duplicate);
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update_user(&self, id: Uuid, email: &str, hashed_password: &str) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.id != id && u.email == email) {
            return Err(DatabaseError::Duplicate);
        }
        let user = users.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_all_users(&self) -> Result<u64, DatabaseError> {
        // Same lock order as every other multi-map operation: users, chirps, tokens.
        let mut users = self.users.write().await;
        let mut chirps = self.chirps.write().await;
        let mut tokens = self.refresh_tokens.write().await;

        let removed = users.len() as u64;
        users.clear();
        chirps.clear();
        tokens.clear();
        Ok(removed)
    }
}

#[async_trait]
impl ChirpRepository for MemoryStore {
    async fn create_chirp(&self, chirp: &Chirp) -> Result<Chirp, DatabaseError> {
        let users = self.users.read().await;
        if !users.contains_key(&chirp.user_id) {
            return Err(DatabaseError::QueryError(format!("user {} does not exist", chirp.user_id)));
        }
        let mut chirps = self.chirps.write().await;
        if chirps.iter().any(|c| c.id == chirp.id) {
            return Err(DatabaseError::Duplicate);
        }
        chirps.push(chirp.clone());
        Ok(chirp.clone())
    }

    async fn list_chirps(&self) -> Result<Vec<Chirp>, DatabaseError> {
        let mut chirps = self.chirps.read().await.clone();
        chirps.sort_by_key(|c| c.created_at);
        Ok(chirps)
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, DatabaseError> {
        Ok(self.chirps.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut chirps = self.chirps.write().await;
        let before = chirps.len();
        chirps.retain(|c| c.id != id);
        if chirps.len() == before {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn insert_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshToken, DatabaseError> {
        let users = self.users.read().await;
        if !users.contains_key(&user_id) {
            return Err(DatabaseError::QueryError(format!("user {} does not exist", user_id)));
        }
        let mut tokens = self.refresh_tokens.write().await;
        if tokens.contains_key(token) {
            return Err(DatabaseError::Duplicate);
        }
        let row = RefreshToken::new(user_id, token.to_string(), expires_at);
        tokens.insert(row.token.clone(), row.clone());
        Ok(row)
    }

    async fn find_refresh_token_by_value(&self, token: &str) -> Result<Option<RefreshToken>, DatabaseError> {
        Ok(self.refresh_tokens.read().await.get(token).cloned())
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let mut tokens = self.refresh_tokens.write().await;
        match tokens.get_mut(token) {
            Some(row) if row.revoked_at.is_none() => {
                row.revoked_at = Some(at);
                row.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn store_with_user() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let user = store
            .create_user(&User::new("owner@example.com".into(), "hash".into()))
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (store, _) = store_with_user().await;
        let result = store
            .create_user(&User::new("owner@example.com".into(), "other".into()))
            .await;
        assert!(matches!(result, Err(DatabaseError::Duplicate)));
    }

    #[tokio::test]
    async fn test_refresh_token_insert_never_overwrites() {
        let (store, user) = store_with_user().await;
        let expires = Utc::now() + Duration::days(60);
        store.insert_refresh_token(user.id, "tok", expires).await.unwrap();
        store.mark_revoked("tok", Utc::now()).await.unwrap();

        let again = store.insert_refresh_token(user.id, "tok", expires).await;
        assert!(matches!(again, Err(DatabaseError::Duplicate)));

        let row = store.find_refresh_token_by_value("tok").await.unwrap().unwrap();
        assert!(row.is_revoked());
    }

    #[tokio::test]
    async fn test_refresh_token_requires_owner() {
        let store = MemoryStore::new();
        let result = store
            .insert_refresh_token(Uuid::new_v4(), "tok", Utc::now() + Duration::days(1))
            .await;
        assert!(matches!(result, Err(DatabaseError::QueryError(_))));
    }

    #[tokio::test]
    async fn test_mark_revoked_only_once() {
        let (store, user) = store_with_user().await;
        store
            .insert_refresh_token(user.id, "tok", Utc::now() + Duration::days(60))
            .await
            .unwrap();

        let first = Utc::now();
        assert!(store.mark_revoked("tok", first).await.unwrap());
        assert!(!store.mark_revoked("tok", first + Duration::seconds(5)).await.unwrap());
        assert!(!store.mark_revoked("missing", first).await.unwrap());

        let row = store.find_refresh_token_by_value("tok").await.unwrap().unwrap();
        assert_eq!(row.revoked_at, Some(first));
    }

    #[tokio::test]
    async fn test_delete_all_users_cascades() {
        let (store, user) = store_with_user().await;
        store.create_chirp(&Chirp::new(user.id, "hello".into())).await.unwrap();
        store
            .insert_refresh_token(user.id, "tok", Utc::now() + Duration::days(60))
            .await
            .unwrap();

        assert_eq!(store.delete_all_users().await.unwrap(), 1);
        assert!(store.list_chirps().await.unwrap().is_empty());
        assert!(store.find_refresh_token_by_value("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_user_email_conflict() {
        let (store, user) = store_with_user().await;
        store
            .create_user(&User::new("taken@example.com".into(), "hash".into()))
            .await
            .unwrap();

        let result = store.update_user(user.id, "taken@example.com", "new").await;
        assert!(matches!(result, Err(DatabaseError::Duplicate)));

        let updated = store.update_user(user.id, "fresh@example.com", "new").await.unwrap();
        assert_eq!(updated.email, "fresh@example.com");
        assert_eq!(updated.hashed_password, "new");
    }
}
