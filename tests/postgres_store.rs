//! Runs against a live Postgres. Set `DATABASE_URL` and use `cargo test -- --ignored`.

use chirpy_server::{
    db::{Chirp, ChirpRepository, DbOperations, RefreshTokenRepository, User, UserRepository},
    error::DatabaseError,
};
use chrono::{Duration, Utc};
use std::time::Duration as StdDuration;
use uuid::Uuid;

async fn connect() -> DbOperations {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = DbOperations::new_with_options(&url, 5, StdDuration::from_secs(5))
        .await
        .expect("Failed to connect");
    db.migrate().await.expect("Failed to migrate");
    db
}

fn unique_email() -> String {
    format!("{}@example.com", Uuid::new_v4())
}

#[tokio::test]
#[ignore]
async fn test_user_roundtrip_and_duplicate_email() {
    let db = connect().await;
    let email = unique_email();
    let user = db.create_user(&User::new(email.clone(), "hash".into())).await.unwrap();

    let found = db.get_user_by_email(&email).await.unwrap().unwrap();
    assert_eq!(found.id, user.id);

    let dup = db.create_user(&User::new(email, "hash".into())).await;
    assert!(matches!(dup, Err(DatabaseError::Duplicate)));
}

#[tokio::test]
#[ignore]
async fn test_refresh_token_revoked_once() {
    let db = connect().await;
    let user = db.create_user(&User::new(unique_email(), "hash".into())).await.unwrap();
    let token = hex_token();

    let row = db
        .insert_refresh_token(user.id, &token, Utc::now() + Duration::days(60))
        .await
        .unwrap();
    assert!(row.revoked_at.is_none());

    assert!(db.mark_revoked(&token, Utc::now()).await.unwrap());
    assert!(!db.mark_revoked(&token, Utc::now()).await.unwrap());

    let row = db.find_refresh_token_by_value(&token).await.unwrap().unwrap();
    assert!(row.revoked_at.is_some());
}

#[tokio::test]
#[ignore]
async fn test_chirps_follow_their_owner() {
    let db = connect().await;
    let user = db.create_user(&User::new(unique_email(), "hash".into())).await.unwrap();
    let chirp = db.create_chirp(&Chirp::new(user.id, "hello".into())).await.unwrap();

    let found = db.get_chirp(chirp.id).await.unwrap().unwrap();
    assert_eq!(found.user_id, user.id);

    db.delete_chirp(chirp.id).await.unwrap();
    assert!(db.get_chirp(chirp.id).await.unwrap().is_none());
    assert!(matches!(db.delete_chirp(chirp.id).await, Err(DatabaseError::NotFound)));
}

fn hex_token() -> String {
    Uuid::new_v4().simple().to_string().repeat(2)
}
