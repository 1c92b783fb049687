//! Short-lived HS256 access tokens.
//!
//! Tokens are stateless: validity is decided by the signature and the `exp`
//! claim at verification time. Rotating the signing secret invalidates every
//! outstanding token.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AccessTokenError;

pub const ISSUER: &str = "chirpy";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String, // User ID
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration time
    pub jti: String, // Unique per token
}

/// An encoded access token together with the claims it was minted with.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub subject: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Mints a token for `subject`. A zero or negative `ttl` yields a token that is already expired.
pub fn issue(subject: Uuid, secret: &[u8], ttl: Duration) -> Result<AccessToken, AccessTokenError> {
    let now = Utc::now();
    let iat = now.timestamp();
    let exp = iat + ttl.num_seconds();
    let claims = Claims {
        iss: ISSUER.to_string(),
        sub: subject.to_string(),
        iat,
        exp,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AccessTokenError::Encoding(e.to_string()))?;

    Ok(AccessToken {
        token,
        subject,
        issued_at: timestamp(iat),
        expires_at: timestamp(exp),
    })
}

/// Checks the signature, issuer and expiry of `token` and returns its subject.
pub fn verify(token: &str, secret: &[u8]) -> Result<Uuid, AccessTokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    // exp is compared below with `now >= exp` and no leeway
    validation.validate_exp = false;
    validation.leeway = 0;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::InvalidSignature => AccessTokenError::InvalidSignature,
            ErrorKind::InvalidIssuer => AccessTokenError::InvalidIssuer,
            ErrorKind::ExpiredSignature => AccessTokenError::Expired,
            _ => AccessTokenError::Malformed(e.to_string()),
        }
    })?;

    if Utc::now().timestamp() >= data.claims.exp {
        return Err(AccessTokenError::Expired);
    }

    Uuid::parse_str(&data.claims.sub).map_err(|_| AccessTokenError::MalformedSubject)
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}
