//! Authentication module for the Chirpy server
//!
//! Password hashing, access token minting and verification, refresh token
//! persistence with rotation and revocation, and the bearer contract every
//! protected endpoint goes through.

pub mod bearer;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod refresh;
mod service;

pub use bearer::{AuthenticatedUser, Scheme};
pub use jwt::{AccessToken, Claims};
pub use password::CredentialHasher;
pub use refresh::RefreshTokenStore;
pub use service::{RefreshedSession, Session, SessionConfig, SessionService};
